#![forbid(unsafe_code)]

//! Key-sequence resolution table.
//!
//! Raw CSI/SS3 sequences are matched here before the decoder falls back
//! to structural parsing. Entries come from two layers:
//!
//! 1. the terminal's own `key_*` capabilities from the loaded database,
//! 2. a hardcoded xterm-family table, because many terminals under-report
//!    their function-key capabilities.
//!
//! Database entries win on conflict; the fallback only fills gaps.

use weft_terminfo::{Database, StrCap};

use crate::event::KeyCode;

/// Sequences the xterm family emits, used when the database lacks an
/// entry. These are empirically common, not architecturally required;
/// replace the table wholesale via [`KeyTable::from_entries`] for exotic
/// terminal classes.
const FALLBACK_ENTRIES: &[(&[u8], KeyCode)] = &[
    (b"\x1b[A", KeyCode::Up),
    (b"\x1b[B", KeyCode::Down),
    (b"\x1b[C", KeyCode::Right),
    (b"\x1b[D", KeyCode::Left),
    (b"\x1bOA", KeyCode::Up),
    (b"\x1bOB", KeyCode::Down),
    (b"\x1bOC", KeyCode::Right),
    (b"\x1bOD", KeyCode::Left),
    (b"\x1b[H", KeyCode::Home),
    (b"\x1b[F", KeyCode::End),
    (b"\x1bOH", KeyCode::Home),
    (b"\x1bOF", KeyCode::End),
    (b"\x1b[1~", KeyCode::Home),
    (b"\x1b[2~", KeyCode::Insert),
    (b"\x1b[3~", KeyCode::Delete),
    (b"\x1b[4~", KeyCode::End),
    (b"\x1b[5~", KeyCode::PageUp),
    (b"\x1b[6~", KeyCode::PageDown),
    (b"\x1b[Z", KeyCode::BackTab),
    (b"\x1bOP", KeyCode::F(1)),
    (b"\x1bOQ", KeyCode::F(2)),
    (b"\x1bOR", KeyCode::F(3)),
    (b"\x1bOS", KeyCode::F(4)),
    (b"\x1b[15~", KeyCode::F(5)),
    (b"\x1b[17~", KeyCode::F(6)),
    (b"\x1b[18~", KeyCode::F(7)),
    (b"\x1b[19~", KeyCode::F(8)),
    (b"\x1b[20~", KeyCode::F(9)),
    (b"\x1b[21~", KeyCode::F(10)),
    (b"\x1b[23~", KeyCode::F(11)),
    (b"\x1b[24~", KeyCode::F(12)),
];

/// Function-key capabilities and the keys they name.
const DB_KEYS: &[(StrCap, KeyCode)] = &[
    (StrCap::KeyUp, KeyCode::Up),
    (StrCap::KeyDown, KeyCode::Down),
    (StrCap::KeyRight, KeyCode::Right),
    (StrCap::KeyLeft, KeyCode::Left),
    (StrCap::KeyHome, KeyCode::Home),
    (StrCap::KeyEnd, KeyCode::End),
    (StrCap::KeyNpage, KeyCode::PageDown),
    (StrCap::KeyPpage, KeyCode::PageUp),
    (StrCap::KeyIc, KeyCode::Insert),
    (StrCap::KeyDc, KeyCode::Delete),
    (StrCap::KeyBtab, KeyCode::BackTab),
    (StrCap::KeyEnter, KeyCode::Enter),
    (StrCap::KeyF1, KeyCode::F(1)),
    (StrCap::KeyF2, KeyCode::F(2)),
    (StrCap::KeyF3, KeyCode::F(3)),
    (StrCap::KeyF4, KeyCode::F(4)),
    (StrCap::KeyF5, KeyCode::F(5)),
    (StrCap::KeyF6, KeyCode::F(6)),
    (StrCap::KeyF7, KeyCode::F(7)),
    (StrCap::KeyF8, KeyCode::F(8)),
    (StrCap::KeyF9, KeyCode::F(9)),
    (StrCap::KeyF10, KeyCode::F(10)),
    (StrCap::KeyF11, KeyCode::F(11)),
    (StrCap::KeyF12, KeyCode::F(12)),
];

/// Exact-sequence to key lookup table.
#[derive(Debug, Clone)]
pub struct KeyTable {
    entries: Vec<(Vec<u8>, KeyCode)>,
}

impl KeyTable {
    /// The hardcoded xterm-family table.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            entries: FALLBACK_ENTRIES
                .iter()
                .map(|&(seq, code)| (seq.to_vec(), code))
                .collect(),
        }
    }

    /// Build from a capability database, backfilled with the hardcoded
    /// table for sequences the database does not report.
    #[must_use]
    pub fn from_database(db: &Database) -> Self {
        let mut table = Self {
            entries: Vec::with_capacity(FALLBACK_ENTRIES.len() + DB_KEYS.len()),
        };
        for &(cap, code) in DB_KEYS {
            if let Some(seq) = db.raw_str(cap)
                && !seq.is_empty()
            {
                table.entries.push((seq.to_vec(), code));
            }
        }
        for &(seq, code) in FALLBACK_ENTRIES {
            if !table.contains(seq) {
                table.entries.push((seq.to_vec(), code));
            }
        }
        table
    }

    /// Build from explicit entries (exotic terminal classes, tests).
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (Vec<u8>, KeyCode)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Exact-match lookup of a complete sequence.
    #[must_use]
    pub fn lookup(&self, seq: &[u8]) -> Option<KeyCode> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == seq)
            .map(|&(_, code)| code)
    }

    fn contains(&self, seq: &[u8]) -> bool {
        self.entries.iter().any(|(entry, _)| entry == seq)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for KeyTable {
    fn default() -> Self {
        Self::fallback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_terminfo::Source;

    #[test]
    fn fallback_covers_common_keys() {
        let table = KeyTable::fallback();
        assert_eq!(table.lookup(b"\x1b[A"), Some(KeyCode::Up));
        assert_eq!(table.lookup(b"\x1bOP"), Some(KeyCode::F(1)));
        assert_eq!(table.lookup(b"\x1b[24~"), Some(KeyCode::F(12)));
        assert_eq!(table.lookup(b"\x1b[99~"), None);
    }

    #[test]
    fn database_entries_take_priority() {
        // A terminal that reports a nonstandard F1.
        let text = "odd|odd terminal,\n\tkf1=\\E[11~, kcuu1=\\E[A,\n";
        let db = Database::load("odd", Source::Text(text)).unwrap();
        let table = KeyTable::from_database(&db);

        assert_eq!(table.lookup(b"\x1b[11~"), Some(KeyCode::F(1)));
        // Fallback still answers for sequences the database lacks.
        assert_eq!(table.lookup(b"\x1b[5~"), Some(KeyCode::PageUp));
        // And the standard F1 form remains reachable via fallback.
        assert_eq!(table.lookup(b"\x1bOP"), Some(KeyCode::F(1)));
    }

    #[test]
    fn from_database_with_full_fallback_db() {
        let table = KeyTable::from_database(&Database::fallback());
        assert_eq!(table.lookup(b"\x1bOA"), Some(KeyCode::Up));
        assert_eq!(table.lookup(b"\x1b[15~"), Some(KeyCode::F(5)));
    }
}
