#![forbid(unsafe_code)]

//! Render capability set.
//!
//! A [`RenderCaps`] is built once from a capability database and holds
//! everything the renderer emits: the compiled cursor-address program,
//! color setters, attribute sequences, and the relative-movement
//! sequences the cost model weighs.
//!
//! Every capability has a documented fixed fallback (the ANSI/xterm
//! form) so rendering degrades instead of failing when a descriptor
//! under-reports. Color is the exception: a terminal that advertises no
//! colors gets no color sequences at all rather than garbage.

use weft_terminfo::{params, CompiledCap, Database, NumCap, StrCap, TerminfoError};

use crate::cell::{Attrs, Color};

// ANSI fallbacks used when the database lacks the capability.
const FALLBACK_CUP: &[u8] = b"\x1b[%i%p1%d;%p2%dH";
const FALLBACK_SETAF: &[u8] =
    b"\x1b[%?%p1%{8}%<%t3%p1%d%e%p1%{16}%<%t9%p1%{8}%-%d%e38;5;%p1%d%;m";
const FALLBACK_SETAB: &[u8] =
    b"\x1b[%?%p1%{8}%<%t4%p1%d%e%p1%{16}%<%t10%p1%{8}%-%d%e48;5;%p1%d%;m";
const FALLBACK_SGR0: &[u8] = b"\x1b[0m";
const FALLBACK_CUF1: &[u8] = b"\x1b[C";
const FALLBACK_CUD1: &[u8] = b"\n";
const FALLBACK_CR: &[u8] = b"\r";
const FALLBACK_CLEAR: &[u8] = b"\x1b[H\x1b[2J";
const FALLBACK_BOLD: &[u8] = b"\x1b[1m";
const FALLBACK_UNDERLINE: &[u8] = b"\x1b[4m";
const FALLBACK_BLINK: &[u8] = b"\x1b[5m";
const FALLBACK_REVERSE: &[u8] = b"\x1b[7m";
const FALLBACK_INVISIBLE: &[u8] = b"\x1b[8m";

/// The escape sequences a renderer needs, compiled from one terminal's
/// capability database.
#[derive(Debug, Clone)]
pub struct RenderCaps {
    cup: CompiledCap,
    setaf: Option<CompiledCap>,
    setab: Option<CompiledCap>,
    /// Reset all attributes and colors.
    pub sgr0: Vec<u8>,
    /// Move right one column.
    pub cuf1: Vec<u8>,
    /// Move down one row.
    pub cud1: Vec<u8>,
    /// Return to column 0.
    pub cr: Vec<u8>,
    /// Clear the screen and home the cursor.
    pub clear: Vec<u8>,
    bold: Vec<u8>,
    underline: Vec<u8>,
    blink: Vec<u8>,
    reverse: Vec<u8>,
    invisible: Vec<u8>,
    max_colors: i32,
}

impl RenderCaps {
    /// Build the render capability set from a database.
    ///
    /// # Errors
    ///
    /// Fails only when a capability's parameter string (or its fixed
    /// fallback) does not compile; a missing capability falls back
    /// silently.
    pub fn from_database(db: &Database) -> Result<Self, TerminfoError> {
        let cup = compile_or(db, StrCap::CursorAddress, "cup", FALLBACK_CUP)?;
        let max_colors = db.num(NumCap::MaxColors).unwrap_or(0);

        // Terminals without color get no color sequences at all.
        let (setaf, setab) = if max_colors > 0 {
            (
                Some(compile_or(db, StrCap::SetAForeground, "setaf", FALLBACK_SETAF)?),
                Some(compile_or(db, StrCap::SetABackground, "setab", FALLBACK_SETAB)?),
            )
        } else {
            (None, None)
        };

        Ok(Self {
            cup,
            setaf,
            setab,
            sgr0: raw_or(db, StrCap::ExitAttributeMode, FALLBACK_SGR0),
            cuf1: raw_or(db, StrCap::CursorRight, FALLBACK_CUF1),
            cud1: raw_or(db, StrCap::CursorDown, FALLBACK_CUD1),
            cr: raw_or(db, StrCap::CarriageReturn, FALLBACK_CR),
            clear: raw_or(db, StrCap::ClearScreen, FALLBACK_CLEAR),
            bold: raw_or(db, StrCap::EnterBoldMode, FALLBACK_BOLD),
            underline: raw_or(db, StrCap::EnterUnderlineMode, FALLBACK_UNDERLINE),
            blink: raw_or(db, StrCap::EnterBlinkMode, FALLBACK_BLINK),
            reverse: raw_or(db, StrCap::EnterReverseMode, FALLBACK_REVERSE),
            invisible: raw_or(db, StrCap::EnterSecureMode, FALLBACK_INVISIBLE),
            max_colors,
        })
    }

    /// Absolute cursor positioning, 0-indexed `(row, column)`.
    #[must_use]
    pub fn cursor_address(&self, row: u16, col: u16) -> Vec<u8> {
        self.cup.call(&[i64::from(row), i64::from(col)])
    }

    /// Foreground color sequence, or `None` for default-color cells and
    /// colorless terminals. Indices beyond `max-colors` are clamped.
    #[must_use]
    pub fn set_foreground(&self, color: Color) -> Option<Vec<u8>> {
        let Color::Indexed(idx) = color else {
            return None;
        };
        let setaf = self.setaf.as_ref()?;
        Some(setaf.call(&[i64::from(self.clamp_index(idx))]))
    }

    /// Background color sequence; same rules as [`Self::set_foreground`].
    #[must_use]
    pub fn set_background(&self, color: Color) -> Option<Vec<u8>> {
        let Color::Indexed(idx) = color else {
            return None;
        };
        let setab = self.setab.as_ref()?;
        Some(setab.call(&[i64::from(self.clamp_index(idx))]))
    }

    fn clamp_index(&self, idx: u8) -> u8 {
        let limit = self.max_colors.clamp(1, 256) - 1;
        idx.min(limit as u8)
    }

    /// Append the enable sequences for each set attribute.
    pub fn push_attrs(&self, attrs: Attrs, out: &mut Vec<u8>) {
        if attrs.contains(Attrs::BOLD) {
            out.extend_from_slice(&self.bold);
        }
        if attrs.contains(Attrs::UNDERLINE) {
            out.extend_from_slice(&self.underline);
        }
        if attrs.contains(Attrs::BLINK) {
            out.extend_from_slice(&self.blink);
        }
        if attrs.contains(Attrs::INVERSE) {
            out.extend_from_slice(&self.reverse);
        }
        if attrs.contains(Attrs::INVISIBLE) {
            out.extend_from_slice(&self.invisible);
        }
    }

    /// The terminal's advertised color count (0 = monochrome).
    #[must_use]
    pub fn max_colors(&self) -> i32 {
        self.max_colors
    }
}

fn compile_or(
    db: &Database,
    cap: StrCap,
    name: &'static str,
    fallback: &[u8],
) -> Result<CompiledCap, TerminfoError> {
    match db.compile(cap) {
        Ok(compiled) => Ok(compiled),
        Err(TerminfoError::UnsupportedCapability { .. }) => params::compile(fallback)
            .map_err(|source| TerminfoError::BadParamString { name, source }),
        Err(err) => Err(err),
    }
}

fn raw_or(db: &Database, cap: StrCap, fallback: &[u8]) -> Vec<u8> {
    db.raw_str(cap)
        .filter(|s| !s.is_empty())
        .map_or_else(|| fallback.to_vec(), <[u8]>::to_vec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_terminfo::Source;

    fn xterm_caps() -> RenderCaps {
        RenderCaps::from_database(&Database::fallback()).unwrap()
    }

    #[test]
    fn cursor_address_is_one_based_on_the_wire() {
        let caps = xterm_caps();
        assert_eq!(caps.cursor_address(5, 10), b"\x1b[6;11H");
        assert_eq!(caps.cursor_address(0, 0), b"\x1b[1;1H");
    }

    #[test]
    fn color_sequences_from_database() {
        let caps = xterm_caps();
        assert_eq!(caps.set_foreground(Color::Indexed(2)).unwrap(), b"\x1b[32m");
        assert_eq!(caps.set_background(Color::Indexed(4)).unwrap(), b"\x1b[44m");
        assert_eq!(
            caps.set_foreground(Color::Indexed(42)).unwrap(),
            b"\x1b[38;5;42m"
        );
        assert!(caps.set_foreground(Color::Default).is_none());
    }

    #[test]
    fn monochrome_terminal_gets_no_color() {
        let text = "dumb|dumb terminal,\n\tcup=\\E[%i%p1%d;%p2%dH,\n";
        let db = Database::load("dumb", Source::Text(text)).unwrap();
        let caps = RenderCaps::from_database(&db).unwrap();
        assert!(caps.set_foreground(Color::Indexed(1)).is_none());
        assert_eq!(caps.max_colors(), 0);
    }

    #[test]
    fn missing_cup_uses_ansi_fallback() {
        let text = "bare|bare terminal,\n\tcolors#8,\n";
        let db = Database::load("bare", Source::Text(text)).unwrap();
        let caps = RenderCaps::from_database(&db).unwrap();
        assert_eq!(caps.cursor_address(2, 3), b"\x1b[3;4H");
        // Color fallback engages because colors#8 is advertised.
        assert_eq!(caps.set_foreground(Color::Indexed(1)).unwrap(), b"\x1b[31m");
    }

    #[test]
    fn color_index_clamped_to_advertised_palette() {
        let text = "c8|eight colors,\n\tcolors#8, setaf=\\E[3%p1%dm,\n";
        let db = Database::load("c8", Source::Text(text)).unwrap();
        let caps = RenderCaps::from_database(&db).unwrap();
        assert_eq!(caps.set_foreground(Color::Indexed(200)).unwrap(), b"\x1b[37m");
    }

    #[test]
    fn attribute_sequences() {
        let caps = xterm_caps();
        let mut out = Vec::new();
        caps.push_attrs(Attrs::BOLD | Attrs::INVERSE, &mut out);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\x1b[1m"));
        assert!(text.contains("\x1b[7m"));
    }
}
