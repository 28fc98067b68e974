#![forbid(unsafe_code)]

//! Capability database: loading and lookup.
//!
//! A [`Database`] is the immutable capability table for one terminal type.
//! It is built once, at startup, from one of three sources:
//!
//! - a compiled binary descriptor (the standard terminfo on-disk format),
//! - a termcap-style text descriptor (`name|aliases, am, cols#80,
//!   cup=\E[%i%p1%d;%p2%dH, ...` with `,` or `:` field separators),
//! - the compiled-in fallback entry (so decoding and rendering never fail
//!   purely because a descriptor file is missing).
//!
//! After construction the table is read-only and can be shared by
//! reference across the decoder and renderer without locking.
//!
//! # Binary format
//!
//! Six-field 16-bit header (magic, name size, bool count, number count,
//! string count, string table size), then names / booleans / alignment
//! pad / numbers / string offsets / string table. Magic `0o432` stores
//! numbers as i16, `0o1036` as i32. Number and offset sentinels: `-1`
//! absent, `-2` cancelled. Extended-capability sections that follow the
//! string table are tolerated and ignored.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use memchr::memchr;

use crate::builtin;
use crate::names::{BoolCap, NumCap, StrCap};
use crate::params::{self, CompiledCap, ParamError};

/// Legacy magic: 16-bit numbers section.
const MAGIC_16: i16 = 0o432;
/// Extended magic: 32-bit numbers section.
const MAGIC_32: i16 = 0o1036;

/// Errors from descriptor loading and capability compilation.
#[derive(Debug)]
pub enum TerminfoError {
    /// No descriptor found for the requested terminal type.
    DescriptorNotFound {
        /// The terminal name that was looked up.
        name: String,
    },
    /// The descriptor exists but cannot be parsed.
    MalformedDescriptor {
        /// Human-readable reason.
        reason: String,
    },
    /// A requested capability is absent from the loaded table.
    ///
    /// Callers must supply their own fallback sequence; the database
    /// never silently substitutes one.
    UnsupportedCapability {
        /// Terminfo short name of the missing capability.
        name: &'static str,
    },
    /// A capability's parameter string failed to compile.
    BadParamString {
        /// Terminfo short name of the capability.
        name: &'static str,
        /// The underlying compile error.
        source: ParamError,
    },
    /// Filesystem error while searching for a descriptor.
    Io(io::Error),
}

impl fmt::Display for TerminfoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DescriptorNotFound { name } => {
                write!(f, "no terminal descriptor found for {name:?}")
            }
            Self::MalformedDescriptor { reason } => {
                write!(f, "malformed terminal descriptor: {reason}")
            }
            Self::UnsupportedCapability { name } => {
                write!(f, "terminal does not support capability {name:?}")
            }
            Self::BadParamString { name, source } => {
                write!(f, "capability {name:?} has a bad parameter string: {source}")
            }
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for TerminfoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::BadParamString { source, .. } => Some(source),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for TerminfoError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Where to load a descriptor from.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// Resolve against the conventional terminfo search path
    /// (`$TERMINFO`, `~/.terminfo`, `/etc/terminfo`, `/usr/share/terminfo`).
    SearchPath,
    /// Parse this binary descriptor blob.
    Binary(&'a [u8]),
    /// Parse this termcap-style text database (may hold several entries).
    Text(&'a str),
}

/// The immutable capability table for one terminal type.
#[derive(Debug, Clone)]
pub struct Database {
    names: Vec<String>,
    bools: [bool; BoolCap::ALL.len()],
    nums: [Option<i32>; NumCap::ALL.len()],
    strs: Vec<Option<Vec<u8>>>,
}

impl Database {
    fn empty(names: Vec<String>) -> Self {
        Self {
            names,
            bools: [false; BoolCap::ALL.len()],
            nums: [None; NumCap::ALL.len()],
            strs: vec![None; StrCap::ALL.len()],
        }
    }

    /// Load the descriptor for `name` from `source`.
    ///
    /// # Errors
    ///
    /// `DescriptorNotFound` when the terminal type is unknown to the
    /// source, `MalformedDescriptor` when a descriptor exists but cannot
    /// be parsed, `Io` on filesystem failure.
    pub fn load(name: &str, source: Source<'_>) -> Result<Self, TerminfoError> {
        let db = match source {
            Source::SearchPath => Self::load_from_search_path(name)?,
            Source::Binary(bytes) => Self::from_binary(bytes)?,
            Source::Text(text) => Self::from_text(name, text)?,
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(terminal = name, aliases = ?db.names, "capability table loaded");
        Ok(db)
    }

    /// Load `name`, degrading to the compiled-in fallback table when no
    /// descriptor can be found or parsed.
    #[must_use]
    pub fn load_or_fallback(name: &str) -> Self {
        match Self::load(name, Source::SearchPath) {
            Ok(db) => db,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(terminal = name, error = %_err, "descriptor unavailable, using built-in fallback");
                Self::fallback()
            }
        }
    }

    /// The compiled-in xterm-family fallback table.
    #[must_use]
    pub fn fallback() -> Self {
        builtin::fallback()
    }

    /// Terminal name and aliases from the descriptor's names section.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Boolean capability lookup. Absent reads as `false`.
    #[inline]
    #[must_use]
    pub fn flag(&self, cap: BoolCap) -> bool {
        self.bools[cap.index()]
    }

    /// Numeric capability lookup. `None` means absent or cancelled.
    #[inline]
    #[must_use]
    pub fn num(&self, cap: NumCap) -> Option<i32> {
        self.nums[cap.index()]
    }

    /// Raw (uncompiled) string capability bytes.
    ///
    /// Suitable for capabilities without parameters (mode switches, key
    /// sequences). Parameterized capabilities should go through
    /// [`Database::compile`].
    #[must_use]
    pub fn raw_str(&self, cap: StrCap) -> Option<&[u8]> {
        self.strs[dense_slot(cap)].as_deref()
    }

    /// Compile a parameterized string capability into a callable
    /// escape-sequence generator.
    ///
    /// # Errors
    ///
    /// `UnsupportedCapability` when the capability is absent (callers
    /// must have a documented fallback), `BadParamString` when its
    /// parameter program is malformed.
    pub fn compile(&self, cap: StrCap) -> Result<CompiledCap, TerminfoError> {
        let raw = self
            .raw_str(cap)
            .ok_or(TerminfoError::UnsupportedCapability {
                name: cap.short_name(),
            })?;
        params::compile(raw).map_err(|source| TerminfoError::BadParamString {
            name: cap.short_name(),
            source,
        })
    }

    // --- binary descriptors ------------------------------------------------

    /// Parse a binary terminfo descriptor.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, TerminfoError> {
        let mut r = Reader { bytes, pos: 0 };

        let magic = r.i16("magic")?;
        let num_width = match magic {
            MAGIC_16 => 2usize,
            MAGIC_32 => 4usize,
            other => {
                return Err(malformed(format!("bad magic number {other:#o}")));
            }
        };

        let name_size = r.len_field("name section size")?;
        let bool_count = r.len_field("boolean count")?;
        let num_count = r.len_field("number count")?;
        let str_count = r.len_field("string count")?;
        let str_size = r.len_field("string table size")?;

        let names_raw = r.take(name_size, "names section")?;
        let names_end = memchr(0, names_raw).unwrap_or(names_raw.len());
        let names = String::from_utf8_lossy(&names_raw[..names_end])
            .split('|')
            .map(str::to_owned)
            .collect::<Vec<_>>();

        let mut db = Self::empty(names);

        let bool_raw = r.take(bool_count, "boolean section")?;
        for (i, &b) in bool_raw.iter().enumerate() {
            if b == 1
                && let Some(cap) = BoolCap::from_index(i)
            {
                db.bools[cap.index()] = true;
            }
        }

        // Numbers are 2-byte aligned.
        if (name_size + bool_count) % 2 == 1 {
            r.take(1, "alignment pad")?;
        }

        for i in 0..num_count {
            let value = if num_width == 2 {
                i64::from(r.i16("number entry")?)
            } else {
                i64::from(r.i32("number entry")?)
            };
            if value >= 0
                && let Some(cap) = NumCap::from_index(i)
            {
                db.nums[cap.index()] = Some(value as i32);
            }
            // -1 absent, -2 cancelled: both read back as None.
        }

        let mut offsets = Vec::with_capacity(str_count);
        for _ in 0..str_count {
            offsets.push(r.i16("string offset")?);
        }

        let table = r.take(str_size, "string table")?;
        for (i, &off) in offsets.iter().enumerate() {
            if off < 0 {
                continue;
            }
            let Some(cap) = StrCap::from_index(i) else {
                continue;
            };
            let start = off as usize;
            if start >= table.len() {
                return Err(malformed(format!(
                    "string offset {start} outside table of {} bytes",
                    table.len()
                )));
            }
            let end = memchr(0, &table[start..])
                .map(|n| start + n)
                .ok_or_else(|| malformed(format!("unterminated string at offset {start}")))?;
            db.strs[dense_slot(cap)] = Some(table[start..end].to_vec());
        }

        // Anything past the string table is the extended-capability
        // section; nothing in this crate consumes it.
        Ok(db)
    }

    // --- text descriptors --------------------------------------------------

    /// Parse a termcap-style text database, selecting the entry whose
    /// name field mentions `name`.
    pub fn from_text(name: &str, text: &str) -> Result<Self, TerminfoError> {
        for entry in split_entries(text) {
            let db = Self::parse_text_entry(&entry)?;
            if db.names.iter().any(|n| n == name) {
                return Ok(db);
            }
        }
        Err(TerminfoError::DescriptorNotFound {
            name: name.to_owned(),
        })
    }

    fn parse_text_entry(entry: &str) -> Result<Self, TerminfoError> {
        let mut fields = split_fields(entry);
        let name_field = fields
            .next()
            .ok_or_else(|| malformed("empty text entry".into()))?;
        let names = name_field.split('|').map(str::to_owned).collect();
        let mut db = Self::empty(names);

        for field in fields {
            let field = field.trim();
            if field.is_empty() {
                continue;
            }
            if let Some(eq) = field.find('=') {
                let (key, value) = (&field[..eq], &field[eq + 1..]);
                if let Some(cap) = StrCap::from_short_name(key) {
                    db.strs[dense_slot(cap)] = Some(decode_text_escapes(value));
                }
            } else if let Some(hash) = field.find('#') {
                let (key, value) = (&field[..hash], &field[hash + 1..]);
                let Some(cap) = NumCap::from_short_name(key) else {
                    continue;
                };
                let parsed = if let Some(hex) = value.strip_prefix("0x") {
                    i32::from_str_radix(hex, 16)
                } else {
                    value.parse()
                };
                match parsed {
                    Ok(n) if n >= 0 => db.nums[cap.index()] = Some(n),
                    _ => {
                        return Err(malformed(format!("bad numeric value in {field:?}")));
                    }
                }
            } else if let Some(key) = field.strip_suffix('@') {
                // Cancelled capability.
                if let Some(cap) = BoolCap::from_short_name(key) {
                    db.bools[cap.index()] = false;
                } else if let Some(cap) = StrCap::from_short_name(key) {
                    db.strs[dense_slot(cap)] = None;
                } else if let Some(cap) = NumCap::from_short_name(key) {
                    db.nums[cap.index()] = None;
                }
            } else if let Some(cap) = BoolCap::from_short_name(field) {
                db.bools[cap.index()] = true;
            }
            // Unknown capability names are skipped: text databases carry
            // far more capabilities than this core models.
        }
        Ok(db)
    }

    // --- search path -------------------------------------------------------

    fn load_from_search_path(name: &str) -> Result<Self, TerminfoError> {
        if name.is_empty() {
            return Err(TerminfoError::DescriptorNotFound {
                name: name.to_owned(),
            });
        }
        for dir in search_dirs() {
            for candidate in candidate_paths(&dir, name) {
                if candidate.is_file() {
                    let bytes = std::fs::read(&candidate)?;
                    return Self::from_binary(&bytes);
                }
            }
        }
        Err(TerminfoError::DescriptorNotFound {
            name: name.to_owned(),
        })
    }
}

fn malformed(reason: String) -> TerminfoError {
    TerminfoError::MalformedDescriptor { reason }
}

/// Dense storage slot for a (sparse-indexed) string capability.
fn dense_slot(cap: StrCap) -> usize {
    StrCap::ALL
        .iter()
        .position(|&c| c == cap)
        .unwrap_or_else(|| unreachable!("every StrCap appears in StrCap::ALL"))
}

/// Length-checked little-endian section reader.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], TerminfoError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&e| e <= self.bytes.len())
            .ok_or_else(|| malformed(format!("truncated {what}")))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn i16(&mut self, what: &str) -> Result<i16, TerminfoError> {
        let b = self.take(2, what)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    fn i32(&mut self, what: &str) -> Result<i32, TerminfoError> {
        let b = self.take(4, what)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn len_field(&mut self, what: &str) -> Result<usize, TerminfoError> {
        let v = self.i16(what)?;
        usize::try_from(v).map_err(|_| malformed(format!("negative {what}")))
    }
}

/// Split a text database into entries. An entry starts at a line whose
/// first column is non-blank; continuation lines (leading whitespace or a
/// trailing `\`) belong to the current entry. Comment lines start with `#`.
fn split_entries(text: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut continuing = false;

    for line in text.lines() {
        if line.trim_start().starts_with('#') || (line.trim().is_empty() && !continuing) {
            continue;
        }
        let starts_entry = !line.starts_with([' ', '\t']) && !continuing;
        if starts_entry && !current.is_empty() {
            entries.push(std::mem::take(&mut current));
        }
        let stripped = line.strip_suffix('\\').unwrap_or(line);
        continuing = line.ends_with('\\');
        current.push_str(stripped.trim_start());
    }
    if !current.is_empty() {
        entries.push(current);
    }
    entries
}

/// Split an entry into capability fields on unescaped `,` or `:`.
fn split_fields(entry: &str) -> impl Iterator<Item = String> + '_ {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = entry.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push('\\');
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ',' | ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        fields.push(current);
    }
    fields.into_iter()
}

/// Decode termcap/terminfo text escapes (`\E`, `^X`, `\072`, ...) into
/// raw bytes.
fn decode_text_escapes(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() => {
                i += 1;
                match bytes[i] {
                    b'E' | b'e' => out.push(0x1B),
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0C),
                    b's' => out.push(b' '),
                    b'l' => out.push(b'\n'),
                    b'^' => out.push(b'^'),
                    b'\\' => out.push(b'\\'),
                    b',' => out.push(b','),
                    b':' => out.push(b':'),
                    b'0'..=b'7' => {
                        let mut v: u16 = 0;
                        let mut digits = 0;
                        while digits < 3 && i < bytes.len() && bytes[i].is_ascii_digit() {
                            v = v * 8 + u16::from(bytes[i] - b'0');
                            i += 1;
                            digits += 1;
                        }
                        i -= 1;
                        // \0 means a literal 0x80 in termcap (NUL is the
                        // C string terminator).
                        out.push(if v == 0 { 0x80 } else { (v & 0xFF) as u8 });
                    }
                    other => out.push(other),
                }
                i += 1;
            }
            b'^' if i + 1 < bytes.len() => {
                i += 1;
                let c = bytes[i];
                out.push(if c == b'?' { 0x7F } else { c & 0x1F });
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    out
}

fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(dir) = std::env::var("TERMINFO")
        && !dir.is_empty()
    {
        dirs.push(PathBuf::from(dir));
    }
    if let Ok(home) = std::env::var("HOME")
        && !home.is_empty()
    {
        dirs.push(Path::new(&home).join(".terminfo"));
    }
    dirs.push(PathBuf::from("/etc/terminfo"));
    dirs.push(PathBuf::from("/lib/terminfo"));
    dirs.push(PathBuf::from("/usr/share/terminfo"));
    dirs
}

/// Descriptor file candidates inside one database directory: the
/// first-letter subdirectory layout and the hex-byte layout some systems
/// use instead.
fn candidate_paths(dir: &Path, name: &str) -> Vec<PathBuf> {
    let first = name.chars().next().unwrap_or('x');
    vec![
        dir.join(first.to_string()).join(name),
        dir.join(format!("{:02x}", first as u32)).join(name),
    ]
}
