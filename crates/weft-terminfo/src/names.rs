#![forbid(unsafe_code)]

//! Capability name enumerations.
//!
//! Terminfo addresses capabilities two ways: binary descriptors index them
//! positionally (the ncurses `term.h` ordering), text descriptors name them
//! with short codes (`cup`, `smso`, ...). Each enum here carries both: a
//! stable terminfo index and the short name used by text sources.
//!
//! Coverage is the standard prefix of each section plus the later-index
//! capabilities this crate's consumers actually need (color setters,
//! extended function keys, mouse). Indices outside the known set are
//! preserved by the loader but not nameable through these enums.

/// Boolean capabilities, in standard terminfo order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum BoolCap {
    /// `bw` — cub1 wraps from column 0 to last column.
    AutoLeftMargin = 0,
    /// `am` — terminal has automatic margins.
    AutoRightMargin = 1,
    /// `xsb` — beehive (f1=escape, f2=ctrl C).
    NoEscCtlc = 2,
    /// `xhp` — standout not erased by overwriting.
    CeolStandoutGlitch = 3,
    /// `xenl` — newline ignored after 80 columns.
    EatNewlineGlitch = 4,
    /// `eo` — can erase overstrikes with a blank.
    EraseOverstrike = 5,
    /// `gn` — generic line type.
    GenericType = 6,
    /// `hc` — hardcopy terminal.
    HardCopy = 7,
    /// `km` — has a meta key (shift, sets parity bit).
    HasMetaKey = 8,
    /// `hs` — has extra status line.
    HasStatusLine = 9,
    /// `in` — insert mode distinguishes nulls.
    InsertNullGlitch = 10,
    /// `da` — display may be retained above the screen.
    MemoryAbove = 11,
    /// `db` — display may be retained below the screen.
    MemoryBelow = 12,
    /// `mir` — safe to move while in insert mode.
    MoveInsertMode = 13,
    /// `msgr` — safe to move while in standout mode.
    MoveStandoutMode = 14,
    /// `os` — terminal can overstrike.
    OverStrike = 15,
    /// `eslok` — escape can be used on the status line.
    StatusLineEscOk = 16,
    /// `xt` — tabs destructive, magic smso char.
    DestTabsMagicSmso = 17,
    /// `hz` — cannot print ~'s.
    TildeGlitch = 18,
    /// `ul` — underline character overstrikes.
    TransparentUnderline = 19,
    /// `xon` — terminal uses xon/xoff handshaking.
    XonXoff = 20,
}

impl BoolCap {
    /// All known boolean capabilities, index order.
    pub const ALL: [Self; 21] = [
        Self::AutoLeftMargin,
        Self::AutoRightMargin,
        Self::NoEscCtlc,
        Self::CeolStandoutGlitch,
        Self::EatNewlineGlitch,
        Self::EraseOverstrike,
        Self::GenericType,
        Self::HardCopy,
        Self::HasMetaKey,
        Self::HasStatusLine,
        Self::InsertNullGlitch,
        Self::MemoryAbove,
        Self::MemoryBelow,
        Self::MoveInsertMode,
        Self::MoveStandoutMode,
        Self::OverStrike,
        Self::StatusLineEscOk,
        Self::DestTabsMagicSmso,
        Self::TildeGlitch,
        Self::TransparentUnderline,
        Self::XonXoff,
    ];

    /// Position of this capability in the binary boolean section.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Terminfo short name, as used by text descriptors.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::AutoLeftMargin => "bw",
            Self::AutoRightMargin => "am",
            Self::NoEscCtlc => "xsb",
            Self::CeolStandoutGlitch => "xhp",
            Self::EatNewlineGlitch => "xenl",
            Self::EraseOverstrike => "eo",
            Self::GenericType => "gn",
            Self::HardCopy => "hc",
            Self::HasMetaKey => "km",
            Self::HasStatusLine => "hs",
            Self::InsertNullGlitch => "in",
            Self::MemoryAbove => "da",
            Self::MemoryBelow => "db",
            Self::MoveInsertMode => "mir",
            Self::MoveStandoutMode => "msgr",
            Self::OverStrike => "os",
            Self::StatusLineEscOk => "eslok",
            Self::DestTabsMagicSmso => "xt",
            Self::TildeGlitch => "hz",
            Self::TransparentUnderline => "ul",
            Self::XonXoff => "xon",
        }
    }

    /// Look up a capability by terminfo short name.
    #[must_use]
    pub fn from_short_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.short_name() == name)
    }

    /// Look up a capability by binary section index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Numeric capabilities, in standard terminfo order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum NumCap {
    /// `cols` — number of columns in a line.
    Columns = 0,
    /// `it` — tabs initially every # spaces.
    InitTabs = 1,
    /// `lines` — number of lines on screen.
    Lines = 2,
    /// `lm` — lines of memory if > lines.
    LinesOfMemory = 3,
    /// `xmc` — number of blank characters left by smso/rmso.
    MagicCookieGlitch = 4,
    /// `pb` — lowest baud rate where padding is needed.
    PaddingBaudRate = 5,
    /// `vt` — virtual terminal number.
    VirtualTerminal = 6,
    /// `wsl` — number of columns in the status line.
    WidthStatusLine = 7,
    /// `nlab` — number of labels on screen.
    NumLabels = 8,
    /// `lh` — rows in each label.
    LabelHeight = 9,
    /// `lw` — columns in each label.
    LabelWidth = 10,
    /// `ma` — maximum combined attributes.
    MaxAttributes = 11,
    /// `wnum` — maximum number of definable windows.
    MaximumWindows = 12,
    /// `colors` — maximum number of colors on screen.
    MaxColors = 13,
    /// `pairs` — maximum number of color pairs.
    MaxPairs = 14,
    /// `ncv` — video attributes that cannot be used with color.
    NoColorVideo = 15,
}

impl NumCap {
    /// All known numeric capabilities, index order.
    pub const ALL: [Self; 16] = [
        Self::Columns,
        Self::InitTabs,
        Self::Lines,
        Self::LinesOfMemory,
        Self::MagicCookieGlitch,
        Self::PaddingBaudRate,
        Self::VirtualTerminal,
        Self::WidthStatusLine,
        Self::NumLabels,
        Self::LabelHeight,
        Self::LabelWidth,
        Self::MaxAttributes,
        Self::MaximumWindows,
        Self::MaxColors,
        Self::MaxPairs,
        Self::NoColorVideo,
    ];

    /// Position of this capability in the binary numbers section.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Terminfo short name, as used by text descriptors.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Columns => "cols",
            Self::InitTabs => "it",
            Self::Lines => "lines",
            Self::LinesOfMemory => "lm",
            Self::MagicCookieGlitch => "xmc",
            Self::PaddingBaudRate => "pb",
            Self::VirtualTerminal => "vt",
            Self::WidthStatusLine => "wsl",
            Self::NumLabels => "nlab",
            Self::LabelHeight => "lh",
            Self::LabelWidth => "lw",
            Self::MaxAttributes => "ma",
            Self::MaximumWindows => "wnum",
            Self::MaxColors => "colors",
            Self::MaxPairs => "pairs",
            Self::NoColorVideo => "ncv",
        }
    }

    /// Look up a capability by terminfo short name.
    #[must_use]
    pub fn from_short_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.short_name() == name)
    }

    /// Look up a capability by binary section index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// String capabilities.
///
/// Unlike the boolean/numeric sections this enum is sparse: the string
/// section of a modern descriptor has 400+ slots and most are irrelevant
/// to a control/rendering core. Discriminant values are the standard
/// terminfo indices, so `from_index` works for binary descriptors and the
/// gaps simply never resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum StrCap {
    /// `cbt` — back tab.
    BackTab = 0,
    /// `bel` — audible signal.
    Bell = 1,
    /// `cr` — carriage return.
    CarriageReturn = 2,
    /// `csr` — change scroll region to lines #1 through #2.
    ChangeScrollRegion = 3,
    /// `tbc` — clear all tab stops.
    ClearAllTabs = 4,
    /// `clear` — clear screen and home cursor.
    ClearScreen = 5,
    /// `el` — clear to end of line.
    ClrEol = 6,
    /// `ed` — clear to end of screen.
    ClrEos = 7,
    /// `hpa` — horizontal position absolute.
    ColumnAddress = 8,
    /// `cup` — move cursor to row #1, column #2.
    CursorAddress = 10,
    /// `cud1` — down one line.
    CursorDown = 11,
    /// `home` — home cursor.
    CursorHome = 12,
    /// `civis` — make cursor invisible.
    CursorInvisible = 13,
    /// `cub1` — left one column.
    CursorLeft = 14,
    /// `cnorm` — make cursor appear normal.
    CursorNormal = 16,
    /// `cuf1` — right one column.
    CursorRight = 17,
    /// `cuu1` — up one line.
    CursorUp = 19,
    /// `cvvis` — make cursor very visible.
    CursorVisible = 20,
    /// `dch1` — delete one character.
    DeleteCharacter = 21,
    /// `dl1` — delete one line.
    DeleteLine = 22,
    /// `blink` — turn on blinking.
    EnterBlinkMode = 26,
    /// `bold` — turn on bold.
    EnterBoldMode = 27,
    /// `smcup` — enter cursor-addressing (alternate screen) mode.
    EnterCaMode = 28,
    /// `dim` — turn on half-bright.
    EnterDimMode = 30,
    /// `smir` — enter insert mode.
    EnterInsertMode = 31,
    /// `invis` — turn on invisible text.
    EnterSecureMode = 32,
    /// `rev` — turn on reverse video.
    EnterReverseMode = 34,
    /// `smso` — begin standout mode.
    EnterStandoutMode = 35,
    /// `smul` — begin underline mode.
    EnterUnderlineMode = 36,
    /// `ech` — erase #1 characters.
    EraseChars = 37,
    /// `sgr0` — turn off all attributes.
    ExitAttributeMode = 39,
    /// `rmcup` — leave cursor-addressing (alternate screen) mode.
    ExitCaMode = 40,
    /// `rmir` — exit insert mode.
    ExitInsertMode = 42,
    /// `rmso` — exit standout mode.
    ExitStandoutMode = 43,
    /// `rmul` — exit underline mode.
    ExitUnderlineMode = 44,
    /// `kbs` — backspace key.
    KeyBackspace = 55,
    /// `kdch1` — delete-character key.
    KeyDc = 59,
    /// `kcud1` — down-arrow key.
    KeyDown = 61,
    /// `kf0` — F0 function key.
    KeyF0 = 65,
    /// `kf1` — F1 function key.
    KeyF1 = 66,
    /// `kf10` — F10 function key.
    KeyF10 = 67,
    /// `kf2` — F2 function key.
    KeyF2 = 68,
    /// `kf3` — F3 function key.
    KeyF3 = 69,
    /// `kf4` — F4 function key.
    KeyF4 = 70,
    /// `kf5` — F5 function key.
    KeyF5 = 71,
    /// `kf6` — F6 function key.
    KeyF6 = 72,
    /// `kf7` — F7 function key.
    KeyF7 = 73,
    /// `kf8` — F8 function key.
    KeyF8 = 74,
    /// `kf9` — F9 function key.
    KeyF9 = 75,
    /// `khome` — home key.
    KeyHome = 76,
    /// `kich1` — insert-character key.
    KeyIc = 77,
    /// `kcub1` — left-arrow key.
    KeyLeft = 79,
    /// `knp` — next-page key.
    KeyNpage = 81,
    /// `kpp` — previous-page key.
    KeyPpage = 82,
    /// `kcuf1` — right-arrow key.
    KeyRight = 83,
    /// `kcuu1` — up-arrow key.
    KeyUp = 87,
    /// `rmkx` — leave keyboard-transmit (application keypad) mode.
    KeypadLocal = 88,
    /// `smkx` — enter keyboard-transmit (application keypad) mode.
    KeypadXmit = 89,
    /// `dch` — delete #1 characters.
    ParmDch = 105,
    /// `dl` — delete #1 lines.
    ParmDeleteLine = 106,
    /// `cud` — down #1 lines.
    ParmDownCursor = 107,
    /// `ich` — insert #1 characters.
    ParmIch = 108,
    /// `indn` — scroll forward #1 lines.
    ParmIndex = 109,
    /// `il` — insert #1 lines.
    ParmInsertLine = 110,
    /// `cub` — left #1 columns.
    ParmLeftCursor = 111,
    /// `cuf` — right #1 columns.
    ParmRightCursor = 112,
    /// `rin` — scroll backward #1 lines.
    ParmRindex = 113,
    /// `cuu` — up #1 lines.
    ParmUpCursor = 114,
    /// `rep` — repeat character #1 #2 times.
    RepeatChar = 121,
    /// `ind` — scroll text up one line.
    ScrollForward = 128,
    /// `ri` — scroll text down one line.
    ScrollReverse = 129,
    /// `sgr` — define video attributes #1-#9.
    SetAttributes = 131,
    /// `vpa` — vertical position absolute.
    RowAddress = 139,
    /// `kcbt` — back-tab key.
    KeyBtab = 148,
    /// `kend` — end key.
    KeyEnd = 164,
    /// `kent` — enter/send key.
    KeyEnter = 165,
    /// `kf11` — F11 function key.
    KeyF11 = 216,
    /// `kf12` — F12 function key.
    KeyF12 = 217,
    /// `op` — set default color pair.
    OrigPair = 297,
    /// `kmous` — mouse event report prefix.
    KeyMouse = 355,
    /// `setaf` — set ANSI foreground color.
    SetAForeground = 359,
    /// `setab` — set ANSI background color.
    SetABackground = 360,
}

impl StrCap {
    /// All known string capabilities, index order: the dense standard
    /// prefix followed by the sparse high-index entries.
    pub const ALL: [Self; 82] = [
        Self::BackTab,
        Self::Bell,
        Self::CarriageReturn,
        Self::ChangeScrollRegion,
        Self::ClearAllTabs,
        Self::ClearScreen,
        Self::ClrEol,
        Self::ClrEos,
        Self::ColumnAddress,
        Self::CursorAddress,
        Self::CursorDown,
        Self::CursorHome,
        Self::CursorInvisible,
        Self::CursorLeft,
        Self::CursorNormal,
        Self::CursorRight,
        Self::CursorUp,
        Self::CursorVisible,
        Self::DeleteCharacter,
        Self::DeleteLine,
        Self::EnterBlinkMode,
        Self::EnterBoldMode,
        Self::EnterCaMode,
        Self::EnterDimMode,
        Self::EnterInsertMode,
        Self::EnterSecureMode,
        Self::EnterReverseMode,
        Self::EnterStandoutMode,
        Self::EnterUnderlineMode,
        Self::EraseChars,
        Self::ExitAttributeMode,
        Self::ExitCaMode,
        Self::ExitInsertMode,
        Self::ExitStandoutMode,
        Self::ExitUnderlineMode,
        Self::KeyBackspace,
        Self::KeyDc,
        Self::KeyDown,
        Self::KeyF0,
        Self::KeyF1,
        Self::KeyF10,
        Self::KeyF2,
        Self::KeyF3,
        Self::KeyF4,
        Self::KeyF5,
        Self::KeyF6,
        Self::KeyF7,
        Self::KeyF8,
        Self::KeyF9,
        Self::KeyHome,
        Self::KeyIc,
        Self::KeyLeft,
        Self::KeyNpage,
        Self::KeyPpage,
        Self::KeyRight,
        Self::KeyUp,
        Self::KeypadLocal,
        Self::KeypadXmit,
        Self::ParmDch,
        Self::ParmDeleteLine,
        Self::ParmDownCursor,
        Self::ParmIch,
        Self::ParmIndex,
        Self::ParmInsertLine,
        Self::ParmLeftCursor,
        Self::ParmRightCursor,
        Self::ParmRindex,
        Self::ParmUpCursor,
        Self::RepeatChar,
        Self::ScrollForward,
        Self::ScrollReverse,
        Self::SetAttributes,
        Self::RowAddress,
        Self::KeyBtab,
        Self::KeyEnd,
        Self::KeyEnter,
        Self::KeyF11,
        Self::KeyF12,
        Self::OrigPair,
        Self::KeyMouse,
        Self::SetAForeground,
        Self::SetABackground,
    ];

    /// Position of this capability in the binary string-offset section.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Terminfo short name, as used by text descriptors.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::BackTab => "cbt",
            Self::Bell => "bel",
            Self::CarriageReturn => "cr",
            Self::ChangeScrollRegion => "csr",
            Self::ClearAllTabs => "tbc",
            Self::ClearScreen => "clear",
            Self::ClrEol => "el",
            Self::ClrEos => "ed",
            Self::ColumnAddress => "hpa",
            Self::CursorAddress => "cup",
            Self::CursorDown => "cud1",
            Self::CursorHome => "home",
            Self::CursorInvisible => "civis",
            Self::CursorLeft => "cub1",
            Self::CursorNormal => "cnorm",
            Self::CursorRight => "cuf1",
            Self::CursorUp => "cuu1",
            Self::CursorVisible => "cvvis",
            Self::DeleteCharacter => "dch1",
            Self::DeleteLine => "dl1",
            Self::EnterBlinkMode => "blink",
            Self::EnterBoldMode => "bold",
            Self::EnterCaMode => "smcup",
            Self::EnterDimMode => "dim",
            Self::EnterInsertMode => "smir",
            Self::EnterSecureMode => "invis",
            Self::EnterReverseMode => "rev",
            Self::EnterStandoutMode => "smso",
            Self::EnterUnderlineMode => "smul",
            Self::EraseChars => "ech",
            Self::ExitAttributeMode => "sgr0",
            Self::ExitCaMode => "rmcup",
            Self::ExitInsertMode => "rmir",
            Self::ExitStandoutMode => "rmso",
            Self::ExitUnderlineMode => "rmul",
            Self::KeyBackspace => "kbs",
            Self::KeyDc => "kdch1",
            Self::KeyDown => "kcud1",
            Self::KeyF0 => "kf0",
            Self::KeyF1 => "kf1",
            Self::KeyF10 => "kf10",
            Self::KeyF2 => "kf2",
            Self::KeyF3 => "kf3",
            Self::KeyF4 => "kf4",
            Self::KeyF5 => "kf5",
            Self::KeyF6 => "kf6",
            Self::KeyF7 => "kf7",
            Self::KeyF8 => "kf8",
            Self::KeyF9 => "kf9",
            Self::KeyHome => "khome",
            Self::KeyIc => "kich1",
            Self::KeyLeft => "kcub1",
            Self::KeyNpage => "knp",
            Self::KeyPpage => "kpp",
            Self::KeyRight => "kcuf1",
            Self::KeyUp => "kcuu1",
            Self::KeypadLocal => "rmkx",
            Self::KeypadXmit => "smkx",
            Self::ParmDch => "dch",
            Self::ParmDeleteLine => "dl",
            Self::ParmDownCursor => "cud",
            Self::ParmIch => "ich",
            Self::ParmIndex => "indn",
            Self::ParmInsertLine => "il",
            Self::ParmLeftCursor => "cub",
            Self::ParmRightCursor => "cuf",
            Self::ParmRindex => "rin",
            Self::ParmUpCursor => "cuu",
            Self::RepeatChar => "rep",
            Self::ScrollForward => "ind",
            Self::ScrollReverse => "ri",
            Self::SetAttributes => "sgr",
            Self::RowAddress => "vpa",
            Self::KeyBtab => "kcbt",
            Self::KeyEnd => "kend",
            Self::KeyEnter => "kent",
            Self::KeyF11 => "kf11",
            Self::KeyF12 => "kf12",
            Self::OrigPair => "op",
            Self::KeyMouse => "kmous",
            Self::SetAForeground => "setaf",
            Self::SetABackground => "setab",
        }
    }

    /// Look up a capability by terminfo short name.
    #[must_use]
    pub fn from_short_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.short_name() == name)
    }

    /// Look up a capability by binary section index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.index() == index)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_round_trip_by_name_and_index() {
        for cap in BoolCap::ALL {
            assert_eq!(BoolCap::from_short_name(cap.short_name()), Some(cap));
            assert_eq!(BoolCap::from_index(cap.index()), Some(cap));
        }
    }

    #[test]
    fn num_round_trip_by_name_and_index() {
        for cap in NumCap::ALL {
            assert_eq!(NumCap::from_short_name(cap.short_name()), Some(cap));
            assert_eq!(NumCap::from_index(cap.index()), Some(cap));
        }
    }

    #[test]
    fn str_round_trip_by_name_and_index() {
        for cap in StrCap::ALL {
            assert_eq!(StrCap::from_short_name(cap.short_name()), Some(cap));
            assert_eq!(StrCap::from_index(cap.index()), Some(cap));
        }
    }

    #[test]
    fn str_all_is_complete_and_index_ordered() {
        // Dense string storage sizes itself from this table, so every
        // variant must appear exactly once, in index order.
        for pair in StrCap::ALL.windows(2) {
            assert!(pair[0].index() < pair[1].index());
        }
        for cap in [
            StrCap::KeyF12,
            StrCap::OrigPair,
            StrCap::KeyMouse,
            StrCap::SetAForeground,
            StrCap::SetABackground,
        ] {
            assert!(StrCap::ALL.contains(&cap));
        }
    }

    #[test]
    fn well_known_indices() {
        // These positions are load-bearing for binary descriptor parsing.
        assert_eq!(StrCap::CursorAddress.index(), 10);
        assert_eq!(StrCap::ExitAttributeMode.index(), 39);
        assert_eq!(NumCap::MaxColors.index(), 13);
        assert_eq!(StrCap::SetAForeground.index(), 359);
        assert_eq!(StrCap::SetABackground.index(), 360);
    }

    #[test]
    fn unknown_index_is_none() {
        assert_eq!(StrCap::from_index(9), None); // cmdch, not carried
        assert_eq!(BoolCap::from_index(500), None);
    }
}
