#![forbid(unsafe_code)]

//! Cell: one screen position.
//!
//! A cell holds one grapheme cluster (possibly double-width), a
//! foreground and background color, and an attribute set. Cells are
//! value types; the grid stores them row-major.
//!
//! Wide glyphs occupy two cells: the glyph itself, then a continuation
//! cell that renders nothing. The grid maintains this pairing; the
//! renderer skips continuations when emitting.

use smallvec::SmallVec;
use unicode_width::UnicodeWidthStr;

bitflags::bitflags! {
    /// Text attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attrs: u8 {
        /// Bold / increased intensity.
        const BOLD      = 1 << 0;
        /// Underlined.
        const UNDERLINE = 1 << 1;
        /// Blinking.
        const BLINK     = 1 << 2;
        /// Inverse video (swap fg/bg).
        const INVERSE   = 1 << 3;
        /// Invisible (concealed) text.
        const INVISIBLE = 1 << 4;
    }
}

/// A cell color.
///
/// Indexed colors are interpreted against the terminal's palette; the
/// renderer clamps indices beyond the terminal's advertised `max-colors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// The terminal's default color.
    #[default]
    Default,
    /// Palette index (0-15 standard, 16-255 extended).
    Indexed(u8),
}

/// Fg/bg/attrs of a cell, compared as a unit by the renderer's
/// attribute batching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    /// Foreground color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
    /// Attribute set.
    pub attrs: Attrs,
}

impl Style {
    /// The default style (default colors, no attributes).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fg: Color::Default,
            bg: Color::Default,
            attrs: Attrs::empty(),
        }
    }

    /// Set the foreground color.
    #[must_use]
    pub const fn fg(mut self, color: Color) -> Self {
        self.fg = color;
        self
    }

    /// Set the background color.
    #[must_use]
    pub const fn bg(mut self, color: Color) -> Self {
        self.bg = color;
        self
    }

    /// Add attributes.
    #[must_use]
    pub fn attrs(mut self, attrs: Attrs) -> Self {
        self.attrs |= attrs;
        self
    }
}

/// One screen position.
///
/// The grapheme is stored as UTF-8 inline (no heap allocation for BMP
/// characters; multi-codepoint clusters spill). An empty grapheme marks
/// a continuation cell, the trailing half of a wide glyph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    text: SmallVec<[u8; 4]>,
    /// Foreground color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
    /// Attribute set.
    pub attrs: Attrs,
}

impl Default for Cell {
    fn default() -> Self {
        Self::from_char(' ')
    }
}

impl Cell {
    /// A cell holding one character with default style.
    #[must_use]
    pub fn from_char(c: char) -> Self {
        let mut text = SmallVec::new();
        let mut buf = [0u8; 4];
        text.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        Self {
            text,
            fg: Color::Default,
            bg: Color::Default,
            attrs: Attrs::empty(),
        }
    }

    /// A cell holding one grapheme cluster with default style.
    ///
    /// The caller is expected to pass a single cluster; the grid's text
    /// helpers segment full strings.
    #[must_use]
    pub fn from_grapheme(grapheme: &str) -> Self {
        Self {
            text: SmallVec::from_slice(grapheme.as_bytes()),
            fg: Color::Default,
            bg: Color::Default,
            attrs: Attrs::empty(),
        }
    }

    /// The trailing half of a wide glyph. Renders nothing.
    #[must_use]
    pub fn continuation() -> Self {
        Self {
            text: SmallVec::new(),
            fg: Color::Default,
            bg: Color::Default,
            attrs: Attrs::empty(),
        }
    }

    /// Attach a style.
    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.fg = style.fg;
        self.bg = style.bg;
        self.attrs = style.attrs;
        self
    }

    /// The cell's grapheme as UTF-8 text. Empty for continuations.
    #[must_use]
    pub fn symbol(&self) -> &str {
        // Only constructed from &str/char, so always valid UTF-8.
        std::str::from_utf8(&self.text).unwrap_or("")
    }

    /// Display width in columns: 0 for continuations, 2 for wide glyphs,
    /// otherwise 1.
    #[must_use]
    pub fn width(&self) -> u16 {
        if self.text.is_empty() {
            return 0;
        }
        self.symbol().width().clamp(1, 2) as u16
    }

    /// True for the trailing half of a wide glyph.
    #[must_use]
    pub fn is_continuation(&self) -> bool {
        self.text.is_empty()
    }

    /// The cell's style as a unit.
    #[must_use]
    pub fn style(&self) -> Style {
        Style {
            fg: self.fg,
            bg: self.bg,
            attrs: self.attrs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cell_is_styled_space() {
        let cell = Cell::default();
        assert_eq!(cell.symbol(), " ");
        assert_eq!(cell.width(), 1);
        assert!(!cell.is_continuation());
        assert_eq!(cell.style(), Style::new());
    }

    #[test]
    fn wide_glyph_width() {
        assert_eq!(Cell::from_char('中').width(), 2);
        assert_eq!(Cell::from_char('a').width(), 1);
        assert_eq!(Cell::continuation().width(), 0);
    }

    #[test]
    fn multi_codepoint_cluster() {
        let cell = Cell::from_grapheme("e\u{301}"); // é as combining pair
        assert_eq!(cell.symbol(), "e\u{301}");
        assert_eq!(cell.width(), 1);
    }

    #[test]
    fn style_builder() {
        let style = Style::new()
            .fg(Color::Indexed(2))
            .bg(Color::Indexed(0))
            .attrs(Attrs::BOLD | Attrs::UNDERLINE);
        let cell = Cell::from_char('x').with_style(style);
        assert_eq!(cell.fg, Color::Indexed(2));
        assert!(cell.attrs.contains(Attrs::BOLD));
        assert_eq!(cell.style(), style);
    }

    #[test]
    fn cells_compare_by_content_and_style() {
        let a = Cell::from_char('x');
        let b = Cell::from_char('x');
        assert_eq!(a, b);
        assert_ne!(a, Cell::from_char('y'));
        assert_ne!(a, a.clone().with_style(Style::new().attrs(Attrs::BOLD)));
    }
}
