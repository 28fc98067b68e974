#![forbid(unsafe_code)]

//! Canonical input event types.
//!
//! Key, mouse, paste, and focus events are produced by the input
//! decoder. Resize events come from the terminal session, because
//! SIGWINCH arrives out of band rather than through the input byte
//! stream. All types derive `Clone`, `PartialEq`, and `Eq` for use in
//! tests and pattern matching.
//!
//! # Design Notes
//!
//! - Mouse coordinates are 0-indexed (the wire protocols are 1-indexed)
//! - Key events carry the raw byte sequence they were decoded from, so
//!   applications can implement passthrough or debugging views
//! - `Modifiers` use bitflags for easy combination

use bitflags::bitflags;

/// Canonical input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),

    /// A mouse event.
    Mouse(MouseEvent),

    /// Paste event (from bracketed paste mode).
    Paste(PasteEvent),

    /// Terminal was resized. Produced by the session's resize poll, not
    /// by the decoder.
    Resize {
        /// New terminal width in columns.
        width: u16,
        /// New terminal height in rows.
        height: u16,
    },

    /// Focus gained (`true`) or lost (`false`).
    Focus(bool),
}

/// A keyboard event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The raw bytes this event was decoded from.
    pub raw: Vec<u8>,
}

impl KeyEvent {
    /// Create a new key event with no modifiers and no raw bytes.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            raw: Vec::new(),
        }
    }

    /// Attach modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Attach the raw byte sequence.
    #[must_use]
    pub fn with_raw(mut self, raw: impl Into<Vec<u8>>) -> Self {
        self.raw = raw.into();
        self
    }

    /// Check if this is a specific character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch == c)
    }

    /// Check if Ctrl is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Alt/Meta is held.
    #[must_use]
    pub const fn meta(&self) -> bool {
        self.modifiers.contains(Modifiers::META)
    }

    /// Check if Shift is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key (includes decoded UTF-8 input).
    Char(char),
    /// Enter/Return.
    Enter,
    /// Escape.
    Escape,
    /// Backspace.
    Backspace,
    /// Tab.
    Tab,
    /// Shift+Tab (back-tab).
    BackTab,
    /// Delete.
    Delete,
    /// Insert.
    Insert,
    /// Home.
    Home,
    /// End.
    End,
    /// Page Up.
    PageUp,
    /// Page Down.
    PageDown,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Function key (F1-F12 from the key table, more via modifiers).
    F(u8),
}

bitflags! {
    /// Modifier keys that can be held during a key or mouse event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Meta/Option key.
        const META  = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// A mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    /// The action that occurred.
    pub kind: MouseEventKind,

    /// Column (0-indexed, leftmost is 0).
    pub column: u16,

    /// Row (0-indexed, topmost is 0).
    pub row: u16,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl MouseEvent {
    /// Create a new mouse event with no modifiers.
    #[must_use]
    pub const fn new(kind: MouseEventKind, column: u16, row: u16) -> Self {
        Self {
            kind,
            column,
            row,
            modifiers: Modifiers::NONE,
        }
    }

    /// Attach modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Position as `(column, row)`.
    #[must_use]
    pub const fn position(&self) -> (u16, u16) {
        (self.column, self.row)
    }
}

/// The action of a mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    /// Button pressed.
    Down(MouseButton),
    /// Button released.
    ///
    /// X10-protocol releases do not identify the button; those decode as
    /// `Up(MouseButton::Left)`.
    Up(MouseButton),
    /// Mouse dragged with a button held.
    Drag(MouseButton),
    /// Mouse moved with no button held.
    Moved,
    /// Wheel scrolled up.
    ScrollUp,
    /// Wheel scrolled down.
    ScrollDown,
}

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left button.
    Left,
    /// Middle button.
    Middle,
    /// Right button.
    Right,
}

/// A paste event from bracketed paste mode.
///
/// The text between the paste markers is delivered verbatim: escape-like
/// content inside a paste is never interpreted as key presses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteEvent {
    /// The pasted text.
    pub text: String,
}

impl PasteEvent {
    /// Create a paste event.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_event_builders() {
        let ev = KeyEvent::new(KeyCode::Up)
            .with_modifiers(Modifiers::CTRL | Modifiers::SHIFT)
            .with_raw(&b"\x1b[1;6A"[..]);
        assert!(ev.ctrl());
        assert!(ev.shift());
        assert!(!ev.meta());
        assert_eq!(ev.raw, b"\x1b[1;6A");
    }

    #[test]
    fn is_char_matches() {
        assert!(KeyEvent::new(KeyCode::Char('q')).is_char('q'));
        assert!(!KeyEvent::new(KeyCode::Char('q')).is_char('x'));
        assert!(!KeyEvent::new(KeyCode::Enter).is_char('\n'));
    }

    #[test]
    fn mouse_position() {
        let ev = MouseEvent::new(MouseEventKind::Down(MouseButton::Left), 10, 3);
        assert_eq!(ev.position(), (10, 3));
    }
}
