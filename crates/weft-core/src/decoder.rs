#![forbid(unsafe_code)]

//! Streaming input decoder.
//!
//! Turns raw terminal bytes into [`Event`]s. The decoder is a state
//! machine that is restartable across calls: feed it whatever bytes are
//! available and any incomplete sequence stays buffered for the next
//! call, so events come out identical no matter how the byte stream is
//! chunked.
//!
//! # Recognized input
//!
//! - ASCII characters and control codes
//! - UTF-8 multi-byte sequences (1-3 continuation bytes per character)
//! - CSI and SS3 key sequences, resolved against a [`KeyTable`] first
//!   and structurally (xterm modifier encoding) second
//! - Mouse reports: X10 (3 raw bytes, coordinates clamped at 223 by the
//!   protocol), UTF-8 coordinates (via [`MouseEncoding::Utf8`]), and SGR
//! - Bracketed paste (contents delivered verbatim, never as keys)
//! - OSC sequences (discarded; terminal responses are not key input)
//!
//! # The lone-ESC problem
//!
//! A bare ESC byte is ambiguous: it may be the Escape key or the prefix
//! of a sequence whose remainder has not arrived. The decoder holds it
//! and releases it as a standalone Escape key only when the next `feed`
//! call arrives with no bytes, or when the host calls
//! [`InputDecoder::flush_pending`] after its own timeout.
//!
//! # Robustness
//!
//! Sequence accumulation is length-limited (a hostile peer cannot grow
//! buffers without bound), and bytes that fit no recognized grammar are
//! dropped byte-by-byte rather than surfaced as spurious key presses.

use crate::event::{Event, KeyCode, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind};
use crate::keytable::KeyTable;

/// Maximum CSI sequence length.
const MAX_CSI_LEN: usize = 256;

/// Maximum discarded-OSC length.
const MAX_OSC_LEN: usize = 4096;

/// Maximum paste content length (1 MiB).
const MAX_PASTE_LEN: usize = 1024 * 1024;

/// Bracketed paste end marker.
const PASTE_END: &[u8; 6] = b"\x1b[201~";

/// How mouse coordinates arrive in legacy (CSI M) reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseEncoding {
    /// One raw byte per value, coordinate + 32. Limited to column/row 223.
    #[default]
    X10,
    /// Values are UTF-8 code points (DEC 1005), lifting the 223 limit.
    Utf8,
}

/// Decoder state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DecoderState {
    /// Normal character input.
    #[default]
    Ground,
    /// After ESC, awaiting the sequence kind (or flush as Escape key).
    Escape,
    /// Collecting CSI parameters and final byte.
    Csi,
    /// After ESC O.
    Ss3,
    /// Discarding an OSC sequence.
    Osc,
    /// After ESC inside OSC (for the ESC \ terminator).
    OscEscape,
    /// Collecting the three coordinate values of a legacy mouse report.
    MouseBytes,
    /// Collecting UTF-8 continuation bytes.
    Utf8 {
        /// Bytes collected so far.
        collected: u8,
        /// Total bytes expected.
        expected: u8,
    },
}

/// Terminal input decoder.
///
/// ```
/// use weft_core::decoder::InputDecoder;
/// use weft_core::event::{Event, KeyCode};
///
/// let mut decoder = InputDecoder::new();
/// let events = decoder.feed(b"\x1b[A");
/// assert!(matches!(&events[0], Event::Key(k) if k.code == KeyCode::Up));
/// ```
#[derive(Debug)]
pub struct InputDecoder {
    state: DecoderState,
    /// CSI parameter bytes (including the final byte once seen).
    buffer: Vec<u8>,
    /// Raw bytes of the sequence in flight, for `KeyEvent::raw`.
    raw: Vec<u8>,
    /// Paste accumulation while in bracketed-paste mode.
    paste_buffer: Vec<u8>,
    /// Rolling window of the last end-marker-length bytes, maintained
    /// only once the paste buffer is full so overflow bytes cost O(1).
    paste_tail: [u8; PASTE_END.len()],
    in_paste: bool,
    utf8_buffer: [u8; 4],
    /// Legacy mouse report: decoded values and partial UTF-8 lead byte.
    mouse_vals: [u16; 3],
    mouse_count: u8,
    mouse_partial: Option<u8>,
    mouse_encoding: MouseEncoding,
    key_table: KeyTable,
}

impl Default for InputDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl InputDecoder {
    /// Create a decoder with the hardcoded xterm-family key table.
    #[must_use]
    pub fn new() -> Self {
        Self::with_key_table(KeyTable::fallback())
    }

    /// Create a decoder with a terminal-specific key table (usually
    /// [`KeyTable::from_database`]).
    #[must_use]
    pub fn with_key_table(key_table: KeyTable) -> Self {
        Self {
            state: DecoderState::Ground,
            buffer: Vec::with_capacity(64),
            raw: Vec::with_capacity(64),
            paste_buffer: Vec::new(),
            paste_tail: [0; PASTE_END.len()],
            in_paste: false,
            utf8_buffer: [0; 4],
            mouse_vals: [0; 3],
            mouse_count: 0,
            mouse_partial: None,
            mouse_encoding: MouseEncoding::default(),
            key_table,
        }
    }

    /// Select how legacy mouse reports encode coordinates. Call when the
    /// session enables DEC 1005.
    pub fn set_mouse_encoding(&mut self, encoding: MouseEncoding) {
        self.mouse_encoding = encoding;
    }

    /// Decode as many complete events as `input` allows.
    ///
    /// Partial sequences remain buffered. Calling with an empty slice
    /// releases a held lone ESC (see module docs) and nothing else.
    pub fn feed(&mut self, input: &[u8]) -> Vec<Event> {
        #[cfg(feature = "tracing")]
        let _span = crate::logging::trace_span!("decode", len = input.len());
        #[cfg(feature = "tracing")]
        let _guard = _span.enter();

        if input.is_empty() {
            return self.flush_pending().map(Event::Key).into_iter().collect();
        }

        let mut events = Vec::new();
        for &byte in input {
            if let Some(event) = self.process_byte(byte) {
                events.push(event);
            }
        }
        events
    }

    /// Release a held lone ESC as a standalone Escape key.
    ///
    /// Hosts with their own escape timeout call this when the timer
    /// fires; [`InputDecoder::feed`] with an empty slice does the same.
    pub fn flush_pending(&mut self) -> Option<KeyEvent> {
        if self.state == DecoderState::Escape {
            self.state = DecoderState::Ground;
            Some(KeyEvent::new(KeyCode::Escape).with_raw(std::mem::take(&mut self.raw)))
        } else {
            None
        }
    }

    fn process_byte(&mut self, byte: u8) -> Option<Event> {
        if self.in_paste {
            return self.process_paste_byte(byte);
        }

        match self.state {
            DecoderState::Ground => self.process_ground(byte),
            DecoderState::Escape => self.process_escape(byte),
            DecoderState::Csi => self.process_csi(byte),
            DecoderState::Ss3 => self.process_ss3(byte),
            DecoderState::Osc => self.process_osc(byte),
            DecoderState::OscEscape => self.process_osc_escape(byte),
            DecoderState::MouseBytes => self.process_mouse_byte(byte),
            DecoderState::Utf8 { collected, expected } => {
                self.process_utf8(byte, collected, expected)
            }
        }
    }

    fn process_ground(&mut self, byte: u8) -> Option<Event> {
        match byte {
            0x1B => {
                self.state = DecoderState::Escape;
                self.raw.clear();
                self.raw.push(byte);
                None
            }
            // Ctrl+Space / Ctrl+@
            0x00 => Some(self.key(KeyEvent::new(KeyCode::Char(' ')).with_modifiers(Modifiers::CTRL), &[byte])),
            0x09 => Some(self.key(KeyEvent::new(KeyCode::Tab), &[byte])),
            0x0D => Some(self.key(KeyEvent::new(KeyCode::Enter), &[byte])),
            // Ctrl+A..Ctrl+Z except Tab and Enter
            0x01..=0x08 | 0x0A..=0x0C | 0x0E..=0x1A => {
                let c = (byte + b'a' - 1) as char;
                Some(self.key(
                    KeyEvent::new(KeyCode::Char(c)).with_modifiers(Modifiers::CTRL),
                    &[byte],
                ))
            }
            0x7F => Some(self.key(KeyEvent::new(KeyCode::Backspace), &[byte])),
            0x20..=0x7E => Some(self.key(KeyEvent::new(KeyCode::Char(byte as char)), &[byte])),
            // UTF-8 lead bytes
            0xC0..=0xDF => self.start_utf8(byte, 2),
            0xE0..=0xEF => self.start_utf8(byte, 3),
            0xF0..=0xF7 => self.start_utf8(byte, 4),
            // Stray continuation or invalid byte: dropped, never a key.
            _ => None,
        }
    }

    fn key(&mut self, event: KeyEvent, raw: &[u8]) -> Event {
        Event::Key(event.with_raw(raw))
    }

    fn start_utf8(&mut self, byte: u8, expected: u8) -> Option<Event> {
        self.utf8_buffer[0] = byte;
        self.state = DecoderState::Utf8 {
            collected: 1,
            expected,
        };
        None
    }

    fn process_escape(&mut self, byte: u8) -> Option<Event> {
        self.raw.push(byte);
        match byte {
            b'[' => {
                self.state = DecoderState::Csi;
                self.buffer.clear();
                None
            }
            b'O' => {
                self.state = DecoderState::Ss3;
                None
            }
            b']' => {
                self.state = DecoderState::Osc;
                self.buffer.clear();
                None
            }
            // ESC ESC: the first was a real Escape press; stay armed
            // with only the second ESC in the sequence buffer.
            0x1B => {
                self.raw.truncate(1);
                Some(Event::Key(
                    KeyEvent::new(KeyCode::Escape).with_raw(&b"\x1b"[..]),
                ))
            }
            // Meta+printable
            0x20..=0x7E => {
                self.state = DecoderState::Ground;
                let raw = std::mem::take(&mut self.raw);
                Some(Event::Key(
                    KeyEvent::new(KeyCode::Char(byte as char))
                        .with_modifiers(Modifiers::META)
                        .with_raw(raw),
                ))
            }
            _ => {
                self.state = DecoderState::Ground;
                None
            }
        }
    }

    fn process_csi(&mut self, byte: u8) -> Option<Event> {
        if self.buffer.len() >= MAX_CSI_LEN {
            self.reset_sequence();
            return None;
        }
        self.raw.push(byte);
        self.buffer.push(byte);

        match byte {
            // Parameter and private-marker bytes
            b'0'..=b'9' | b';' | b':' | b'<' | b'=' | b'>' | b'?' => None,
            // Final byte
            0x40..=0x7E => {
                self.state = DecoderState::Ground;
                self.dispatch_csi()
            }
            _ => {
                self.reset_sequence();
                None
            }
        }
    }

    fn reset_sequence(&mut self) {
        self.state = DecoderState::Ground;
        self.buffer.clear();
        self.raw.clear();
    }

    /// A complete CSI sequence is in `buffer` (params + final byte) and
    /// `raw` (including the `ESC [` introducer).
    fn dispatch_csi(&mut self) -> Option<Event> {
        let seq = std::mem::take(&mut self.buffer);
        let raw = std::mem::take(&mut self.raw);
        let (&final_byte, params) = seq.split_last()?;

        match (params, final_byte) {
            // Focus reporting
            ([], b'I') => return Some(Event::Focus(true)),
            ([], b'O') => return Some(Event::Focus(false)),

            // Bracketed paste start; end is matched inside the paste.
            (b"200", b'~') => {
                self.in_paste = true;
                self.paste_buffer.clear();
                return None;
            }

            // Legacy mouse report: coordinates follow as raw bytes.
            ([], b'M') => {
                self.state = DecoderState::MouseBytes;
                self.mouse_count = 0;
                self.mouse_partial = None;
                return None;
            }

            // SGR mouse report
            _ if params.first() == Some(&b'<') && (final_byte == b'M' || final_byte == b'm') => {
                return parse_sgr_mouse(&params[1..], final_byte == b'm');
            }

            _ => {}
        }

        // Terminal-specific key table first, structure second.
        if let Some(code) = self.key_table.lookup(&raw) {
            return Some(Event::Key(KeyEvent::new(code).with_raw(raw)));
        }
        structural_csi_key(params, final_byte)
            .map(|(code, mods)| Event::Key(KeyEvent::new(code).with_modifiers(mods).with_raw(raw)))
    }

    fn process_ss3(&mut self, byte: u8) -> Option<Event> {
        self.state = DecoderState::Ground;
        self.raw.push(byte);
        let raw = std::mem::take(&mut self.raw);

        if let Some(code) = self.key_table.lookup(&raw) {
            return Some(Event::Key(KeyEvent::new(code).with_raw(raw)));
        }
        let code = match byte {
            b'P' => KeyCode::F(1),
            b'Q' => KeyCode::F(2),
            b'R' => KeyCode::F(3),
            b'S' => KeyCode::F(4),
            b'A' => KeyCode::Up,
            b'B' => KeyCode::Down,
            b'C' => KeyCode::Right,
            b'D' => KeyCode::Left,
            b'H' => KeyCode::Home,
            b'F' => KeyCode::End,
            b'M' => KeyCode::Enter,
            _ => return None,
        };
        Some(Event::Key(KeyEvent::new(code).with_raw(raw)))
    }

    // OSC sequences are terminal responses, not key input: consume and
    // drop them so they cannot corrupt the event stream.
    fn process_osc(&mut self, byte: u8) -> Option<Event> {
        if self.buffer.len() >= MAX_OSC_LEN {
            self.reset_sequence();
            return None;
        }
        match byte {
            0x07 => self.reset_sequence(),
            0x1B => self.state = DecoderState::OscEscape,
            _ => self.buffer.push(byte),
        }
        None
    }

    fn process_osc_escape(&mut self, byte: u8) -> Option<Event> {
        if byte == b'\\' {
            self.reset_sequence();
        } else {
            self.state = DecoderState::Osc;
        }
        None
    }

    fn process_mouse_byte(&mut self, byte: u8) -> Option<Event> {
        let value = match self.mouse_encoding {
            MouseEncoding::X10 => u16::from(byte),
            MouseEncoding::Utf8 => {
                if let Some(lead) = self.mouse_partial.take() {
                    if byte & 0xC0 != 0x80 {
                        // Broken continuation: abandon the report.
                        self.reset_sequence();
                        return None;
                    }
                    (u16::from(lead & 0x1F) << 6) | u16::from(byte & 0x3F)
                } else if byte >= 0xE0 {
                    // Three-byte code points exceed any real terminal
                    // geometry; abandon the report.
                    self.reset_sequence();
                    return None;
                } else if byte >= 0xC0 {
                    self.mouse_partial = Some(byte);
                    return None;
                } else {
                    u16::from(byte)
                }
            }
        };

        self.mouse_vals[usize::from(self.mouse_count)] = value;
        self.mouse_count += 1;
        if self.mouse_count < 3 {
            return None;
        }

        self.state = DecoderState::Ground;
        self.raw.clear();
        let cb = self.mouse_vals[0].saturating_sub(32);
        let column = self.mouse_vals[1].saturating_sub(33);
        let row = self.mouse_vals[2].saturating_sub(33);
        let release = cb & 0b11 == 0b11;
        Some(Event::Mouse(
            MouseEvent::new(mouse_kind(cb, release), column, row)
                .with_modifiers(mouse_modifiers(cb)),
        ))
    }

    fn process_utf8(&mut self, byte: u8, collected: u8, expected: u8) -> Option<Event> {
        if byte & 0xC0 != 0x80 {
            // Invalid continuation: drop the partial character and let
            // the offending byte restart recognition.
            self.state = DecoderState::Ground;
            return self.process_byte(byte);
        }

        self.utf8_buffer[usize::from(collected)] = byte;
        let collected = collected + 1;
        if collected < expected {
            self.state = DecoderState::Utf8 { collected, expected };
            return None;
        }

        self.state = DecoderState::Ground;
        let bytes = &self.utf8_buffer[..usize::from(expected)];
        let c = std::str::from_utf8(bytes).ok()?.chars().next()?;
        let raw = bytes.to_vec();
        Some(Event::Key(KeyEvent::new(KeyCode::Char(c)).with_raw(raw)))
    }

    fn process_paste_byte(&mut self, byte: u8) -> Option<Event> {
        if self.paste_buffer.len() < MAX_PASTE_LEN + PASTE_END.len() {
            self.paste_buffer.push(byte);
            if self.paste_buffer.ends_with(PASTE_END) {
                let content_len = self.paste_buffer.len() - PASTE_END.len();
                return Some(self.finish_paste(content_len));
            }
            if self.paste_buffer.len() == MAX_PASTE_LEN + PASTE_END.len() {
                // Buffer just filled: seed the rolling tail window so the
                // end marker is still found once bytes stop being stored.
                let start = self.paste_buffer.len() - PASTE_END.len();
                self.paste_tail.copy_from_slice(&self.paste_buffer[start..]);
            }
            return None;
        }

        // Over the limit: content is dropped, only the fixed-size tail
        // window advances.
        self.paste_tail.copy_within(1.., 0);
        self.paste_tail[PASTE_END.len() - 1] = byte;
        if self.paste_tail == *PASTE_END {
            return Some(self.finish_paste(MAX_PASTE_LEN));
        }
        None
    }

    fn finish_paste(&mut self, content_len: usize) -> Event {
        self.in_paste = false;
        let text = String::from_utf8_lossy(&self.paste_buffer[..content_len]).into_owned();
        self.paste_buffer.clear();
        Event::Paste(crate::event::PasteEvent::new(text))
    }
}

/// Structural fallback for CSI key sequences the key table does not
/// know: xterm arrow/navigation finals with optional `1;m` modifier
/// parameters, and `CSI n ~` function/navigation keys.
fn structural_csi_key(params: &[u8], final_byte: u8) -> Option<(KeyCode, Modifiers)> {
    let mods = modifier_param(params);
    let code = match final_byte {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        b'Z' => return Some((KeyCode::BackTab, Modifiers::SHIFT)),
        b'~' => {
            let num = first_param(params)?;
            let code = match num {
                1 | 7 => KeyCode::Home,
                2 => KeyCode::Insert,
                3 => KeyCode::Delete,
                4 | 8 => KeyCode::End,
                5 => KeyCode::PageUp,
                6 => KeyCode::PageDown,
                11..=15 => KeyCode::F(u8::try_from(num - 10).ok()?),
                17..=21 => KeyCode::F(u8::try_from(num - 11).ok()?),
                23 | 24 => KeyCode::F(u8::try_from(num - 12).ok()?),
                _ => return None,
            };
            return Some((code, mods));
        }
        _ => return None,
    };
    Some((code, mods))
}

fn first_param(params: &[u8]) -> Option<u32> {
    let s = std::str::from_utf8(params).ok()?;
    s.split(';').next()?.parse().ok()
}

/// Second CSI parameter as xterm modifier encoding: value = 1 + bits,
/// shift=1, meta=2, ctrl=4.
fn modifier_param(params: &[u8]) -> Modifiers {
    let Ok(s) = std::str::from_utf8(params) else {
        return Modifiers::NONE;
    };
    let value: u32 = s
        .split(';')
        .nth(1)
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);
    modifiers_from_xterm(value)
}

fn modifiers_from_xterm(value: u32) -> Modifiers {
    let bits = value.saturating_sub(1);
    let mut mods = Modifiers::NONE;
    if bits & 1 != 0 {
        mods |= Modifiers::SHIFT;
    }
    if bits & 2 != 0 {
        mods |= Modifiers::META;
    }
    if bits & 4 != 0 {
        mods |= Modifiers::CTRL;
    }
    mods
}

fn parse_sgr_mouse(params: &[u8], release: bool) -> Option<Event> {
    let s = std::str::from_utf8(params).ok()?;
    let mut parts = s.split(';');
    let cb: u16 = parts.next()?.parse().ok()?;
    let x: u16 = parts.next()?.parse().ok()?;
    let y: u16 = parts.next()?.parse().ok()?;

    let kind = if release {
        MouseEventKind::Up(mouse_button(cb))
    } else {
        mouse_kind(cb, false)
    };
    Some(Event::Mouse(
        MouseEvent::new(kind, x.saturating_sub(1), y.saturating_sub(1))
            .with_modifiers(mouse_modifiers(cb)),
    ))
}

fn mouse_button(cb: u16) -> MouseButton {
    match cb & 0b11 {
        1 => MouseButton::Middle,
        2 => MouseButton::Right,
        _ => MouseButton::Left,
    }
}

fn mouse_kind(cb: u16, release: bool) -> MouseEventKind {
    if cb & 64 != 0 {
        if cb & 1 != 0 {
            MouseEventKind::ScrollDown
        } else {
            MouseEventKind::ScrollUp
        }
    } else if cb & 32 != 0 {
        if cb & 0b11 == 0b11 {
            MouseEventKind::Moved
        } else {
            MouseEventKind::Drag(mouse_button(cb))
        }
    } else if release {
        MouseEventKind::Up(mouse_button(cb))
    } else {
        MouseEventKind::Down(mouse_button(cb))
    }
}

fn mouse_modifiers(cb: u16) -> Modifiers {
    let mut mods = Modifiers::NONE;
    if cb & 4 != 0 {
        mods |= Modifiers::SHIFT;
    }
    if cb & 8 != 0 {
        mods |= Modifiers::META;
    }
    if cb & 16 != 0 {
        mods |= Modifiers::CTRL;
    }
    mods
}
