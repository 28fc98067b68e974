#![forbid(unsafe_code)]

//! Terminal I/O controller: input decoding, staged output, and session
//! lifecycle.
//!
//! This crate owns the duplex byte stream to and from the terminal:
//!
//! - [`decoder`] turns raw input bytes into structured [`event::Event`]s
//!   (keys, mouse, paste, focus), restartable across partial reads
//! - [`writer`] stages output bytes and flushes them atomically, so a
//!   frame never reaches the terminal in tearing pieces
//! - [`session`] enters raw mode and enables optional terminal modes
//!   with guaranteed restore on drop, panic, and fatal signals
//! - [`keytable`] resolves escape sequences to keys, preferring the
//!   terminal's own capability database over the hardcoded xterm table
//!
//! Escape sequences for modes and rendering come from [`weft_terminfo`];
//! this crate only hardcodes the DEC private modes terminfo never
//! standardized.

pub mod decoder;
pub mod event;
pub mod keytable;
pub mod logging;
pub mod session;
pub mod writer;

pub use decoder::{InputDecoder, MouseEncoding};
pub use event::{
    Event, KeyCode, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind, PasteEvent,
};
pub use keytable::KeyTable;
pub use session::{SessionOptions, TerminalSession};
pub use writer::{TermWriter, WriteError};
