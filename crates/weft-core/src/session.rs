#![forbid(unsafe_code)]

//! Terminal session lifecycle guard.
//!
//! RAII-based terminal lifecycle management that guarantees cleanup even
//! on panic. The session owns raw-mode entry/exit, tracks every mode it
//! enables, and restores them in reverse order on every exit path.
//!
//! Mode sequences come from the capability database where terminfo
//! defines them (`smcup`/`rmcup`, `civis`/`cnorm`); the DEC private
//! modes terminfo never standardized (mouse reporting, bracketed paste,
//! focus events) use their fixed xterm sequences:
//!
//! | Feature | Enable | Disable |
//! |---------|--------|---------|
//! | Mouse (SGR) | `CSI ? 1000;1002;1006 h` | `CSI ? 1000;1002;1006 l` |
//! | Bracketed paste | `CSI ? 2004 h` | `CSI ? 2004 l` |
//! | Focus events | `CSI ? 1004 h` | `CSI ? 1004 l` |
//!
//! Raw-mode (termios) entry/exit goes through crossterm; everything else
//! is emitted as bytes through the session's [`TermWriter`].
//!
//! On unix a background thread watches signals: SIGINT/SIGTERM restore
//! the terminal before exiting, and SIGWINCH raises a flag that
//! [`TerminalSession::poll_resize`] converts into an [`Event::Resize`].
//!
//! # Cleanup Order
//!
//! On drop, in reverse order of enabling: focus events, bracketed
//! paste, mouse capture, show cursor, leave alternate screen, exit raw
//! mode, flush.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use weft_terminfo::{Database, StrCap};

use crate::decoder::{InputDecoder, MouseEncoding};
use crate::event::Event;
use crate::keytable::KeyTable;
use crate::writer::TermWriter;

#[cfg(unix)]
use signal_hook::consts::signal::{SIGINT, SIGTERM, SIGWINCH};
#[cfg(unix)]
use signal_hook::iterator::Signals;

const MOUSE_ENABLE: &[u8] = b"\x1b[?1000;1002;1006h";
const MOUSE_DISABLE: &[u8] = b"\x1b[?1000;1002;1006l";
const PASTE_ENABLE: &[u8] = b"\x1b[?2004h";
const PASTE_DISABLE: &[u8] = b"\x1b[?2004l";
const FOCUS_ENABLE: &[u8] = b"\x1b[?1004h";
const FOCUS_DISABLE: &[u8] = b"\x1b[?1004l";

// Fallbacks when the database lacks the capability.
const ALT_SCREEN_ENTER: &[u8] = b"\x1b[?1049h";
const ALT_SCREEN_LEAVE: &[u8] = b"\x1b[?1049l";
const CURSOR_HIDE: &[u8] = b"\x1b[?25l";
const CURSOR_SHOW: &[u8] = b"\x1b[?25h";

/// Terminal session configuration options.
///
/// All options default to `false` for maximum portability.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Switch to the alternate screen buffer, preserving scrollback.
    /// Use for full-screen applications; leave off for inline mode.
    pub alternate_screen: bool,

    /// Enable mouse capture with SGR encoding. SGR lifts the 223-column
    /// coordinate limit of the legacy X10 reports.
    pub mouse_capture: bool,

    /// Enable bracketed paste mode, so pasted text arrives wrapped in
    /// markers instead of as fake keystrokes.
    pub bracketed_paste: bool,

    /// Enable focus gained/lost reporting.
    pub focus_events: bool,

    /// Hide the cursor for the session's lifetime.
    pub hide_cursor: bool,
}

/// A terminal session that manages raw mode and cleanup.
///
/// Owns the output path (a [`TermWriter`] over stdout) and the input
/// decoder, so mode sequences, render output, and event decoding all
/// flow through one object.
///
/// # Contract
///
/// - Only one `TerminalSession` should exist at a time; a second session
///   fights the first over shared terminal state.
/// - Creating a session enters raw mode (no line buffering, no echo).
/// - When dropped (normally or via panic), every enabled mode is
///   disabled and the terminal is restored.
///
/// # Example
///
/// ```no_run
/// use weft_core::session::{SessionOptions, TerminalSession};
/// use weft_terminfo::Database;
///
/// let db = Database::load_or_fallback("xterm-256color");
/// let mut session = TerminalSession::new(&db, SessionOptions {
///     alternate_screen: true,
///     mouse_capture: true,
///     ..Default::default()
/// })?;
///
/// // Feed bytes read from stdin as they arrive:
/// for event in session.decode(b"\x1b[A") {
///     // handle event
/// }
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct TerminalSession {
    options: SessionOptions,
    writer: TermWriter<io::Stdout>,
    decoder: InputDecoder,
    /// Restore sequences captured from the database at startup, so drop
    /// does not need the database.
    leave_alt_screen: Vec<u8>,
    show_cursor: Vec<u8>,
    // Track what was enabled so cleanup only undoes real changes.
    raw_mode_entered: bool,
    alternate_screen_enabled: bool,
    mouse_enabled: bool,
    bracketed_paste_enabled: bool,
    focus_events_enabled: bool,
    cursor_hidden: bool,
    /// Set by the signal thread on SIGWINCH, consumed by `poll_resize`.
    resized: Arc<AtomicBool>,
    #[cfg(unix)]
    signal_guard: Option<SignalGuard>,
}

impl TerminalSession {
    /// Enter raw mode and enable the requested features.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode cannot be entered or the enable
    /// sequences cannot be written.
    pub fn new(db: &Database, options: SessionOptions) -> io::Result<Self> {
        install_panic_hook();

        crossterm::terminal::enable_raw_mode()?;
        #[cfg(feature = "tracing")]
        crate::logging::info!("terminal raw mode enabled");

        let resized = Arc::new(AtomicBool::new(false));
        let mut session = Self {
            options: options.clone(),
            writer: TermWriter::new(io::stdout()),
            decoder: InputDecoder::with_key_table(KeyTable::from_database(db)),
            leave_alt_screen: db_seq(db, StrCap::ExitCaMode, ALT_SCREEN_LEAVE),
            show_cursor: db_seq(db, StrCap::CursorNormal, CURSOR_SHOW),
            raw_mode_entered: true,
            alternate_screen_enabled: false,
            mouse_enabled: false,
            bracketed_paste_enabled: false,
            focus_events_enabled: false,
            cursor_hidden: false,
            #[cfg(unix)]
            signal_guard: Some(SignalGuard::new(Arc::clone(&resized))?),
            resized,
        };

        if options.alternate_screen {
            let seq = db_seq(db, StrCap::EnterCaMode, ALT_SCREEN_ENTER);
            session.writer.write(&seq);
            session.alternate_screen_enabled = true;
        }
        if options.mouse_capture {
            session.writer.write(MOUSE_ENABLE);
            session.mouse_enabled = true;
        }
        if options.bracketed_paste {
            session.writer.write(PASTE_ENABLE);
            session.bracketed_paste_enabled = true;
        }
        if options.focus_events {
            session.writer.write(FOCUS_ENABLE);
            session.focus_events_enabled = true;
        }
        if options.hide_cursor {
            let seq = db_seq(db, StrCap::CursorInvisible, CURSOR_HIDE);
            session.writer.write(&seq);
            session.cursor_hidden = true;
        }

        session.writer.flush()?;
        Ok(session)
    }

    /// Create a minimal session (raw mode only).
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode cannot be entered.
    pub fn minimal(db: &Database) -> io::Result<Self> {
        Self::new(db, SessionOptions::default())
    }

    /// Current terminal size as `(columns, rows)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be queried.
    pub fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    /// Decode raw input bytes into events.
    ///
    /// Feed whatever a read returned; incomplete sequences stay buffered
    /// in the decoder. An empty slice releases a held lone ESC.
    pub fn decode(&mut self, bytes: &[u8]) -> Vec<Event> {
        self.decoder.feed(bytes)
    }

    /// Release a held lone ESC after the host's escape timeout.
    pub fn flush_pending_input(&mut self) -> Option<Event> {
        self.decoder.flush_pending().map(Event::Key)
    }

    /// Take a pending resize notification as an [`Event::Resize`].
    ///
    /// Window size changes arrive as SIGWINCH, outside the input byte
    /// stream, so they surface here instead of through [`decode`](Self::decode).
    /// Poll this alongside input reads. Signals coalesced while unpolled
    /// yield a single event carrying the latest size.
    ///
    /// # Errors
    ///
    /// Returns an error if the new size cannot be queried.
    pub fn poll_resize(&mut self) -> io::Result<Option<Event>> {
        if !self.resized.swap(false, Ordering::Relaxed) {
            return Ok(None);
        }
        let (width, height) = self.size()?;
        Ok(Some(Event::Resize { width, height }))
    }

    /// Switch the decoder's legacy mouse coordinate encoding. Call after
    /// enabling DEC 1005 on terminals that lack SGR mouse support.
    pub fn set_mouse_encoding(&mut self, encoding: MouseEncoding) {
        self.decoder.set_mouse_encoding(encoding);
    }

    /// The session's staged output writer. Renderers write diff output
    /// here and flush once per frame.
    pub fn writer(&mut self) -> &mut TermWriter<io::Stdout> {
        &mut self.writer
    }

    /// The options this session was created with.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Cleanup helper shared between drop and explicit teardown.
    fn cleanup(&mut self) {
        #[cfg(unix)]
        let _ = self.signal_guard.take();

        // Disable in reverse order of enabling.
        if self.focus_events_enabled {
            self.writer.write(FOCUS_DISABLE);
            self.focus_events_enabled = false;
        }
        if self.bracketed_paste_enabled {
            self.writer.write(PASTE_DISABLE);
            self.bracketed_paste_enabled = false;
        }
        if self.mouse_enabled {
            self.writer.write(MOUSE_DISABLE);
            self.mouse_enabled = false;
        }
        if self.cursor_hidden {
            let seq = std::mem::take(&mut self.show_cursor);
            self.writer.write(&seq);
            self.cursor_hidden = false;
        }
        if self.alternate_screen_enabled {
            let seq = std::mem::take(&mut self.leave_alt_screen);
            self.writer.write(&seq);
            self.alternate_screen_enabled = false;
        }
        let _ = self.writer.flush();

        if self.raw_mode_entered {
            let _ = crossterm::terminal::disable_raw_mode();
            self.raw_mode_entered = false;
            #[cfg(feature = "tracing")]
            crate::logging::info!("terminal raw mode disabled");
        }
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn db_seq(db: &Database, cap: StrCap, fallback: &[u8]) -> Vec<u8> {
    db.raw_str(cap)
        .filter(|s| !s.is_empty())
        .map_or_else(|| fallback.to_vec(), <[u8]>::to_vec)
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup();
            previous(info);
        }));
    });
}

/// Restore conservatively with fixed sequences. Runs from panic and
/// signal contexts where the session's database-derived sequences are
/// unreachable; the fixed forms cover the xterm family, which is the
/// overwhelmingly common case for a crashed session.
fn best_effort_cleanup() {
    let mut stdout = io::stdout();
    let _ = stdout.write_all(FOCUS_DISABLE);
    let _ = stdout.write_all(PASTE_DISABLE);
    let _ = stdout.write_all(MOUSE_DISABLE);
    let _ = stdout.write_all(CURSOR_SHOW);
    let _ = stdout.write_all(ALT_SCREEN_LEAVE);
    let _ = crossterm::terminal::disable_raw_mode();
    let _ = stdout.flush();
}

#[cfg(unix)]
#[derive(Debug)]
struct SignalGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl SignalGuard {
    fn new(resized: Arc<AtomicBool>) -> io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM, SIGWINCH]).map_err(io::Error::other)?;
        let handle = signals.handle();
        let thread = std::thread::spawn(move || {
            for signal in signals.forever() {
                match signal {
                    SIGWINCH => {
                        resized.store(true, Ordering::Relaxed);
                        #[cfg(feature = "tracing")]
                        crate::logging::debug!("SIGWINCH received");
                    }
                    SIGINT | SIGTERM => {
                        #[cfg(feature = "tracing")]
                        crate::logging::warn!("termination signal received, cleaning up");
                        best_effort_cleanup();
                        std::process::exit(128 + signal);
                    }
                    _ => {}
                }
            }
        });
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

#[cfg(unix)]
impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_terminfo::Source;

    #[test]
    fn session_options_default_is_minimal() {
        let opts = SessionOptions::default();
        assert!(!opts.alternate_screen);
        assert!(!opts.mouse_capture);
        assert!(!opts.bracketed_paste);
        assert!(!opts.focus_events);
        assert!(!opts.hide_cursor);
    }

    #[test]
    fn db_seq_prefers_database_capability() {
        let text = "fancy|fancy terminal,\n\tsmcup=\\E[?47h, rmcup=\\E[?47l,\n";
        let db = Database::load("fancy", Source::Text(text)).unwrap();
        assert_eq!(db_seq(&db, StrCap::EnterCaMode, ALT_SCREEN_ENTER), b"\x1b[?47h");
        assert_eq!(db_seq(&db, StrCap::ExitCaMode, ALT_SCREEN_LEAVE), b"\x1b[?47l");
        // Missing capability falls back to the fixed sequence.
        assert_eq!(db_seq(&db, StrCap::CursorNormal, CURSOR_SHOW), CURSOR_SHOW);
    }

    #[cfg(unix)]
    #[test]
    fn sigwinch_raises_the_resize_flag() {
        use std::time::{Duration, Instant};

        let resized = Arc::new(AtomicBool::new(false));
        let _guard = SignalGuard::new(Arc::clone(&resized)).unwrap();

        signal_hook::low_level::raise(SIGWINCH).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while !resized.load(Ordering::Relaxed) {
            assert!(Instant::now() < deadline, "resize flag never raised");
            std::thread::sleep(Duration::from_millis(5));
        }

        // Consuming the flag re-arms it for the next resize.
        assert!(resized.swap(false, Ordering::Relaxed));
        assert!(!resized.load(Ordering::Relaxed));
    }

    // Tests that actually enter raw mode would fight the test runner's
    // terminal; the mode-sequence plumbing is covered via db_seq, the
    // signal-flag test above, and the TermWriter tests.
}
