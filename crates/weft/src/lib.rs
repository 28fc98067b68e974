#![forbid(unsafe_code)]

//! Weft public facade crate.
//!
//! Re-exports the stable surface of the terminal control and rendering
//! core: the capability database ([`weft_terminfo`]), the terminal I/O
//! controller and input decoder ([`weft_core`]), and the diff renderer
//! ([`weft_render`]).
//!
//! # Quick start
//!
//! ```no_run
//! use weft::prelude::*;
//!
//! fn main() -> weft::Result<()> {
//!     let db = Database::load_or_fallback(
//!         &std::env::var("TERM").unwrap_or_else(|_| "xterm-256color".into()),
//!     );
//!     let mut session = TerminalSession::new(&db, SessionOptions {
//!         alternate_screen: true,
//!         ..Default::default()
//!     })?;
//!     let mut renderer = Renderer::new(&db, CostModel::default())?;
//!
//!     let (width, height) = session.size()?;
//!     let mut grid = Grid::new(width, height);
//!     grid.set_text(0, 0, "hello", Style::new());
//!     renderer.render(&grid, session.writer())?;
//!     Ok(())
//! }
//! ```

use std::fmt;

// --- Capability database re-exports ----------------------------------------

pub use weft_terminfo::{
    BoolCap, CompiledCap, Database, NumCap, Param, ParamError, Source, StrCap, TerminfoError,
};

// --- Core re-exports -------------------------------------------------------

pub use weft_core::{
    Event, InputDecoder, KeyCode, KeyEvent, KeyTable, Modifiers, MouseButton, MouseEncoding,
    MouseEvent, MouseEventKind, PasteEvent, SessionOptions, TermWriter, TerminalSession,
    WriteError,
};

// --- Render re-exports -----------------------------------------------------

pub use weft_render::{
    Attrs, Cell, ChangeRun, Color, CostModel, Grid, GridDiff, RenderCaps, RenderError, Renderer,
    Style,
};

// --- Errors ----------------------------------------------------------------

/// Top-level error type for Weft applications.
#[derive(Debug)]
pub enum Error {
    /// I/O failure during terminal operations.
    Io(std::io::Error),
    /// Capability database failure (missing descriptor, malformed
    /// descriptor, unsupported capability, bad parameter string).
    Terminfo(TerminfoError),
    /// Frame rendering failure.
    Render(RenderError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Terminfo(err) => write!(f, "{err}"),
            Self::Render(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Terminfo(err) => Some(err),
            Self::Render(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<TerminfoError> for Error {
    fn from(err: TerminfoError) -> Self {
        Self::Terminfo(err)
    }
}

impl From<RenderError> for Error {
    fn from(err: RenderError) -> Self {
        Self::Render(err)
    }
}

/// Standard result type for Weft APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude ---------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Attrs, Color, CostModel, Database, Error, Event, Grid, KeyCode, KeyEvent, Modifiers,
        MouseEvent, Renderer, Result, SessionOptions, Style, TerminalSession,
    };

    pub use crate::{core, render, terminfo};
}

pub use weft_core as core;
pub use weft_render as render;
pub use weft_terminfo as terminfo;
