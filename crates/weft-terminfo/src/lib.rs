#![forbid(unsafe_code)]

//! Terminfo/termcap capability database and escape-sequence compiler.
//!
//! This crate answers one question: for a given terminal type, what byte
//! sequence performs a given operation? It parses binary terminfo and
//! termcap-style text descriptors into an immutable capability table
//! ([`Database`]) and compiles parameterized string capabilities into
//! callable generators ([`CompiledCap`]).
//!
//! A compiled-in xterm-family fallback guarantees a usable table even
//! when no descriptor file exists for the running terminal.

mod builtin;
pub mod db;
pub mod names;
pub mod params;

pub use db::{Database, Source, TerminfoError};
pub use names::{BoolCap, NumCap, StrCap};
pub use params::{CompiledCap, Param, ParamError};
