#![forbid(unsafe_code)]

//! Frame rendering: cell grids, diff computation, and capability-driven
//! terminal output.
//!
//! The application populates a [`grid::Grid`] each frame and hands it
//! to a [`renderer::Renderer`], which diffs it against the previous
//! frame and emits the minimal escape/character stream through a
//! [`weft_core::TermWriter`]. All escape sequences come from a
//! [`caps::RenderCaps`] compiled out of the terminal's capability
//! database, with fixed ANSI fallbacks for under-reporting terminals.

pub mod caps;
pub mod cell;
pub mod diff;
pub mod grid;
pub mod renderer;

pub use caps::RenderCaps;
pub use cell::{Attrs, Cell, Color, Style};
pub use diff::{ChangeRun, GridDiff};
pub use grid::Grid;
pub use renderer::{CostModel, RenderError, Renderer};
