#![forbid(unsafe_code)]

//! Frame renderer: diff-driven terminal output.
//!
//! The renderer owns the previous frame. Each cycle the caller hands it
//! a fully-populated current grid; the renderer diffs, emits the
//! cheapest sequence of cursor moves, style changes, and character data
//! into a [`TermWriter`], and flushes once. On success the current grid
//! becomes the new previous frame; on a write failure the previous
//! frame is left untouched so a retried render recomputes the same
//! diff.
//!
//! # Emission strategy
//!
//! Per change run, the renderer takes the cheaper of:
//!
//! 1. absolute positioning (`cup`) to the run start, or
//! 2. relative movement from the tracked cursor position: `cuf1`
//!    repeats on the same row, or CR plus `cud1` repeats to a later row.
//!
//! [`CostModel::max_relative_skip`] bounds how far relative catch-up is
//! considered; it is a per-terminal-class tuning value, not an
//! architectural constant.
//!
//! Styles are batched: a reset-and-reapply is emitted only when a
//! cell's style differs from the last emitted style, never per cell.

use std::fmt;
use std::io::Write;

use weft_core::{TermWriter, WriteError};
use weft_terminfo::{Database, TerminfoError};

use crate::caps::RenderCaps;
use crate::cell::Style;
use crate::diff::GridDiff;
use crate::grid::Grid;

/// Movement cost tuning.
#[derive(Debug, Clone, Copy)]
pub struct CostModel {
    /// Maximum columns (or rows) of relative catch-up tolerated before
    /// absolute positioning is preferred outright.
    pub max_relative_skip: u16,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            max_relative_skip: 8,
        }
    }
}

/// Frame rendering error.
#[derive(Debug)]
pub enum RenderError {
    /// A capability needed for rendering failed to compile.
    Capability(TerminfoError),
    /// The output stream failed, retryably or fatally. The previous
    /// frame is unchanged either way; a retried render recomputes the
    /// same diff.
    Write(WriteError),
}

impl RenderError {
    /// True when a retried render may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Write(err) if err.is_retryable())
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capability(err) => write!(f, "render capability error: {err}"),
            Self::Write(err) => write!(f, "terminal write failed: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Capability(err) => Some(err),
            Self::Write(err) => Some(err),
        }
    }
}

impl From<TerminfoError> for RenderError {
    fn from(err: TerminfoError) -> Self {
        Self::Capability(err)
    }
}

impl From<WriteError> for RenderError {
    fn from(err: WriteError) -> Self {
        Self::Write(err)
    }
}

/// Diff-driven frame renderer.
#[derive(Debug)]
pub struct Renderer {
    caps: RenderCaps,
    cost: CostModel,
    /// Previous frame. `None` forces a full repaint (startup, resize,
    /// explicit invalidation).
    prev: Option<Grid>,
    /// Tracked cursor position, `None` when unknown.
    cursor: Option<(u16, u16)>,
    /// Last emitted style, `None` when unknown.
    last_style: Option<Style>,
}

impl Renderer {
    /// Build a renderer from a capability database.
    ///
    /// # Errors
    ///
    /// Fails when a required capability's parameter string does not
    /// compile (surfaced here, at load time, not mid-render).
    pub fn new(db: &Database, cost: CostModel) -> Result<Self, RenderError> {
        Ok(Self::with_caps(RenderCaps::from_database(db)?, cost))
    }

    /// Build a renderer from an already-constructed capability set.
    #[must_use]
    pub fn with_caps(caps: RenderCaps, cost: CostModel) -> Self {
        Self {
            caps,
            cost,
            prev: None,
            cursor: None,
            last_style: None,
        }
    }

    /// The renderer's capability set.
    #[must_use]
    pub fn caps(&self) -> &RenderCaps {
        &self.caps
    }

    /// Drop the previous frame, forcing the next render to repaint
    /// every cell. Use when the terminal content is unknown (resize,
    /// external writes, suspend/resume).
    pub fn invalidate(&mut self) {
        self.prev = None;
        self.cursor = None;
        self.last_style = None;
    }

    /// Render a frame, emitting the minimal update into `out` and
    /// flushing it once.
    ///
    /// Returns the number of bytes written. A dimension change against
    /// the previous frame repaints everything.
    ///
    /// # Errors
    ///
    /// [`RenderError::Write`] when the flush fails. The previous frame
    /// and the staged output are discarded consistently: a retry with
    /// the same grid recomputes and re-emits the same diff.
    pub fn render<W: Write>(
        &mut self,
        current: &Grid,
        out: &mut TermWriter<W>,
    ) -> Result<usize, RenderError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "render",
            width = current.width(),
            height = current.height()
        );
        #[cfg(feature = "tracing")]
        let _guard = _span.enter();

        let full_repaint = !matches!(
            &self.prev,
            Some(prev) if prev.dimensions() == current.dimensions()
        );
        let diff = if full_repaint {
            GridDiff::full(current.width(), current.height())
        } else {
            // Unwrap-free: full_repaint is false only when prev is Some.
            match &self.prev {
                Some(prev) => GridDiff::compute(prev, current),
                None => GridDiff::full(current.width(), current.height()),
            }
        };

        if diff.is_empty() {
            self.prev = Some(current.clone());
            return Ok(0);
        }

        let mut buf = Vec::with_capacity(diff.len() * 4);
        if full_repaint {
            buf.extend_from_slice(&self.caps.clear);
            // Not every clear capability homes the cursor.
            self.cursor = None;
            self.last_style = None;
        }

        for run in diff.runs() {
            // A run starting on the trailing half of a wide glyph must
            // rewrite the glyph itself.
            let x0 = if run.x0 > 0 && current.cell(run.x0, run.y).is_continuation() {
                run.x0 - 1
            } else {
                run.x0
            };
            self.emit_move(&mut buf, x0, run.y);

            let mut x = x0;
            for col in x0..=run.x1 {
                let cell = current.cell(col, run.y);
                if cell.is_continuation() {
                    continue;
                }
                self.emit_style(&mut buf, cell.style());
                buf.extend_from_slice(cell.symbol().as_bytes());
                x = col + cell.width();
            }

            if x >= current.width() {
                // Writing into the last column leaves the cursor in the
                // terminal's wrap-pending state; stop trusting it.
                self.cursor = None;
            } else {
                self.cursor = Some((x, run.y));
            }
        }

        // Leave a clean attribute state between frames.
        buf.extend_from_slice(&self.caps.sgr0);
        self.last_style = None;

        out.write(&buf);
        match out.flush() {
            Ok(written) => {
                self.prev = Some(current.clone());
                #[cfg(feature = "tracing")]
                tracing::debug!(bytes = written, cells = diff.len(), "frame rendered");
                Ok(written)
            }
            Err(err) => {
                // Discard staged bytes and forget terminal state; the
                // retried render recomputes the identical diff.
                out.discard();
                self.cursor = None;
                self.last_style = None;
                Err(RenderError::Write(err))
            }
        }
    }

    fn emit_move(&mut self, buf: &mut Vec<u8>, x: u16, y: u16) {
        if self.cursor == Some((x, y)) {
            return;
        }
        let absolute = self.caps.cursor_address(y, x);
        if let Some((cx, cy)) = self.cursor
            && let Some(relative) = self.relative_move(cx, cy, x, y)
            && relative.len() < absolute.len()
        {
            buf.extend_from_slice(&relative);
        } else {
            buf.extend_from_slice(&absolute);
        }
        self.cursor = Some((x, y));
    }

    /// Relative path from `(cx, cy)` to `(x, y)`, or `None` when out of
    /// the cost model's reach (backwards, or too far).
    fn relative_move(&self, cx: u16, cy: u16, x: u16, y: u16) -> Option<Vec<u8>> {
        let limit = self.cost.max_relative_skip;
        if y == cy && x >= cx {
            let dx = x - cx;
            if dx > limit {
                return None;
            }
            let mut seq = Vec::with_capacity(self.caps.cuf1.len() * usize::from(dx));
            for _ in 0..dx {
                seq.extend_from_slice(&self.caps.cuf1);
            }
            Some(seq)
        } else if y > cy {
            let dy = y - cy;
            if dy > limit || x > limit {
                return None;
            }
            let mut seq = Vec::new();
            seq.extend_from_slice(&self.caps.cr);
            for _ in 0..dy {
                seq.extend_from_slice(&self.caps.cud1);
            }
            for _ in 0..x {
                seq.extend_from_slice(&self.caps.cuf1);
            }
            Some(seq)
        } else {
            None
        }
    }

    fn emit_style(&mut self, buf: &mut Vec<u8>, style: Style) {
        if self.last_style == Some(style) {
            return;
        }
        // Reset and reapply: simpler and more robust than incremental
        // attribute updates across heterogeneous terminals.
        buf.extend_from_slice(&self.caps.sgr0);
        if let Some(seq) = self.caps.set_foreground(style.fg) {
            buf.extend_from_slice(&seq);
        }
        if let Some(seq) = self.caps.set_background(style.bg) {
            buf.extend_from_slice(&seq);
        }
        self.caps.push_attrs(style.attrs, buf);
        self.last_style = Some(style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Attrs, Color};
    use std::io;
    use weft_terminfo::Source;

    // Deliberately simple sequences so expected output is predictable.
    const MINI_DB: &str = "mini|minimal test terminal,\n\
        \tcolors#8,\n\
        \tcup=\\E[%i%p1%d;%p2%dH, setaf=\\E[3%p1%dm, setab=\\E[4%p1%dm,\n\
        \tsgr0=\\E[0m, cuf1=\\E[C, cud1=\\n, cr=\\r, clear=\\E[2J,\n\
        \tbold=\\E[1m, smul=\\E[4m, blink=\\E[5m, rev=\\E[7m, invis=\\E[8m,\n";

    fn mini_renderer() -> Renderer {
        let db = Database::load("mini", Source::Text(MINI_DB)).unwrap();
        Renderer::new(&db, CostModel::default()).unwrap()
    }

    fn render_to_vec(renderer: &mut Renderer, grid: &Grid) -> Vec<u8> {
        let mut out = TermWriter::new(Vec::new());
        renderer.render(grid, &mut out).unwrap();
        out.into_inner()
    }

    #[test]
    fn first_render_is_full_repaint() {
        let mut renderer = mini_renderer();
        let mut grid = Grid::new(4, 2);
        grid.set_char(0, 0, 'A', Style::new());

        let bytes = render_to_vec(&mut renderer, &grid);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("\x1b[2J"));
        assert!(text.contains('A'));
    }

    #[test]
    fn rendering_same_grid_twice_emits_nothing() {
        let mut renderer = mini_renderer();
        let mut grid = Grid::new(8, 3);
        grid.set_text(1, 1, "hi", Style::new().fg(Color::Indexed(2)));

        let first = render_to_vec(&mut renderer, &grid);
        assert!(!first.is_empty());
        let second = render_to_vec(&mut renderer, &grid);
        assert!(second.is_empty());
    }

    #[test]
    fn single_cell_change_touches_only_that_cell() {
        let mut renderer = mini_renderer();
        let base = Grid::new(20, 10);
        render_to_vec(&mut renderer, &base);

        let mut next = base.clone();
        next.set_char(10, 5, 'X', Style::new());
        let bytes = render_to_vec(&mut renderer, &next);

        // cup to (row 6, col 11 on the wire), style reset, the cell,
        // trailing reset. Nothing else.
        assert_eq!(bytes, b"\x1b[6;11H\x1b[0mX\x1b[0m");
    }

    #[test]
    fn nearby_change_uses_relative_movement() {
        let mut renderer = mini_renderer();
        let base = Grid::new(20, 2);
        render_to_vec(&mut renderer, &base);

        let mut next = base.clone();
        next.set_char(2, 0, 'a', Style::new());
        next.set_char(4, 0, 'b', Style::new());
        let bytes = render_to_vec(&mut renderer, &next);
        let text = String::from_utf8(bytes).unwrap();

        // After writing 'a' the cursor is at column 3; one cuf1 (3
        // bytes) beats cup (6 bytes) to reach column 4.
        assert!(text.contains("\x1b[C"), "expected relative move in {text:?}");
        assert!(!text.contains("\x1b[1;5H"), "absolute move not expected in {text:?}");
    }

    #[test]
    fn distant_change_uses_absolute_movement() {
        let mut renderer = mini_renderer();
        let base = Grid::new(40, 10);
        render_to_vec(&mut renderer, &base);

        let mut next = base.clone();
        next.set_char(0, 0, 'a', Style::new());
        next.set_char(30, 9, 'b', Style::new());
        let bytes = render_to_vec(&mut renderer, &next);
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains("\x1b[10;31H"), "expected cup in {text:?}");
    }

    #[test]
    fn cost_model_bounds_relative_catchup() {
        let db = Database::load("mini", Source::Text(MINI_DB)).unwrap();
        let mut renderer =
            Renderer::new(&db, CostModel { max_relative_skip: 1 }).unwrap();
        let base = Grid::new(20, 2);
        render_to_vec(&mut renderer, &base);

        let mut next = base.clone();
        next.set_char(0, 0, 'a', Style::new());
        next.set_char(5, 0, 'b', Style::new());
        let bytes = render_to_vec(&mut renderer, &next);
        let text = String::from_utf8(bytes).unwrap();

        // Gap of 4 exceeds the skip limit of 1: absolute positioning.
        assert!(text.contains("\x1b[1;6H"), "expected cup in {text:?}");
    }

    #[test]
    fn resize_forces_full_repaint() {
        let mut renderer = mini_renderer();
        let small = Grid::new(8, 2);
        render_to_vec(&mut renderer, &small);
        assert!(render_to_vec(&mut renderer, &small).is_empty());

        // Same content, new dimensions: everything repaints.
        let big = Grid::new(10, 3);
        let bytes = render_to_vec(&mut renderer, &big);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("\x1b[2J"));
        // Every row gets touched: rows 2 and 3 need explicit positioning.
        assert!(text.contains("\x1b[2;1H") || text.contains('\n'));

        // And the new dimensions are now the baseline.
        assert!(render_to_vec(&mut renderer, &big).is_empty());
    }

    #[test]
    fn style_changes_are_batched_within_a_run() {
        let mut renderer = mini_renderer();
        let base = Grid::new(20, 1);
        render_to_vec(&mut renderer, &base);

        let style = Style::new().fg(Color::Indexed(1)).attrs(Attrs::BOLD);
        let mut next = base.clone();
        next.set_text(0, 0, "abc", style);
        let bytes = render_to_vec(&mut renderer, &next);
        let text = String::from_utf8(bytes).unwrap();

        // One style application for three cells with identical style.
        assert_eq!(text.matches("\x1b[31m").count(), 1, "in {text:?}");
        assert_eq!(text.matches("\x1b[1m").count(), 1, "in {text:?}");
    }

    #[test]
    fn wide_glyph_emitted_once() {
        let mut renderer = mini_renderer();
        let base = Grid::new(10, 1);
        render_to_vec(&mut renderer, &base);

        let mut next = base.clone();
        next.set_char(2, 0, '中', Style::new());
        let bytes = render_to_vec(&mut renderer, &next);
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.matches('中').count(), 1);
    }

    #[test]
    fn run_starting_on_continuation_rewrites_the_glyph() {
        let mut renderer = mini_renderer();
        let mut base = Grid::new(10, 1);
        base.set_char(2, 0, '中', Style::new());
        render_to_vec(&mut renderer, &base);

        // Overwrite only the continuation half; the glyph must be
        // re-emitted, not left as a half-drawn artifact.
        let mut next = base.clone();
        next.set_char(3, 0, 'x', Style::new());
        let bytes = render_to_vec(&mut renderer, &next);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains(' '), "healed glyph cell in {text:?}");
        assert!(text.contains('x'));
    }

    #[test]
    fn failed_write_keeps_previous_frame_for_retry() {
        struct FailingWriter {
            fail: bool,
        }
        impl Write for FailingWriter {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                if self.fail {
                    Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
                } else {
                    Ok(buf.len())
                }
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut renderer = mini_renderer();
        let base = Grid::new(10, 2);
        render_to_vec(&mut renderer, &base);

        let mut next = base.clone();
        next.set_char(4, 1, 'Q', Style::new());

        let mut out = TermWriter::new(FailingWriter { fail: true });
        assert!(matches!(
            renderer.render(&next, &mut out),
            Err(RenderError::Write(_))
        ));
        assert_eq!(out.buffered_len(), 0);

        // Previous frame unchanged: the retry re-emits the same change.
        let mut out = TermWriter::new(Vec::new());
        let written = renderer.render(&next, &mut out).unwrap();
        assert!(written > 0);
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.contains('Q'));
        assert!(text.contains("\x1b[2;5H"));
    }

    #[test]
    fn invalidate_forces_repaint() {
        let mut renderer = mini_renderer();
        let grid = Grid::new(6, 2);
        render_to_vec(&mut renderer, &grid);
        assert!(render_to_vec(&mut renderer, &grid).is_empty());

        renderer.invalidate();
        let bytes = render_to_vec(&mut renderer, &grid);
        assert!(!bytes.is_empty());
    }

    #[test]
    fn render_reports_byte_count() {
        let mut renderer = mini_renderer();
        let mut grid = Grid::new(6, 1);
        grid.set_char(0, 0, 'z', Style::new());

        let mut out = TermWriter::new(Vec::new());
        let written = renderer.render(&grid, &mut out).unwrap();
        assert_eq!(written as u64, out.total_written());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_grid() -> impl Strategy<Value = Grid> {
            (1u16..8, 1u16..4).prop_flat_map(|(w, h)| {
                let cells = proptest::collection::vec(
                    (
                        proptest::char::range('a', 'z'),
                        0u8..8,
                        proptest::bool::ANY,
                    ),
                    (w as usize) * (h as usize),
                );
                cells.prop_map(move |cells| {
                    let mut grid = Grid::new(w, h);
                    for (i, (c, color, bold)) in cells.into_iter().enumerate() {
                        let style = Style::new().fg(Color::Indexed(color)).attrs(if bold {
                            Attrs::BOLD
                        } else {
                            Attrs::empty()
                        });
                        let x = (i as u16) % w;
                        let y = (i as u16) / w;
                        grid.set_char(x, y, c, style);
                    }
                    grid
                })
            })
        }

        proptest! {
            /// Rendering the same grid twice is always a no-op.
            #[test]
            fn render_is_idempotent(grid in arb_grid()) {
                let mut renderer = mini_renderer();
                let _ = render_to_vec(&mut renderer, &grid);
                let second = render_to_vec(&mut renderer, &grid);
                prop_assert!(second.is_empty());
            }

            /// Two fresh renderers produce identical bytes for the same
            /// frame sequence.
            #[test]
            fn render_is_deterministic(a in arb_grid(), b in arb_grid()) {
                let mut r1 = mini_renderer();
                let mut r2 = mini_renderer();
                prop_assert_eq!(
                    render_to_vec(&mut r1, &a),
                    render_to_vec(&mut r2, &a)
                );
                prop_assert_eq!(
                    render_to_vec(&mut r1, &b),
                    render_to_vec(&mut r2, &b)
                );
            }
        }
    }
}
