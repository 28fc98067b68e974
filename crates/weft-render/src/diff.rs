#![forbid(unsafe_code)]

//! Diff computation between grids.
//!
//! A row-major scan compares the previous and current grids cell by
//! cell (grapheme, colors, and attributes all participate) and coalesces
//! adjacent changed columns into per-row runs. Runs are what the
//! renderer positions the cursor for; unchanged columns between and
//! after runs produce no output at all.

use crate::grid::Grid;

/// A contiguous run of changed cells on a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRun {
    /// Row index.
    pub y: u16,
    /// Start column (inclusive).
    pub x0: u16,
    /// End column (inclusive).
    pub x1: u16,
}

impl ChangeRun {
    /// Create a new change run.
    #[inline]
    #[must_use]
    pub const fn new(y: u16, x0: u16, x1: u16) -> Self {
        debug_assert!(x0 <= x1);
        Self { y, x0, x1 }
    }

    /// Number of cells in this run.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> u16 {
        self.x1 - self.x0 + 1
    }

    /// True when the run covers no cells (never produced by `compute`).
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.x1 < self.x0
    }
}

/// The diff between two grids, as coalesced per-row runs.
#[derive(Debug, Clone, Default)]
pub struct GridDiff {
    runs: Vec<ChangeRun>,
    changed_cells: usize,
}

impl GridDiff {
    /// Compare two grids of identical dimensions.
    ///
    /// # Panics
    ///
    /// Debug-asserts that dimensions match; the renderer resizes its
    /// previous grid before diffing.
    #[must_use]
    pub fn compute(old: &Grid, new: &Grid) -> Self {
        #[cfg(feature = "tracing")]
        let _span =
            tracing::debug_span!("diff_compute", width = new.width(), height = new.height());
        #[cfg(feature = "tracing")]
        let _guard = _span.enter();

        debug_assert_eq!(old.dimensions(), new.dimensions(), "grid dimensions must match");

        let mut runs = Vec::new();
        let mut changed_cells = 0;

        // Row-major scan: cells are stored row by row, so this walks
        // memory sequentially.
        for y in 0..new.height() {
            let mut start: Option<u16> = None;
            for x in 0..new.width() {
                if old.cell(x, y) == new.cell(x, y) {
                    if let Some(x0) = start.take() {
                        runs.push(ChangeRun::new(y, x0, x - 1));
                    }
                } else {
                    changed_cells += 1;
                    if start.is_none() {
                        start = Some(x);
                    }
                }
            }
            if let Some(x0) = start {
                runs.push(ChangeRun::new(y, x0, new.width() - 1));
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(runs = runs.len(), cells = changed_cells, "diff computed");

        Self {
            runs,
            changed_cells,
        }
    }

    /// A diff marking every cell changed: one full-width run per row.
    /// Used for the forced repaint after a resize.
    #[must_use]
    pub fn full(width: u16, height: u16) -> Self {
        if width == 0 || height == 0 {
            return Self::default();
        }
        Self {
            runs: (0..height).map(|y| ChangeRun::new(y, 0, width - 1)).collect(),
            changed_cells: usize::from(width) * usize::from(height),
        }
    }

    /// The coalesced per-row runs, in row-major order.
    #[inline]
    #[must_use]
    pub fn runs(&self) -> &[ChangeRun] {
        &self.runs
    }

    /// Number of changed cells.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.changed_cells
    }

    /// True when no cells changed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed_cells == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, Color, Style};

    #[test]
    fn identical_grids_empty_diff() {
        let a = Grid::new(10, 10);
        let b = Grid::new(10, 10);
        let diff = GridDiff::compute(&a, &b);
        assert!(diff.is_empty());
        assert!(diff.runs().is_empty());
    }

    #[test]
    fn single_cell_change() {
        let old = Grid::new(10, 10);
        let mut new = Grid::new(10, 10);
        new.set_raw(5, 5, Cell::from_char('X'));

        let diff = GridDiff::compute(&old, &new);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.runs(), &[ChangeRun::new(5, 5, 5)]);
    }

    #[test]
    fn adjacent_cells_coalesce() {
        let old = Grid::new(10, 10);
        let mut new = Grid::new(10, 10);
        new.set_raw(3, 5, Cell::from_char('A'));
        new.set_raw(4, 5, Cell::from_char('B'));
        new.set_raw(5, 5, Cell::from_char('C'));

        let diff = GridDiff::compute(&old, &new);
        let runs = diff.runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0], ChangeRun::new(5, 3, 5));
        assert_eq!(runs[0].len(), 3);
    }

    #[test]
    fn gap_splits_runs() {
        let old = Grid::new(10, 1);
        let mut new = Grid::new(10, 1);
        new.set_raw(0, 0, Cell::from_char('A'));
        new.set_raw(1, 0, Cell::from_char('B'));
        new.set_raw(3, 0, Cell::from_char('C'));

        let diff = GridDiff::compute(&old, &new);
        assert_eq!(
            diff.runs(),
            &[ChangeRun::new(0, 0, 1), ChangeRun::new(0, 3, 3)]
        );
    }

    #[test]
    fn run_reaching_right_edge_closes() {
        let old = Grid::new(4, 1);
        let mut new = Grid::new(4, 1);
        new.set_raw(2, 0, Cell::from_char('X'));
        new.set_raw(3, 0, Cell::from_char('Y'));

        let diff = GridDiff::compute(&old, &new);
        assert_eq!(diff.runs(), &[ChangeRun::new(0, 2, 3)]);
    }

    #[test]
    fn style_only_change_detected() {
        let old = Grid::new(10, 10);
        let mut new = Grid::new(10, 10);
        // Same glyph, different color.
        new.set_raw(5, 5, Cell::from_char(' ').with_style(Style::new().fg(Color::Indexed(1))));

        let diff = GridDiff::compute(&old, &new);
        assert_eq!(diff.len(), 1);
    }

    #[test]
    fn runs_preserve_row_major_order() {
        let old = Grid::new(10, 10);
        let mut new = Grid::new(10, 10);
        new.set_raw(0, 5, Cell::from_char('D'));
        new.set_raw(5, 2, Cell::from_char('C'));
        new.set_raw(0, 0, Cell::from_char('A'));

        let diff = GridDiff::compute(&old, &new);
        let rows: Vec<u16> = diff.runs().iter().map(|r| r.y).collect();
        assert_eq!(rows, vec![0, 2, 5]);
    }

    #[test]
    fn full_diff_covers_every_row() {
        let diff = GridDiff::full(80, 24);
        assert_eq!(diff.runs().len(), 24);
        assert_eq!(diff.len(), 80 * 24);
        assert_eq!(diff.runs()[23], ChangeRun::new(23, 0, 79));

        assert!(GridDiff::full(0, 10).is_empty());
    }
}
