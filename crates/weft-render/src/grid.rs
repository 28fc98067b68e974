#![forbid(unsafe_code)]

//! The cell grid.
//!
//! A grid is a row-major rectangle of [`Cell`]s addressed by
//! `(column, row)`, both 0-indexed. The application populates a grid
//! each frame (via higher layers) and hands it to the renderer.
//!
//! Writes through [`Grid::set_char`] and [`Grid::set_text`] maintain
//! the wide-glyph pairing: a double-width glyph occupies its cell plus a
//! continuation cell, and overwriting either half heals the neighbor to
//! a plain space so no orphaned half-glyph survives.

use unicode_segmentation::UnicodeSegmentation;

use crate::cell::{Cell, Style};

/// A two-dimensional grid of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a grid filled with default cells (styled spaces).
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); usize::from(width) * usize::from(height)],
        }
    }

    /// Grid width in columns.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Grid height in rows.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Dimensions as `(width, height)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> usize {
        usize::from(y) * usize::from(self.width) + usize::from(x)
    }

    /// The cell at `(x, y)`, or `None` when out of bounds.
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if x < self.width && y < self.height {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// The cell at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics when out of bounds; the diff scan guarantees bounds.
    #[inline]
    #[must_use]
    pub(crate) fn cell(&self, x: u16, y: u16) -> &Cell {
        &self.cells[self.index(x, y)]
    }

    /// Store a cell verbatim, without wide-glyph bookkeeping.
    ///
    /// Out-of-bounds writes are ignored.
    pub fn set_raw(&mut self, x: u16, y: u16, cell: Cell) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.cells[idx] = cell;
        }
    }

    /// Place a character at `(x, y)`, maintaining wide-glyph pairing.
    pub fn set_char(&mut self, x: u16, y: u16, c: char, style: Style) {
        let mut buf = [0u8; 4];
        self.set_grapheme(x, y, c.encode_utf8(&mut buf), style);
    }

    /// Place one grapheme cluster at `(x, y)`, maintaining wide-glyph
    /// pairing. A wide glyph whose continuation would fall outside the
    /// grid is replaced by a space.
    pub fn set_grapheme(&mut self, x: u16, y: u16, grapheme: &str, style: Style) {
        if x >= self.width || y >= self.height {
            return;
        }

        let cell = Cell::from_grapheme(grapheme).with_style(style);
        if cell.width() == 2 {
            if x + 1 >= self.width {
                self.replace(x, y, Cell::from_char(' ').with_style(style));
                return;
            }
            self.replace(x, y, cell);
            let idx = self.index(x + 1, y);
            self.cells[idx] = Cell::continuation().with_style(style);
        } else {
            self.replace(x, y, cell);
        }
    }

    /// Write text starting at `(x, y)`, one grapheme cluster per cell
    /// (two for wide clusters). Stops at the right edge. Returns the
    /// column after the last written cell.
    pub fn set_text(&mut self, x: u16, y: u16, text: &str, style: Style) -> u16 {
        let mut col = x;
        for grapheme in text.graphemes(true) {
            if col >= self.width || y >= self.height {
                break;
            }
            let width = Cell::from_grapheme(grapheme).width().max(1);
            self.set_grapheme(col, y, grapheme, style);
            col = col.saturating_add(width);
        }
        col
    }

    /// Overwrite a cell, healing any wide-glyph halves it breaks.
    fn replace(&mut self, x: u16, y: u16, cell: Cell) {
        // Writing over a continuation orphans the glyph to its left.
        if x > 0 && self.cell(x, y).is_continuation() {
            let left = self.index(x - 1, y);
            let style = self.cells[left].style();
            self.cells[left] = Cell::from_char(' ').with_style(style);
        }
        // Writing over a wide glyph orphans its continuation.
        if self.cell(x, y).width() == 2 && x + 1 < self.width {
            let right = self.index(x + 1, y);
            let style = self.cells[right].style();
            self.cells[right] = Cell::from_char(' ').with_style(style);
        }
        let idx = self.index(x, y);
        self.cells[idx] = cell;
    }

    /// Reset every cell to a styled space.
    pub fn fill(&mut self, style: Style) {
        let blank = Cell::from_char(' ').with_style(style);
        self.cells.fill(blank);
    }

    /// Reset every cell to the default cell.
    pub fn clear(&mut self) {
        self.fill(Style::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Attrs, Color};

    #[test]
    fn new_grid_is_blank() {
        let grid = Grid::new(4, 3);
        assert_eq!(grid.dimensions(), (4, 3));
        assert_eq!(grid.get(3, 2).unwrap().symbol(), " ");
        assert!(grid.get(4, 0).is_none());
        assert!(grid.get(0, 3).is_none());
    }

    #[test]
    fn set_char_and_get() {
        let mut grid = Grid::new(10, 5);
        grid.set_char(2, 1, 'x', Style::new().fg(Color::Indexed(1)));
        let cell = grid.get(2, 1).unwrap();
        assert_eq!(cell.symbol(), "x");
        assert_eq!(cell.fg, Color::Indexed(1));
    }

    #[test]
    fn wide_glyph_gets_continuation() {
        let mut grid = Grid::new(10, 1);
        grid.set_char(3, 0, '中', Style::new());
        assert_eq!(grid.get(3, 0).unwrap().width(), 2);
        assert!(grid.get(4, 0).unwrap().is_continuation());
    }

    #[test]
    fn overwriting_wide_glyph_heals_continuation() {
        let mut grid = Grid::new(10, 1);
        grid.set_char(3, 0, '中', Style::new());
        grid.set_char(3, 0, 'a', Style::new());
        assert_eq!(grid.get(3, 0).unwrap().symbol(), "a");
        assert_eq!(grid.get(4, 0).unwrap().symbol(), " ");
    }

    #[test]
    fn overwriting_continuation_heals_glyph() {
        let mut grid = Grid::new(10, 1);
        grid.set_char(3, 0, '中', Style::new());
        grid.set_char(4, 0, 'b', Style::new());
        assert_eq!(grid.get(3, 0).unwrap().symbol(), " ");
        assert_eq!(grid.get(4, 0).unwrap().symbol(), "b");
    }

    #[test]
    fn wide_glyph_at_right_edge_becomes_space() {
        let mut grid = Grid::new(4, 1);
        grid.set_char(3, 0, '中', Style::new());
        assert_eq!(grid.get(3, 0).unwrap().symbol(), " ");
    }

    #[test]
    fn set_text_advances_by_display_width() {
        let mut grid = Grid::new(10, 1);
        let next = grid.set_text(0, 0, "a中b", Style::new());
        assert_eq!(next, 4);
        assert_eq!(grid.get(0, 0).unwrap().symbol(), "a");
        assert_eq!(grid.get(1, 0).unwrap().symbol(), "中");
        assert!(grid.get(2, 0).unwrap().is_continuation());
        assert_eq!(grid.get(3, 0).unwrap().symbol(), "b");
    }

    #[test]
    fn set_text_clips_at_right_edge() {
        let mut grid = Grid::new(3, 1);
        let next = grid.set_text(0, 0, "abcdef", Style::new());
        assert_eq!(next, 3);
        assert_eq!(grid.get(2, 0).unwrap().symbol(), "c");
    }

    #[test]
    fn set_text_keeps_combining_cluster_together() {
        let mut grid = Grid::new(5, 1);
        grid.set_text(0, 0, "e\u{301}x", Style::new());
        assert_eq!(grid.get(0, 0).unwrap().symbol(), "e\u{301}");
        assert_eq!(grid.get(1, 0).unwrap().symbol(), "x");
    }

    #[test]
    fn fill_applies_style() {
        let mut grid = Grid::new(2, 2);
        grid.fill(Style::new().attrs(Attrs::INVERSE));
        assert!(grid.get(1, 1).unwrap().attrs.contains(Attrs::INVERSE));
        grid.clear();
        assert_eq!(grid.get(1, 1).unwrap(), &Cell::default());
    }
}
