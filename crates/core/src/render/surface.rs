//! Drawing targets for the render queue.

use crate::render::queue::{ColorId, TextAttributes};

/// A grid of character cells the render queue can draw onto.
///
/// Terminal adapters implement this over their screen buffer; tests and the
/// headless demo use [`GlyphBuffer`].
pub trait DrawSurface {
    /// `(width, height)` in cells.
    fn size(&self) -> (u16, u16);

    /// Write one cell. Returns `false` if the surface refused the write.
    fn put(&mut self, x: u16, y: u16, glyph: char, color: ColorId, attrs: TextAttributes) -> bool;
}

/// One character cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub glyph: char,
    pub color: ColorId,
    pub attrs: TextAttributes,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            glyph: ' ',
            color: ColorId::WHITE,
            attrs: TextAttributes::empty(),
        }
    }
}

/// In-memory cell grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl GlyphBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); usize::from(width) * usize::from(height)],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Reset every cell to a blank space.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Glyphs of row `y` as a string; empty if `y` is out of range.
    pub fn row_string(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let start = usize::from(y) * usize::from(self.width);
        self.cells[start..start + usize::from(self.width)]
            .iter()
            .map(|c| c.glyph)
            .collect()
    }

    /// Every row, top to bottom.
    pub fn lines(&self) -> Vec<String> {
        (0..self.height).map(|y| self.row_string(y)).collect()
    }

    /// Cells holding something other than a blank space.
    pub fn filled_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.glyph != ' ').count()
    }
}

impl DrawSurface for GlyphBuffer {
    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn put(&mut self, x: u16, y: u16, glyph: char, color: ColorId, attrs: TextAttributes) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.cells[i] = Cell {
                    glyph,
                    color,
                    attrs,
                };
                true
            }
            None => false,
        }
    }
}
