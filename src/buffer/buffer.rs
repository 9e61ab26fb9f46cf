//! Buffer: A grid of cells representing one frame of the terminal screen.
//!
//! The buffer uses contiguous memory allocation for cache efficiency.
//! Cells are stored in row-major order.
//!
//! Two invariants hold after every public mutation:
//! - every coordinate in `[0, width) × [0, height)` holds exactly one cell
//! - a wide lead cell is always followed by its continuation cell, and a
//!   continuation cell is always preceded by its lead

use super::cell::{grapheme_width, printable, Cell, Style};
use crate::layout::Rect;
use std::borrow::Cow;
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

/// A grid of cells representing the terminal screen.
///
/// Access is in row-major order: `index = y * width + x`. Writes outside the
/// grid are silently dropped, since widgets routinely compute areas that
/// overhang the terminal by a column or two.
///
/// # Overflow Storage
///
/// Graphemes longer than 4 bytes are stored in a separate `HashMap`. The cell
/// contains an index into this table when the `OVERFLOW` flag is set. Each
/// distinct grapheme is stored once, however often it is written.
#[derive(Clone)]
pub struct Buffer {
    /// Contiguous cell storage (row-major order).
    cells: Vec<Cell>,
    /// Width in columns.
    width: u16,
    /// Height in rows.
    height: u16,
    /// Overflow storage for long graphemes.
    overflow: HashMap<u32, String>,
    /// Reverse of `overflow`.
    interned: HashMap<String, u32>,
    /// Next overflow index to assign.
    next_overflow_index: u32,
}

impl Buffer {
    /// Create a new buffer with the given dimensions.
    ///
    /// All cells are blank. Zero-sized buffers are allowed and simply hold
    /// no cells.
    pub fn new(width: u16, height: u16) -> Self {
        let size = (width as usize) * (height as usize);
        Self {
            cells: vec![Cell::EMPTY; size],
            width,
            height,
            overflow: HashMap::new(),
            interned: HashMap::new(),
            next_overflow_index: 0,
        }
    }

    /// Create a blank buffer; every frame starts from one of these.
    #[inline]
    pub fn blank(width: u16, height: u16) -> Self {
        Self::new(width, height)
    }

    /// Get the buffer width.
    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Get the buffer height.
    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// The full area covered by this buffer, anchored at the origin.
    #[inline]
    pub const fn area(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Get the total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the buffer holds no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Get a reference to the underlying cell slice.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Convert (x, y) coordinates to a linear index.
    ///
    /// Returns `None` if coordinates are out of bounds.
    #[inline]
    pub fn index_of(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some((y as usize) * (self.width as usize) + (x as usize))
        } else {
            None
        }
    }

    /// Get a reference to a cell at (x, y).
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index_of(x, y).map(|i| &self.cells[i])
    }

    /// Resolve the text of a cell that belongs to this buffer.
    ///
    /// Continuation cells resolve to the empty string. An overflow index
    /// that is missing from the table resolves to U+FFFD.
    pub fn symbol<'a>(&'a self, cell: &'a Cell) -> &'a str {
        match cell.overflow_index() {
            Some(idx) => self.overflow.get(&idx).map_or("\u{fffd}", String::as_str),
            None => cell.grapheme().unwrap_or(""),
        }
    }

    /// Get the grapheme at (x, y), including overflow lookup.
    ///
    /// Returns `None` if out of bounds or if it's a continuation cell.
    pub fn get_grapheme(&self, x: u16, y: u16) -> Option<&str> {
        let cell = self.get(x, y)?;
        if cell.is_wide_continuation() {
            return None;
        }
        Some(self.symbol(cell))
    }

    /// Set a cell at (x, y).
    ///
    /// A wide cell also claims (x+1, y); if that column is off the grid the
    /// character cannot be shown and a blank with the same style is written
    /// instead. Any wide character partly overwritten by this call is blanked
    /// so no half of it is left behind. Continuation cells are managed by the
    /// buffer and cannot be written directly.
    ///
    /// Overflow cells are only meaningful for the buffer that interned them;
    /// use [`Buffer::set_grapheme`] to write arbitrary text.
    ///
    /// Returns `false` if nothing was written.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) -> bool {
        let Some(idx) = self.index_of(x, y) else {
            return false;
        };
        if cell.is_wide_continuation() {
            return false;
        }

        self.detach_wide(x, y);
        if cell.is_wide() {
            if x + 1 >= self.width {
                self.cells[idx] = Cell::EMPTY.with_style(cell.style());
                return true;
            }
            self.detach_wide(x + 1, y);
            self.cells[idx + 1] = Cell::wide_continuation().with_style(cell.style());
        }
        self.cells[idx] = cell;
        true
    }

    /// Blank the other half of any wide character touching (x, y).
    fn detach_wide(&mut self, x: u16, y: u16) {
        let Some(idx) = self.index_of(x, y) else {
            return;
        };
        let cell = self.cells[idx];
        if cell.is_wide_continuation() && x > 0 {
            let lead = self.cells[idx - 1];
            self.cells[idx - 1] = Cell::EMPTY.with_style(lead.style());
        } else if cell.is_wide() && x + 1 < self.width {
            self.cells[idx + 1] = Cell::EMPTY.with_style(cell.style());
        }
    }

    /// Set a grapheme at (x, y), handling overflow automatically.
    ///
    /// Zero-width clusters are given one column so they still occupy a cell.
    /// Returns the number of columns consumed, or 0 if nothing was written.
    pub fn set_grapheme(&mut self, x: u16, y: u16, grapheme: &str, style: Style) -> u8 {
        let grapheme = printable(grapheme);
        let width = grapheme_width(grapheme).max(1);
        self.put(x, y, grapheme, style, width)
    }

    /// Write a symbol with an explicit display width.
    ///
    /// A symbol containing a control character is written as U+FFFD.
    pub(crate) fn put(&mut self, x: u16, y: u16, symbol: &str, style: Style, width: u8) -> u8 {
        let symbol = printable(symbol);
        if self.index_of(x, y).is_none() {
            return 0;
        }
        if width == 2 && x + 1 >= self.width {
            self.set(x, y, Cell::EMPTY.with_style(style));
            return 0;
        }

        let cell = if let Some(cell) = Cell::from_grapheme(symbol) {
            cell.with_display_width(width).with_style(style)
        } else {
            Cell::overflow(self.intern(symbol), width).with_style(style)
        };

        if self.set(x, y, cell) {
            width
        } else {
            0
        }
    }

    /// Overflow index for `symbol`, adding it to the table if it is new.
    fn intern(&mut self, symbol: &str) -> u32 {
        if let Some(&index) = self.interned.get(symbol) {
            return index;
        }
        let index = self.next_overflow_index;
        self.next_overflow_index += 1;
        self.overflow.insert(index, symbol.to_owned());
        self.interned.insert(symbol.to_owned(), index);
        index
    }

    /// Write a run of text starting at (x, y).
    ///
    /// The text is walked grapheme by grapheme, advancing by each cluster's
    /// display width. Zero-width clusters are merged into the cell written
    /// just before them; leading ones have nothing to attach to and are
    /// dropped. Clusters containing control characters are written as
    /// U+FFFD. Output stops at the right edge; a wide character that does
    /// not fit entirely is not written.
    ///
    /// Returns the column just past the last written cell.
    pub fn set_span(&mut self, x: u16, y: u16, text: &str, style: Style) -> u16 {
        if y >= self.height {
            return x;
        }

        let is_mark = |g: &&str| grapheme_width(g) == 0;
        let mut graphemes = text.graphemes(true).map(printable).peekable();
        while graphemes.next_if(is_mark).is_some() {}

        let mut col = x;
        while let Some(grapheme) = graphemes.next() {
            let width = grapheme_width(grapheme);
            if u32::from(col) + u32::from(width) > u32::from(self.width) {
                break;
            }

            let mut cluster = Cow::Borrowed(grapheme);
            while let Some(mark) = graphemes.next_if(is_mark) {
                cluster.to_mut().push_str(mark);
            }
            self.put(col, y, &cluster, style, width);
            col += u16::from(width);
        }

        col
    }

    /// Overlay `other` onto this buffer with its origin at (x, y).
    ///
    /// Used when a widget composes into a scratch buffer first. Cells that
    /// land outside this buffer are dropped; a wide character whose second
    /// column would be dropped is replaced by a blank.
    pub fn merge(&mut self, other: &Self, x: u16, y: u16) {
        for (row_idx, row) in other.rows().enumerate() {
            let Some(dy) = offset(y, row_idx) else { break };
            if dy >= self.height {
                break;
            }

            for (col_idx, cell) in row.iter().enumerate() {
                let Some(dx) = offset(x, col_idx) else { break };
                if dx >= self.width {
                    break;
                }
                if cell.is_wide_continuation() {
                    continue;
                }
                if cell.is_overflow() {
                    self.put(dx, dy, other.symbol(cell), cell.style(), cell.display_width());
                } else {
                    self.set(dx, dy, *cell);
                }
            }
        }
    }

    /// Fill a rectangular region with a cell.
    pub fn fill_rect(&mut self, rect: Rect, cell: Cell) {
        let step = u16::from(cell.display_width().max(1));
        for row in rect.y..rect.bottom().min(self.height) {
            let mut col = rect.x;
            while col < rect.right().min(self.width) {
                self.set(col, row, cell);
                col = col.saturating_add(step);
            }
        }
    }

    /// Clear the entire buffer (fill with blank cells).
    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
        self.overflow.clear();
        self.interned.clear();
        self.next_overflow_index = 0;
    }

    /// Resize the buffer, preserving the overlapping content.
    ///
    /// Newly exposed cells are blank. A wide character cut in half by the
    /// new right edge is blanked.
    pub fn resize(&mut self, new_width: u16, new_height: u16) {
        if new_width == self.width && new_height == self.height {
            return;
        }

        let new_size = (new_width as usize) * (new_height as usize);
        let mut new_cells = vec![Cell::EMPTY; new_size];

        let copy_width = self.width.min(new_width) as usize;
        let copy_height = self.height.min(new_height) as usize;

        for y in 0..copy_height {
            let old_start = y * (self.width as usize);
            let new_start = y * (new_width as usize);
            new_cells[new_start..new_start + copy_width]
                .copy_from_slice(&self.cells[old_start..old_start + copy_width]);

            if copy_width > 0 {
                let edge = new_start + copy_width - 1;
                if new_cells[edge].is_wide() && copy_width == new_width as usize {
                    new_cells[edge] = Cell::EMPTY.with_style(new_cells[edge].style());
                }
            }
        }

        self.cells = new_cells;
        self.width = new_width;
        self.height = new_height;
    }

    /// Get an iterator over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width.max(1) as usize)
    }

    /// Compare two cells, resolving overflow graphemes through their buffers.
    ///
    /// Continuation cells compare equal to each other regardless of style:
    /// they are only ever drawn as part of their lead.
    pub fn same_cell(&self, cell: &Cell, other: &Self, other_cell: &Cell) -> bool {
        if cell.is_wide_continuation() && other_cell.is_wide_continuation() {
            return true;
        }
        if !cell.is_overflow() && !other_cell.is_overflow() {
            return cell == other_cell;
        }
        cell.style() == other_cell.style()
            && cell.flags() == other_cell.flags()
            && cell.display_width() == other_cell.display_width()
            && self.symbol(cell) == other.symbol(other_cell)
    }

    /// Get memory usage in bytes (approximate).
    pub fn memory_usage(&self) -> usize {
        let cells_size = self.cells.len() * std::mem::size_of::<Cell>();
        // Each grapheme is held by both maps.
        let overflow_size: usize = self.overflow.values().map(|s| 2 * (s.len() + 32)).sum();
        cells_size + overflow_size + std::mem::size_of::<Self>()
    }
}

/// `base + delta` as a terminal coordinate, if it fits in `u16`.
fn offset(base: u16, delta: usize) -> Option<u16> {
    u16::try_from(delta).ok().and_then(|d| base.checked_add(d))
}

impl PartialEq for Buffer {
    /// Visible equality: same size and every cell shows the same thing.
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|(a, b)| self.same_cell(a, other, b))
    }
}

impl Eq for Buffer {}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lines: Vec<String> = self
            .rows()
            .map(|row| row.iter().map(|cell| self.symbol(cell)).collect())
            .collect();
        f.debug_struct("Buffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("overflow_count", &self.overflow.len())
            .field("lines", &lines)
            .finish()
    }
}
