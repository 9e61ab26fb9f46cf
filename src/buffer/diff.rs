//! Diffing Engine: the minimal set of writes turning one frame into the next.
//!
//! This module implements the core anti-flicker logic:
//! 1. Scan the previous and current buffers row by row
//! 2. Collect the cells that differ
//! 3. Coalesce adjacent changed cells into runs (one cursor move, one write)
//!
//! Cursor positioning dominates terminal cost, so the unit of output is the
//! run, not the cell. Turning runs into escape sequences is the backend's job;
//! see [`crate::terminal`].
//!
//! A diff is self-contained. Graphemes too long to live inline in a cell are
//! copied into the diff's own overflow table, so the diff stays valid after
//! both buffers are gone.

use super::{Buffer, Cell};

/// One positioned write: `cells` replace the screen starting at `(x, y)`.
///
/// A run never wraps to the next row. When it contains a wide character it
/// also contains that character's continuation cell, when the continuation
/// fits on the row.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Run {
    /// Column of the first cell.
    pub x: u16,
    /// Row of the run.
    pub y: u16,
    /// The cells to write, left to right.
    pub cells: Vec<Cell>,
}

impl Run {
    /// Number of columns covered.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always `false` for runs produced by [`diff`].
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// The ordered update instructions between two frames.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Diff {
    runs: Vec<Run>,
    overflow: Vec<String>,
    full_repaint: bool,
    cells_changed: usize,
    width: u16,
    height: u16,
}

/// Compute the writes that turn `previous` into `current`.
///
/// Buffers of different sizes cannot be compared cell by cell; the result is
/// then a full repaint of `current`.
///
/// # Example
///
/// ```
/// use weft::buffer::{diff, Buffer, Style};
///
/// let previous = Buffer::blank(5, 1);
/// let mut current = Buffer::blank(5, 1);
/// current.set_span(0, 0, "AB", Style::DEFAULT);
///
/// let d = diff(&previous, &current);
/// assert_eq!(d.runs().len(), 1);
/// assert_eq!((d.runs()[0].x, d.runs()[0].len()), (0, 2));
/// ```
pub fn diff(previous: &Buffer, current: &Buffer) -> Diff {
    if previous.width() != current.width() || previous.height() != current.height() {
        return Diff::full(current);
    }

    let mut out = Diff::empty(current.width(), current.height(), false);
    let width = current.width() as usize;

    let rows = previous.rows().zip(current.rows());
    for ((prev_row, cur_row), y) in rows.zip(0u16..) {
        let changed = |x: usize| {
            let cell = &cur_row[x];
            !cell.is_wide_continuation() && !current.same_cell(cell, previous, &prev_row[x])
        };

        let mut x = 0;
        while x < width {
            if !changed(x) {
                x += 1;
                continue;
            }

            let start = x;
            let mut cells = Vec::new();
            while x < width && changed(x) {
                // A wide lead drags its continuation along.
                let end = (x + cur_row[x].display_width().max(1) as usize).min(width);
                for cell in &cur_row[x..end] {
                    cells.push(out.intern(current, cell));
                }
                out.cells_changed += 1;
                x = end;
            }
            out.push_run(start, y, cells);
        }
    }

    out
}

impl Diff {
    fn empty(width: u16, height: u16, full_repaint: bool) -> Self {
        Self {
            runs: Vec::new(),
            overflow: Vec::new(),
            full_repaint,
            cells_changed: 0,
            width,
            height,
        }
    }

    /// Repaint every cell of `buffer`, one run per row.
    pub fn full(buffer: &Buffer) -> Self {
        let mut out = Self::empty(buffer.width(), buffer.height(), true);
        if buffer.width() == 0 {
            return out;
        }

        for (row, y) in buffer.rows().zip(0u16..) {
            let cells: Vec<Cell> = row.iter().map(|cell| out.intern(buffer, cell)).collect();
            out.cells_changed += row.iter().filter(|c| !c.is_wide_continuation()).count();
            out.push_run(0, y, cells);
        }
        out
    }

    /// Copy a cell out of `buffer`, moving any overflow grapheme into this diff.
    #[allow(clippy::cast_possible_truncation)]
    fn intern(&mut self, buffer: &Buffer, cell: &Cell) -> Cell {
        if !cell.is_overflow() {
            return *cell;
        }
        let index = self.overflow.len() as u32;
        self.overflow.push(buffer.symbol(cell).to_string());
        Cell::overflow(index, cell.display_width()).with_style(cell.style())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn push_run(&mut self, x: usize, y: u16, cells: Vec<Cell>) {
        // x < width <= u16::MAX
        self.runs.push(Run {
            x: x as u16,
            y,
            cells,
        });
    }

    /// The runs in row-major order.
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// `true` when nothing needs to be written.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// `true` when the whole screen is rewritten.
    ///
    /// Backends may clear the screen first when this is set.
    pub const fn full_repaint(&self) -> bool {
        self.full_repaint
    }

    /// Number of changed cells, not counting continuation columns.
    pub const fn cells_changed(&self) -> usize {
        self.cells_changed
    }

    /// Width of the frame this diff produces.
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height of the frame this diff produces.
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Resolve the text of a cell taken from this diff.
    ///
    /// Continuation cells resolve to the empty string.
    pub fn symbol<'a>(&'a self, cell: &'a Cell) -> &'a str {
        match cell.overflow_index() {
            Some(idx) => self
                .overflow
                .get(idx as usize)
                .map_or("\u{fffd}", String::as_str),
            None => cell.grapheme().unwrap_or(""),
        }
    }

    /// Every written cell with its coordinate, continuation cells included.
    pub fn cells(&self) -> impl Iterator<Item = (u16, u16, &Cell)> {
        self.runs.iter().flat_map(|run| {
            run.cells.iter().zip(run.x..).map(move |(cell, x)| (x, run.y, cell))
        })
    }

    /// Replay this diff onto a model of the screen.
    ///
    /// The model is resized to the frame's dimensions first, as a terminal
    /// would be before a full repaint.
    pub fn apply(&self, screen: &mut Buffer) {
        screen.resize(self.width, self.height);
        for (x, y, cell) in self.cells() {
            if cell.is_wide_continuation() {
                continue;
            }
            if cell.is_overflow() {
                screen.put(x, y, self.symbol(cell), cell.style(), cell.display_width());
            } else {
                screen.set(x, y, *cell);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{Modifiers, Rgb, Style};
    use proptest::prelude::*;

    const FAMILY: &str = "\u{1f468}\u{200d}\u{1f469}\u{200d}\u{1f467}";

    #[test]
    fn test_diff_identical_buffers() {
        let a = Buffer::new(10, 5);
        let b = Buffer::new(10, 5);

        let d = diff(&a, &b);

        assert!(d.is_empty());
        assert_eq!(d.cells_changed(), 0);
        assert!(!d.full_repaint());
    }

    #[test]
    fn test_diff_single_cell_change() {
        let a = Buffer::new(10, 5);
        let mut b = Buffer::new(10, 5);
        b.set(5, 2, Cell::new('X'));

        let d = diff(&a, &b);

        assert_eq!(d.cells_changed(), 1);
        assert_eq!(
            d.runs(),
            &[Run {
                x: 5,
                y: 2,
                cells: vec![Cell::new('X')]
            }]
        );
    }

    #[test]
    fn test_adjacent_cells_coalesce_into_one_run() {
        let a = Buffer::blank(5, 1);
        let mut b = Buffer::blank(5, 1);
        b.set(0, 0, Cell::new('A'));
        b.set(1, 0, Cell::new('B'));

        let d = diff(&a, &b);

        assert_eq!(d.runs().len(), 1);
        assert_eq!(d.runs()[0].x, 0);
        assert_eq!(d.runs()[0].y, 0);
        assert_eq!(d.runs()[0].len(), 2);
    }

    #[test]
    fn test_gap_splits_runs() {
        let a = Buffer::blank(10, 2);
        let mut b = Buffer::blank(10, 2);
        b.set_span(0, 0, "ab", Style::DEFAULT);
        b.set_span(5, 0, "cd", Style::DEFAULT);
        b.set(9, 0, Cell::new('e'));
        b.set(0, 1, Cell::new('f'));

        let d = diff(&a, &b);
        let starts: Vec<(u16, u16, usize)> = d.runs().iter().map(|r| (r.x, r.y, r.len())).collect();

        // Runs never wrap from the end of one row to the start of the next.
        assert_eq!(starts, [(0, 0, 2), (5, 0, 2), (9, 0, 1), (0, 1, 1)]);
    }

    #[test]
    fn test_style_change_is_a_change() {
        let a = Buffer::blank(3, 1);
        let mut b = Buffer::blank(3, 1);
        b.set(1, 0, Cell::EMPTY.with_fg(Rgb::new(255, 0, 0)));
        b.set(2, 0, Cell::EMPTY.with_modifiers(Modifiers::BOLD));

        let d = diff(&a, &b);
        assert_eq!(d.cells_changed(), 2);
        assert_eq!(d.runs().len(), 1);
    }

    #[test]
    fn test_wide_lead_carries_continuation() {
        let a = Buffer::blank(4, 1);
        let mut b = Buffer::blank(4, 1);
        b.set_span(1, 0, "世", Style::DEFAULT);

        let d = diff(&a, &b);

        assert_eq!(d.runs().len(), 1);
        let run = &d.runs()[0];
        assert_eq!(run.x, 1);
        assert_eq!(run.len(), 2);
        assert!(run.cells[1].is_wide_continuation());
        assert_eq!(d.cells_changed(), 1);
    }

    #[test]
    fn test_unchanged_wide_char_is_not_emitted() {
        let mut a = Buffer::blank(6, 1);
        a.set_span(0, 0, "世x", Style::DEFAULT);
        let mut b = a.clone();
        b.set(3, 0, Cell::new('y'));

        let d = diff(&a, &b);
        assert_eq!(d.runs().len(), 1);
        assert_eq!(d.runs()[0].x, 3);
    }

    #[test]
    fn test_replacing_wide_with_narrow() {
        let mut a = Buffer::blank(4, 1);
        a.set_span(0, 0, "世", Style::DEFAULT);
        let mut b = Buffer::blank(4, 1);
        b.set_span(0, 0, "ab", Style::DEFAULT);

        let d = diff(&a, &b);
        assert_eq!(d.runs().len(), 1);
        assert_eq!(d.runs()[0].len(), 2);

        let mut screen = a.clone();
        d.apply(&mut screen);
        assert_eq!(screen, b);
    }

    #[test]
    fn test_dimension_mismatch_is_full_repaint() {
        let a = Buffer::blank(80, 24);
        let b = Buffer::blank(80, 30);

        let d = diff(&a, &b);

        assert!(d.full_repaint());
        assert_eq!(d.runs().len(), 30);
        assert!(d.runs().iter().all(|r| r.x == 0 && r.len() == 80));
        assert_eq!(d.cells_changed(), 80 * 30);
    }

    #[test]
    fn test_full_on_zero_sized_buffer() {
        let d = Diff::full(&Buffer::new(0, 3));
        assert!(d.full_repaint());
        assert!(d.is_empty());
    }

    #[test]
    fn test_overflow_grapheme_travels_with_diff() {
        let a = Buffer::blank(4, 1);
        let mut b = Buffer::blank(4, 1);
        b.set_grapheme(0, 0, FAMILY, Style::DEFAULT);

        let d = diff(&a, &b);
        drop(b);

        let (_, _, cell) = d.cells().next().unwrap();
        assert_eq!(d.symbol(cell), FAMILY);
    }

    #[test]
    fn test_overflow_compared_by_content() {
        // Same grapheme, different overflow indices in each buffer.
        let mut a = Buffer::blank(4, 1);
        a.set_grapheme(0, 0, "\u{1f468}\u{200d}\u{1f4bb}", Style::DEFAULT);
        a.set_grapheme(0, 0, FAMILY, Style::DEFAULT);
        let mut b = Buffer::blank(4, 1);
        b.set_grapheme(0, 0, FAMILY, Style::DEFAULT);

        assert!(diff(&a, &b).is_empty());
    }

    #[test]
    fn test_cells_iterator_positions() {
        let a = Buffer::blank(4, 2);
        let mut b = Buffer::blank(4, 2);
        b.set_span(2, 1, "hi", Style::DEFAULT);

        let positions: Vec<(u16, u16)> = diff(&a, &b).cells().map(|(x, y, _)| (x, y)).collect();
        assert_eq!(positions, [(2, 1), (3, 1)]);
    }

    #[test]
    fn test_apply_full_resizes_screen() {
        let mut b = Buffer::blank(6, 2);
        b.set_span(0, 1, "hello", Style::DEFAULT);

        let mut screen = Buffer::blank(2, 2);
        Diff::full(&b).apply(&mut screen);
        assert_eq!(screen, b);
    }

    #[test]
    fn test_resize_overlap_has_no_spurious_changes() {
        let mut previous = Buffer::blank(20, 5);
        previous.set_span(0, 0, "status: ok", Style::DEFAULT);
        previous.set_span(0, 4, "footer", Style::DEFAULT);

        let mut current = Buffer::blank(20, 8);
        current.set_span(0, 0, "status: ok", Style::DEFAULT);
        current.set_span(0, 4, "footer", Style::DEFAULT);

        previous.resize(20, 8);
        assert!(diff(&previous, &current).is_empty());
    }

    fn arb_buffer(width: u16, height: u16) -> impl Strategy<Value = Buffer> {
        let texts = proptest::collection::vec(
            (
                0..width,
                0..height,
                prop::sample::select(vec!["a", "bc", "世", "é", "xy世z", FAMILY, " "]),
                prop::sample::select(vec![Rgb::WHITE, Rgb::new(255, 0, 0)]),
                any::<bool>(),
            ),
            0..12,
        );
        texts.prop_map(move |writes| {
            let mut buffer = Buffer::blank(width, height);
            for (x, y, text, fg, bold) in writes {
                let modifiers = if bold { Modifiers::BOLD } else { Modifiers::empty() };
                buffer.set_span(x, y, text, Style::DEFAULT.fg(fg).modifiers(modifiers));
            }
            buffer
        })
    }

    fn arb_pair() -> impl Strategy<Value = (Buffer, Buffer)> {
        (1u16..12, 1u16..5).prop_flat_map(|(w, h)| (arb_buffer(w, h), arb_buffer(w, h)))
    }

    proptest! {
        #[test]
        fn prop_apply_diff_reaches_target((a, b) in arb_pair()) {
            let mut screen = a.clone();
            diff(&a, &b).apply(&mut screen);
            prop_assert_eq!(screen, b);
        }

        #[test]
        fn prop_diff_with_self_is_empty((a, _) in arb_pair()) {
            prop_assert!(diff(&a, &a).is_empty());
        }

        #[test]
        fn prop_round_trip_restores_screen((a, b) in arb_pair()) {
            let mut screen = a.clone();
            diff(&a, &b).apply(&mut screen);
            diff(&b, &a).apply(&mut screen);
            prop_assert_eq!(screen, a);
        }
    }
}
