//! Renderer: the per-frame state machine.
//!
//! The renderer owns the only state that survives between frames: the
//! previous buffer and the size it was rendered at. One frame is split into
//! [`Renderer::prepare`] (layout, paint, diff) and [`Renderer::commit`]
//! (adopt the new buffer once the output is on screen). Between the two the
//! caller writes the diff; if that fails the frame is dropped and the
//! previous buffer still describes what the terminal shows.

use crate::buffer::{diff, Buffer, Diff};
use crate::layout::{Rect, Size};
use crate::widget::View;
use std::time::{Duration, Instant};

/// Where the renderer is within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameState {
    /// No frame in progress.
    #[default]
    Idle,
    /// Resolving the layout tree.
    LayingOut,
    /// Widgets are painting into the new buffer.
    Painting,
    /// Comparing the new buffer with the previous one.
    Diffing,
    /// The diff is prepared and waiting to be written and committed.
    Flushing,
}

/// What one frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Cells rewritten, not counting continuation columns.
    pub cells_changed: usize,
    /// Cursor-positioned writes.
    pub runs: usize,
    /// Whether the whole screen was repainted.
    pub full_repaint: bool,
    /// Widgets that failed to paint.
    pub paint_failures: usize,
    /// Time from the start of layout to commit.
    pub elapsed: Duration,
}

/// A frame that has been laid out, painted and diffed, but not yet adopted.
///
/// Dropping it instead of passing it to [`Renderer::commit`] abandons the frame.
#[derive(Debug)]
pub struct PreparedFrame {
    buffer: Buffer,
    diff: Diff,
    cursor: Option<(u16, u16)>,
    size: Size,
    stats: FrameStats,
    started: Instant,
}

impl PreparedFrame {
    /// The writes that bring the screen up to date.
    pub const fn diff(&self) -> &Diff {
        &self.diff
    }

    /// The fully painted frame.
    pub const fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Where the cursor goes after the diff is written; `None` hides it.
    pub const fn cursor(&self) -> Option<(u16, u16)> {
        self.cursor
    }

    /// Statistics so far; `elapsed` is filled in on commit.
    pub const fn stats(&self) -> &FrameStats {
        &self.stats
    }
}

/// Drives frames from a [`View`] to a [`Diff`].
///
/// The terminal size is an argument of every frame rather than ambient
/// state, so the renderer works the same with or without a terminal.
#[derive(Debug, Default)]
pub struct Renderer {
    previous: Option<Buffer>,
    last_size: Option<Size>,
    state: FrameState,
    frame_count: u64,
    force_full: bool,
}

impl Renderer {
    /// Create a renderer; its first frame is always a full repaint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current position in the frame cycle.
    pub const fn state(&self) -> FrameState {
        self.state
    }

    /// Number of committed frames.
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The last committed frame, i.e. what the screen is believed to show.
    pub const fn previous(&self) -> Option<&Buffer> {
        self.previous.as_ref()
    }

    /// The size the last committed frame was rendered at.
    pub const fn last_size(&self) -> Option<Size> {
        self.last_size
    }

    /// Make the next frame a full repaint, e.g. after something else wrote
    /// to the screen or an output error left it in an unknown state.
    pub fn invalidate(&mut self) {
        self.force_full = true;
    }

    /// Lay out, paint and diff one frame for a screen of `size`.
    ///
    /// A size change since the last committed frame forces a full repaint
    /// for this frame only, as does the first frame and
    /// [`invalidate`](Self::invalidate). Nothing the renderer keeps changes
    /// until [`commit`](Self::commit).
    pub fn prepare(&mut self, size: Size, view: &View<'_>) -> PreparedFrame {
        let started = Instant::now();

        self.state = FrameState::LayingOut;
        let resized = self.last_size.is_some_and(|last| last != size);
        if resized {
            tracing::debug!(from = ?self.last_size, to = ?size, "terminal resized");
        }
        if self.force_full {
            tracing::debug!("forced full repaint");
        }
        let rects = view.layout(Rect::from_size(size.width, size.height));

        self.state = FrameState::Painting;
        let mut buffer = Buffer::blank(size.width, size.height);
        let report = view.paint(&rects, &mut buffer);
        let cursor = view.cursor(&rects);

        self.state = FrameState::Diffing;
        let changes = match self.previous.as_ref() {
            Some(previous) if !resized && !self.force_full => diff(previous, &buffer),
            _ => Diff::full(&buffer),
        };

        self.state = FrameState::Flushing;
        let stats = FrameStats {
            frame: self.frame_count + 1,
            cells_changed: changes.cells_changed(),
            runs: changes.runs().len(),
            full_repaint: changes.full_repaint(),
            paint_failures: report.failures,
            elapsed: Duration::ZERO,
        };

        PreparedFrame {
            buffer,
            diff: changes,
            cursor,
            size,
            stats,
            started,
        }
    }

    /// Adopt a frame whose diff has been written and flushed.
    pub fn commit(&mut self, frame: PreparedFrame) -> FrameStats {
        let mut stats = frame.stats;
        stats.elapsed = frame.started.elapsed();

        self.previous = Some(frame.buffer);
        self.last_size = Some(frame.size);
        self.force_full = false;
        self.frame_count += 1;
        self.state = FrameState::Idle;

        tracing::trace!(
            frame = stats.frame,
            cells_changed = stats.cells_changed,
            runs = stats.runs,
            full_repaint = stats.full_repaint,
            paint_failures = stats.paint_failures,
            elapsed_us = u64::try_from(stats.elapsed.as_micros()).unwrap_or(u64::MAX),
            "frame committed"
        );
        stats
    }

    /// Drop a prepared frame; the previous buffer stays as it was.
    #[allow(clippy::needless_pass_by_value)]
    pub fn abandon(&mut self, frame: PreparedFrame) {
        tracing::debug!(frame = frame.stats.frame, "frame abandoned");
        self.state = FrameState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Style;
    use crate::error::PaintError;
    use crate::layout::{Constraint, Flow};

    fn label(text: &'static str) -> impl Fn(Rect, &mut Buffer) -> Result<(), PaintError> {
        move |area: Rect, buf: &mut Buffer| {
            buf.set_span(area.x, area.y, text, Style::DEFAULT);
            Ok(())
        }
    }

    fn single(text: &'static str) -> View<'static> {
        let mut view = View::new(Flow::vertical());
        let root = view.root();
        view.add_widget(root, Constraint::Fill(1), label(text));
        view
    }

    #[test]
    fn test_first_frame_is_full_repaint() {
        let mut renderer = Renderer::new();
        let frame = renderer.prepare(Size::new(10, 2), &single("hi"));

        assert!(frame.diff().full_repaint());
        assert_eq!(renderer.state(), FrameState::Flushing);

        let stats = renderer.commit(frame);
        assert_eq!(stats.frame, 1);
        assert!(stats.full_repaint);
        assert_eq!(renderer.state(), FrameState::Idle);
        assert_eq!(renderer.last_size(), Some(Size::new(10, 2)));
    }

    #[test]
    fn test_unchanged_frame_is_empty() {
        let mut renderer = Renderer::new();
        let view = single("same");
        let first = renderer.prepare(Size::new(10, 2), &view);
        renderer.commit(first);

        let second = renderer.prepare(Size::new(10, 2), &view);
        assert!(second.diff().is_empty());
        assert_eq!(renderer.commit(second).cells_changed, 0);
    }

    #[test]
    fn test_only_changes_are_diffed() {
        let mut renderer = Renderer::new();
        let first = renderer.prepare(Size::new(10, 1), &single("count 1"));
        renderer.commit(first);

        let second = renderer.prepare(Size::new(10, 1), &single("count 2"));
        let runs = second.diff().runs();
        assert_eq!(runs.len(), 1);
        assert_eq!((runs[0].x, runs[0].len()), (6, 1));
    }

    #[test]
    fn test_resize_forces_one_full_repaint() {
        let mut renderer = Renderer::new();
        let view = single("x");
        let frame = renderer.prepare(Size::new(80, 24), &view);
        renderer.commit(frame);

        let resized = renderer.prepare(Size::new(80, 30), &view);
        assert!(resized.diff().full_repaint());
        assert_eq!(resized.diff().runs().len(), 30);
        assert_eq!(renderer.previous().map(Buffer::height), Some(24));
        renderer.commit(resized);
        assert_eq!(renderer.previous().map(Buffer::height), Some(30));

        let after = renderer.prepare(Size::new(80, 30), &view);
        assert!(!after.diff().full_repaint());
        assert!(after.diff().is_empty());
    }

    #[test]
    fn test_abandoned_frame_keeps_previous() {
        let mut renderer = Renderer::new();
        let first = renderer.prepare(Size::new(6, 1), &single("one"));
        renderer.commit(first);

        let dropped = renderer.prepare(Size::new(6, 1), &single("two"));
        renderer.abandon(dropped);
        assert_eq!(renderer.state(), FrameState::Idle);
        assert_eq!(renderer.frame_count(), 1);
        assert_eq!(renderer.previous().and_then(|b| b.get_grapheme(0, 0)), Some("o"));

        // Still diffed against "one", not "two".
        let retry = renderer.prepare(Size::new(6, 1), &single("two"));
        assert_eq!(retry.diff().cells_changed(), 3);
        assert_eq!(retry.stats().frame, 2);
    }

    #[test]
    fn test_abandoned_resize_leaves_previous_untouched() {
        let mut renderer = Renderer::new();
        let view = single("abc");
        let first = renderer.prepare(Size::new(6, 2), &view);
        renderer.commit(first);

        let dropped = renderer.prepare(Size::new(2, 1), &view);
        renderer.abandon(dropped);
        let previous = renderer.previous().map(|b| (b.width(), b.height()));
        assert_eq!(previous, Some((6, 2)));
        assert_eq!(renderer.last_size(), Some(Size::new(6, 2)));
        assert_eq!(renderer.previous().and_then(|b| b.get_grapheme(2, 0)), Some("c"));

        // Back at the committed size, only real changes are written.
        let retry = renderer.prepare(Size::new(6, 2), &view);
        assert!(retry.diff().is_empty());
    }

    #[test]
    fn test_cursor_is_carried_by_the_frame() {
        struct Input;

        impl crate::widget::Widget for Input {
            fn paint(&self, area: Rect, buf: &mut Buffer) -> Result<(), PaintError> {
                buf.set_span(area.x, area.y, "> ", Style::DEFAULT);
                Ok(())
            }

            fn cursor(&self, area: Rect) -> Option<(u16, u16)> {
                Some((area.x + 2, area.y))
            }
        }

        let mut view = View::new(Flow::vertical());
        let root = view.root();
        view.add_widget(root, Constraint::Length(1), label("title"));
        view.add_widget(root, Constraint::Length(1), Input);

        let mut renderer = Renderer::new();
        let frame = renderer.prepare(Size::new(10, 2), &view);
        assert_eq!(frame.cursor(), Some((2, 1)));
        assert_eq!(renderer.prepare(Size::new(10, 2), &single("x")).cursor(), None);
    }

    #[test]
    fn test_invalidate_forces_full_repaint_once() {
        let mut renderer = Renderer::new();
        let view = single("x");
        let frame = renderer.prepare(Size::new(4, 1), &view);
        renderer.commit(frame);

        renderer.invalidate();
        let forced = renderer.prepare(Size::new(4, 1), &view);
        assert!(forced.diff().full_repaint());
        renderer.commit(forced);

        let next = renderer.prepare(Size::new(4, 1), &view);
        assert!(next.diff().is_empty());
    }

    #[test]
    fn test_paint_failure_is_counted() {
        let mut view = View::new(Flow::vertical());
        let root = view.root();
        view.add_widget(root, Constraint::Length(1), label("fine"));
        let broken = |_: Rect, _: &mut Buffer| -> Result<(), PaintError> { Err("broken".into()) };
        view.add_widget(root, Constraint::Length(1), broken);

        let mut renderer = Renderer::new();
        let frame = renderer.prepare(Size::new(8, 2), &view);
        assert_eq!(frame.buffer().get_grapheme(0, 0), Some("f"));
        assert_eq!(renderer.commit(frame).paint_failures, 1);
    }

    #[test]
    fn test_zero_size_terminal() {
        let mut renderer = Renderer::new();
        let frame = renderer.prepare(Size::new(0, 0), &single("x"));
        assert!(frame.diff().is_empty());
        renderer.commit(frame);
    }
}
