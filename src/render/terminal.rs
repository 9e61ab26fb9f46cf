//! Terminal: the render loop bound to an output backend.

use super::renderer::{FrameStats, Renderer};
use crate::error::RenderError;
use crate::terminal::Backend;
use crate::widget::View;

/// Render statistics for debugging/profiling.
#[derive(Debug, Clone, Default)]
pub struct RenderStats {
    /// Total frames rendered.
    pub frames: u64,
    /// Total cells changed across all frames.
    pub cells_changed: u64,
    /// Frames that repainted the whole screen.
    pub full_repaints: u64,
    /// Widget paint failures across all frames.
    pub paint_failures: u64,
    /// Average render time in microseconds.
    pub avg_render_us: u64,
    /// Last render time in microseconds.
    pub last_render_us: u64,
}

impl RenderStats {
    fn record(&mut self, frame: &FrameStats) {
        self.frames += 1;
        self.cells_changed += frame.cells_changed as u64;
        self.full_repaints += u64::from(frame.full_repaint);
        self.paint_failures += frame.paint_failures as u64;
        self.last_render_us = u64::try_from(frame.elapsed.as_micros()).unwrap_or(u64::MAX);

        // Smoothed average
        if self.avg_render_us == 0 {
            self.avg_render_us = self.last_render_us;
        } else {
            self.avg_render_us = (self.avg_render_us * 15 + self.last_render_us) / 16;
        }
    }
}

/// Renders views to a [`Backend`], one synchronous frame per [`draw`](Self::draw).
///
/// # Example
///
/// ```
/// use weft::buffer::{Buffer, Style};
/// use weft::layout::{Constraint, Flow, Rect};
/// use weft::terminal::TestBackend;
/// use weft::widget::View;
/// use weft::{PaintError, Terminal};
///
/// let mut terminal = Terminal::new(TestBackend::new(12, 1));
/// let mut view = View::new(Flow::vertical());
/// let root = view.root();
/// view.add_widget(root, Constraint::Fill(1), |area: Rect, buf: &mut Buffer| -> Result<(), PaintError> {
///     buf.set_span(area.x, area.y, "hello", Style::DEFAULT);
///     Ok(())
/// });
///
/// let stats = terminal.draw(&view).unwrap();
/// assert!(stats.full_repaint);
/// assert_eq!(terminal.backend().line(0), "hello       ");
/// ```
pub struct Terminal<B: Backend> {
    backend: B,
    renderer: Renderer,
    stats: RenderStats,
}

impl<B: Backend> Terminal<B> {
    /// Wrap a backend. The first frame repaints the whole screen.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            renderer: Renderer::new(),
            stats: RenderStats::default(),
        }
    }

    /// The output backend.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the output backend.
    pub const fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The frame state machine.
    pub const fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Accumulated statistics.
    pub const fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Repaint the whole screen on the next frame.
    pub fn clear(&mut self) {
        self.renderer.invalidate();
    }

    /// Consume the terminal and return the backend.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Render one frame of `view`.
    ///
    /// The diff is written, then the cursor is placed where the view asks
    /// (or hidden), then the backend is flushed. The frame is committed only
    /// once the flush succeeds.
    ///
    /// # Errors
    ///
    /// [`RenderError::Size`] if the backend cannot report its size, and
    /// [`RenderError::Output`] if writing fails. After an output error the
    /// next frame repaints the whole screen.
    pub fn draw(&mut self, view: &View<'_>) -> Result<FrameStats, RenderError> {
        let size = self.backend.size().map_err(RenderError::Size)?;
        let frame = self.renderer.prepare(size, view);

        let written = self
            .backend
            .draw(frame.diff())
            .and_then(|()| self.backend.set_cursor(frame.cursor()))
            .and_then(|()| self.backend.flush());
        if let Err(err) = written {
            self.renderer.abandon(frame);
            self.renderer.invalidate();
            return Err(RenderError::Output(err));
        }

        let stats = self.renderer.commit(frame);
        self.stats.record(&stats);
        Ok(stats)
    }
}
