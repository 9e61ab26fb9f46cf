//! `TestBackend`: an in-memory screen for tests and headless rendering.

use super::Backend;
use crate::buffer::{Buffer, Diff};
use crate::layout::Size;
use std::io;

/// A [`Backend`] that replays diffs onto a [`Buffer`] instead of a terminal.
///
/// The screen only changes on [`flush`](Backend::flush), like a real
/// terminal behind a write buffer.
#[derive(Debug, Clone)]
pub struct TestBackend {
    screen: Buffer,
    pending: Vec<Diff>,
    cursor: Option<(u16, u16)>,
    pending_cursor: Option<Option<(u16, u16)>>,
    size: Size,
    fail_size: bool,
    fail_draw: bool,
    draws: usize,
    full_repaints: usize,
}

impl TestBackend {
    /// Create a blank screen of the given size.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            screen: Buffer::blank(width, height),
            pending: Vec::new(),
            cursor: None,
            pending_cursor: None,
            size: Size::new(width, height),
            fail_size: false,
            fail_draw: false,
            draws: 0,
            full_repaints: 0,
        }
    }

    /// What is currently visible.
    pub const fn screen(&self) -> &Buffer {
        &self.screen
    }

    /// Where the cursor is shown, or `None` while it is hidden.
    pub const fn cursor(&self) -> Option<(u16, u16)> {
        self.cursor
    }

    /// Simulate a terminal resize. The screen itself changes on the next
    /// full repaint, as with a real terminal.
    pub const fn resize(&mut self, width: u16, height: u16) {
        self.size = Size::new(width, height);
    }

    /// Make [`size`](Backend::size) fail, as when no terminal is attached.
    pub const fn fail_size(&mut self, fail: bool) {
        self.fail_size = fail;
    }

    /// Make [`draw`](Backend::draw) fail, as with a closed pipe.
    pub const fn fail_draw(&mut self, fail: bool) {
        self.fail_draw = fail;
    }

    /// Number of successful `draw` calls.
    pub const fn draws(&self) -> usize {
        self.draws
    }

    /// Number of full repaints received.
    pub const fn full_repaints(&self) -> usize {
        self.full_repaints
    }

    /// Row `y` of the screen as text, wide characters included once.
    pub fn line(&self, y: u16) -> String {
        (0..self.screen.width())
            .filter_map(|x| self.screen.get_grapheme(x, y))
            .collect()
    }
}

impl Backend for TestBackend {
    fn size(&self) -> io::Result<Size> {
        if self.fail_size {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no terminal attached"));
        }
        Ok(self.size)
    }

    fn draw(&mut self, diff: &Diff) -> io::Result<()> {
        if self.fail_draw {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "output closed"));
        }
        self.draws += 1;
        if diff.full_repaint() {
            self.full_repaints += 1;
        }
        self.pending.push(diff.clone());
        Ok(())
    }

    fn set_cursor(&mut self, position: Option<(u16, u16)>) -> io::Result<()> {
        self.pending_cursor = Some(position);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        for diff in self.pending.drain(..) {
            diff.apply(&mut self.screen);
        }
        if let Some(cursor) = self.pending_cursor.take() {
            self.cursor = cursor;
        }
        Ok(())
    }
}
