//! Terminal module: where diffs leave the core.
//!
//! The [`Backend`] trait is the seam between the render loop and the outside
//! world. [`AnsiBackend`] turns diffs into escape sequences for a real
//! terminal; [`TestBackend`] replays them onto an in-memory screen.
//! [`TerminalGuard`] owns raw mode and the alternate screen.

mod ansi;
mod guard;
mod output;
mod test_backend;

pub use ansi::AnsiBackend;
pub use guard::TerminalGuard;
pub use output::OutputBuffer;
pub use test_backend::TestBackend;

use crate::buffer::Diff;
use crate::layout::Size;
use std::io;

/// An output collaborator: reports the screen size and applies diffs.
pub trait Backend {
    /// Current screen size.
    ///
    /// # Errors
    ///
    /// Returns an error when the size cannot be determined, for example when
    /// no terminal is attached.
    fn size(&self) -> io::Result<Size>;

    /// Queue the writes described by `diff`.
    ///
    /// # Errors
    ///
    /// Returns an error if the writes cannot be queued.
    fn draw(&mut self, diff: &Diff) -> io::Result<()>;

    /// Queue showing the cursor at `position`, or hiding it for `None`.
    ///
    /// Called after [`draw`](Self::draw) for every frame, so the cursor ends
    /// up where the frame wants it rather than after the last write.
    ///
    /// # Errors
    ///
    /// Returns an error if the writes cannot be queued.
    fn set_cursor(&mut self, position: Option<(u16, u16)>) -> io::Result<()>;

    /// Push queued writes to the screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    fn flush(&mut self) -> io::Result<()>;
}

impl<B: Backend + ?Sized> Backend for &mut B {
    fn size(&self) -> io::Result<Size> {
        (**self).size()
    }

    fn draw(&mut self, diff: &Diff) -> io::Result<()> {
        (**self).draw(diff)
    }

    fn set_cursor(&mut self, position: Option<(u16, u16)>) -> io::Result<()> {
        (**self).set_cursor(position)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}
