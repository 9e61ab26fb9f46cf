//! Error types.
//!
//! Only I/O at the terminal boundary is fatal. Everything else degrades:
//! bad geometry is clamped, mismatched buffers repaint in full, and a widget
//! that fails to paint is skipped for that frame.

use std::io;
use thiserror::Error;

/// A frame could not be rendered.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The terminal size could not be queried, usually because no terminal
    /// is attached.
    #[error("failed to query terminal size: {0}")]
    Size(#[source] io::Error),

    /// Writing or flushing the frame failed.
    #[error("failed to write frame: {0}")]
    Output(#[source] io::Error),
}

/// A widget failed to paint itself.
///
/// Contained per widget: the frame continues with whatever was painted.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PaintError {
    message: String,
}

impl PaintError {
    /// Create a paint error with a human-readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message passed to [`PaintError::new`].
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for PaintError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for PaintError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}
