//! Render configuration.

use std::time::Duration;

/// Configuration shared by the terminal guard, the ANSI backend and the
/// frame scheduler.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Target frames per second for the scheduler's ticker.
    pub target_fps: u32,
    /// Whether to use alternate screen buffer.
    pub alternate_screen: bool,
    /// Whether to hide the cursor while rendering.
    pub hide_cursor: bool,
    /// Bytes pre-allocated for one frame's escape sequences.
    pub output_capacity: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            alternate_screen: true,
            hide_cursor: true,
            output_capacity: 64 * 1024,
        }
    }
}

impl RenderConfig {
    /// Set the target frame rate (builder pattern).
    #[must_use]
    pub const fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    /// Enable or disable the alternate screen (builder pattern).
    #[must_use]
    pub const fn with_alternate_screen(mut self, enabled: bool) -> Self {
        self.alternate_screen = enabled;
        self
    }

    /// Show or hide the cursor while rendering (builder pattern).
    #[must_use]
    pub const fn with_hide_cursor(mut self, hide: bool) -> Self {
        self.hide_cursor = hide;
        self
    }

    /// Set the output buffer capacity (builder pattern).
    #[must_use]
    pub const fn with_output_capacity(mut self, bytes: usize) -> Self {
        self.output_capacity = bytes;
        self
    }

    /// Time between frames at the target rate, or `None` when pacing is off
    /// (`target_fps == 0`).
    pub fn frame_interval(&self) -> Option<Duration> {
        (self.target_fps > 0).then(|| Duration::from_secs(1) / self.target_fps)
    }
}
