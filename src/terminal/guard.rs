//! `TerminalGuard`: raw mode and alternate screen for the guard's lifetime.

use crate::config::RenderConfig;
use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, Write};

/// Puts the terminal into rendering mode and restores it on drop.
///
/// Restoration also runs when the render loop exits with an error or the
/// thread unwinds, so the user's shell is never left in raw mode.
pub struct TerminalGuard {
    alternate_screen: bool,
    hide_cursor: bool,
}

impl TerminalGuard {
    /// Enable raw mode, then optionally enter the alternate screen and hide
    /// the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal setup fails. Whatever was already
    /// enabled is restored before returning.
    pub fn enter(config: &RenderConfig) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        // From here on, Drop undoes whatever succeeded.
        let mut guard = Self {
            alternate_screen: false,
            hide_cursor: false,
        };

        let mut stdout = io::stdout();
        if config.alternate_screen {
            execute!(stdout, EnterAlternateScreen)?;
            guard.alternate_screen = true;
        }
        if config.hide_cursor {
            execute!(stdout, cursor::Hide)?;
            guard.hide_cursor = true;
        }
        stdout.flush()?;

        tracing::debug!(
            alternate_screen = guard.alternate_screen,
            hide_cursor = guard.hide_cursor,
            "terminal entered render mode"
        );
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, crossterm::style::ResetColor);
        if self.hide_cursor {
            let _ = execute!(stdout, cursor::Show);
        }
        if self.alternate_screen {
            let _ = execute!(stdout, LeaveAlternateScreen);
        }
        let _ = terminal::disable_raw_mode();
        tracing::debug!("terminal restored");
    }
}
