//! `OutputBuffer`: Single-syscall output buffer for ANSI sequences.

use crate::buffer::{Modifiers, Rgb};
use std::io::Write;

/// Pre-allocated buffer for building ANSI escape sequences.
///
/// All output is accumulated here, then flushed in a single `write()` syscall
/// to prevent terminal flickering.
pub struct OutputBuffer {
    data: Vec<u8>,
}

impl OutputBuffer {
    /// Create a new output buffer with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Create a buffer sized for a typical terminal (4KB).
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    /// Clear the buffer for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Get the buffer contents.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Get the buffer length.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write a string.
    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.data.extend_from_slice(s.as_bytes());
    }

    /// Move the cursor to (x, y), 0-indexed.
    ///
    /// Uses the most compact representation:
    /// - `\x1b[H` for home
    /// - `\x1b[{row}H` for column 1
    /// - `\x1b[{row};{col}H` otherwise
    #[inline]
    pub fn cursor_move(&mut self, x: u16, y: u16) {
        // ANSI uses 1-indexed positions
        let row = u32::from(y) + 1;
        let col = u32::from(x) + 1;

        // Writes into a Vec cannot fail.
        let _ = if row == 1 && col == 1 {
            self.data.write_all(b"\x1b[H")
        } else if col == 1 {
            write!(self.data, "\x1b[{row}H")
        } else {
            write!(self.data, "\x1b[{row};{col}H")
        };
    }

    /// Hide the cursor (DECTCEM).
    #[inline]
    pub fn cursor_hide(&mut self) {
        self.data.extend_from_slice(b"\x1b[?25l");
    }

    /// Show the cursor (DECTCEM).
    #[inline]
    pub fn cursor_show(&mut self) {
        self.data.extend_from_slice(b"\x1b[?25h");
    }

    /// Set foreground color (true color).
    #[inline]
    pub fn set_fg(&mut self, color: Rgb) {
        let _ = write!(self.data, "\x1b[38;2;{};{};{}m", color.r, color.g, color.b);
    }

    /// Set background color (true color).
    #[inline]
    pub fn set_bg(&mut self, color: Rgb) {
        let _ = write!(self.data, "\x1b[48;2;{};{};{}m", color.r, color.g, color.b);
    }

    /// Turn on every attribute in `modifiers`.
    ///
    /// SGR has no portable per-attribute "off" codes, so removing attributes
    /// is done with [`reset_attrs`](Self::reset_attrs) followed by re-applying.
    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        const CODES: [(Modifiers, &[u8]); 8] = [
            (Modifiers::BOLD, b"\x1b[1m"),
            (Modifiers::DIM, b"\x1b[2m"),
            (Modifiers::ITALIC, b"\x1b[3m"),
            (Modifiers::UNDERLINE, b"\x1b[4m"),
            (Modifiers::BLINK, b"\x1b[5m"),
            (Modifiers::REVERSED, b"\x1b[7m"),
            (Modifiers::HIDDEN, b"\x1b[8m"),
            (Modifiers::STRIKETHROUGH, b"\x1b[9m"),
        ];
        for (flag, code) in CODES {
            if modifiers.contains(flag) {
                self.data.extend_from_slice(code);
            }
        }
    }

    /// Reset all attributes.
    #[inline]
    pub fn reset_attrs(&mut self) {
        self.data.extend_from_slice(b"\x1b[0m");
    }

    /// Flush to a writer in a single syscall.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn flush_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.data)?;
        writer.flush()
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_move_optimization() {
        let mut output = OutputBuffer::new();

        // Home position uses short sequence
        output.cursor_move(0, 0);
        assert_eq!(output.as_bytes(), b"\x1b[H");

        output.clear();

        // Column 1 uses shorter sequence
        output.cursor_move(0, 5);
        assert_eq!(output.as_bytes(), b"\x1b[6H"); // Row 6 (1-indexed)

        output.clear();

        // General position
        output.cursor_move(10, 5);
        assert_eq!(output.as_bytes(), b"\x1b[6;11H"); // Row 6, Col 11 (1-indexed)

        output.clear();

        // No overflow at the far corner
        output.cursor_move(u16::MAX, u16::MAX);
        assert_eq!(output.as_bytes(), b"\x1b[65536;65536H");
    }

    #[test]
    fn test_colors_and_modifiers() {
        let mut output = OutputBuffer::new();
        output.set_fg(Rgb::new(255, 0, 10));
        output.set_bg(Rgb::BLACK);
        output.set_modifiers(Modifiers::BOLD | Modifiers::UNDERLINE);
        assert_eq!(
            output.as_bytes(),
            b"\x1b[38;2;255;0;10m\x1b[48;2;0;0;0m\x1b[1m\x1b[4m"
        );
    }

    #[test]
    fn test_cursor_visibility() {
        let mut output = OutputBuffer::new();
        output.cursor_hide();
        output.cursor_move(2, 0);
        output.cursor_show();
        assert_eq!(output.as_bytes(), b"\x1b[?25l\x1b[1;3H\x1b[?25h");
    }

    #[test]
    fn test_flush_to_writes_everything() {
        let mut output = OutputBuffer::with_capacity(16);
        output.write_str("hello");
        output.reset_attrs();

        let mut sink = Vec::new();
        output.flush_to(&mut sink).unwrap();
        assert_eq!(sink, b"hello\x1b[0m");
    }
}
