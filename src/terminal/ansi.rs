//! `AnsiBackend`: turns diffs into ANSI escape sequences.
//!
//! Two costs dominate terminal output: cursor positioning and attribute
//! changes. The backend tracks where the cursor is and which colors and
//! modifiers are active, and only emits what actually changes:
//! 1. A run starting where the cursor already is needs no move
//! 2. Colors are only sent when they differ from the active ones
//! 3. Modifiers are only added when missing; removing any means a reset
//!
//! A cursor shown at the end of one frame is hidden while the next frame's
//! runs are written, then shown again wherever that frame puts it.
//!
//! Everything for one frame goes into an [`OutputBuffer`] and reaches the
//! writer in one `write_all` on [`Backend::flush`].

use super::output::OutputBuffer;
use super::Backend;
use crate::buffer::{Cell, Diff, Modifiers, Rgb};
use crate::config::RenderConfig;
use crate::layout::Size;
use std::io::{self, Write};

/// Attributes the terminal currently has active. `None` means unknown.
#[derive(Debug, Clone, Default)]
struct SgrState {
    fg: Option<Rgb>,
    bg: Option<Rgb>,
    modifiers: Option<Modifiers>,
}

impl SgrState {
    /// Forget everything, e.g. after a reset or a full repaint.
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A [`Backend`] writing ANSI escape sequences to any [`Write`].
///
/// Usually wraps `stdout`, inside a [`TerminalGuard`](super::TerminalGuard).
pub struct AnsiBackend<W: Write> {
    writer: W,
    output: OutputBuffer,
    sgr: SgrState,
    /// Last known cursor position; `None` after a write ended at the right
    /// margin, where terminals disagree on where the cursor is.
    cursor: Option<(u16, u16)>,
    /// Whether this backend has made the cursor visible.
    cursor_shown: bool,
    size: Option<Size>,
}

impl<W: Write> AnsiBackend<W> {
    /// Create a backend with the default configuration.
    pub fn new(writer: W) -> Self {
        Self::with_config(writer, &RenderConfig::default())
    }

    /// Create a backend whose output buffer is sized from `config`.
    pub fn with_config(writer: W, config: &RenderConfig) -> Self {
        Self {
            writer,
            output: OutputBuffer::with_capacity(config.output_capacity),
            sgr: SgrState::default(),
            cursor: None,
            cursor_shown: false,
            size: None,
        }
    }

    /// Report a fixed size instead of asking the terminal (builder pattern).
    ///
    /// Used when the writer is not a terminal, e.g. in tests or when piping.
    #[must_use]
    pub const fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    /// Set or clear the fixed size.
    pub const fn set_size(&mut self, size: Option<Size>) {
        self.size = size;
    }

    /// The wrapped writer.
    pub const fn writer(&self) -> &W {
        &self.writer
    }

    /// Mutable access to the wrapped writer.
    ///
    /// Anything written directly bypasses the backend's state tracking; call
    /// [`invalidate`](Self::invalidate) afterwards.
    pub const fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Consume the backend and return the writer. Unflushed output is lost.
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Bytes queued but not yet flushed.
    pub fn pending(&self) -> &[u8] {
        self.output.as_bytes()
    }

    /// Forget the tracked cursor and attributes.
    pub fn invalidate(&mut self) {
        self.sgr.reset();
        self.cursor = None;
    }

    /// Bring the active attributes in line with `cell`.
    fn apply_style(&mut self, cell: &Cell) {
        let mods = cell.modifiers();
        // Unknown attributes may include anything, so they count as removed.
        let must_reset = match self.sgr.modifiers {
            Some(active) => !active.difference(mods).is_empty(),
            None => true,
        };

        // No portable per-attribute off codes; a reset clears colors too.
        if must_reset {
            self.output.reset_attrs();
            self.sgr.reset();
            self.sgr.modifiers = Some(Modifiers::empty());
        }

        if self.sgr.fg != Some(cell.fg()) {
            self.output.set_fg(cell.fg());
            self.sgr.fg = Some(cell.fg());
        }
        if self.sgr.bg != Some(cell.bg()) {
            self.output.set_bg(cell.bg());
            self.sgr.bg = Some(cell.bg());
        }

        if self.sgr.modifiers != Some(mods) {
            let active = self.sgr.modifiers.unwrap_or(Modifiers::empty());
            self.output.set_modifiers(mods.difference(active));
            self.sgr.modifiers = Some(mods);
        }
    }
}

impl<W: Write> Backend for AnsiBackend<W> {
    fn size(&self) -> io::Result<Size> {
        match self.size {
            Some(size) => Ok(size),
            None => crossterm::terminal::size().map(Size::from),
        }
    }

    fn draw(&mut self, diff: &Diff) -> io::Result<()> {
        if diff.full_repaint() {
            // The screen may hold anything; start from a known state.
            self.output.reset_attrs();
            self.invalidate();
            self.sgr.modifiers = Some(Modifiers::empty());
        }
        if self.cursor_shown && !diff.is_empty() {
            self.output.cursor_hide();
            self.cursor_shown = false;
        }

        for run in diff.runs() {
            if self.cursor != Some((run.x, run.y)) {
                self.output.cursor_move(run.x, run.y);
            }
            let mut x = run.x;

            for cell in &run.cells {
                // Drawn by the lead.
                if cell.is_wide_continuation() {
                    continue;
                }

                self.apply_style(cell);
                let symbol = diff.symbol(cell);
                if symbol.is_empty()
                    || cell.display_width() == 0
                    || symbol.chars().any(char::is_control)
                {
                    // Either would leave the cursor somewhere other than
                    // where the buffer says it is.
                    self.output.write_str(" ");
                } else {
                    self.output.write_str(symbol);
                }
                x = x.saturating_add(u16::from(cell.display_width().max(1)));
            }

            self.cursor = (x < diff.width()).then_some((x, run.y));
        }

        Ok(())
    }

    fn set_cursor(&mut self, position: Option<(u16, u16)>) -> io::Result<()> {
        match position {
            Some(position) => {
                if self.cursor != Some(position) {
                    self.output.cursor_move(position.0, position.1);
                    self.cursor = Some(position);
                }
                if !self.cursor_shown {
                    self.output.cursor_show();
                    self.cursor_shown = true;
                }
            }
            None if self.cursor_shown => {
                self.output.cursor_hide();
                self.cursor_shown = false;
            }
            None => {}
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.output.is_empty() {
            return Ok(());
        }
        let result = self.output.flush_to(&mut self.writer);
        self.output.clear();
        if result.is_err() {
            // Unknown how much reached the terminal.
            self.invalidate();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{diff, Buffer, Style};

    fn backend(width: u16, height: u16) -> AnsiBackend<Vec<u8>> {
        AnsiBackend::new(Vec::new()).with_size(Size::new(width, height))
    }

    fn render(backend: &mut AnsiBackend<Vec<u8>>, d: &Diff) -> Vec<u8> {
        backend.draw(d).unwrap();
        backend.flush().unwrap();
        std::mem::take(backend.writer_mut())
    }

    fn screen_line(parser: &vt100::Parser, row: u16) -> String {
        let line = parser.screen().rows(0, parser.screen().size().1).nth(row as usize);
        line.unwrap_or_default().trim_end().to_string()
    }

    #[test]
    fn test_single_run_is_one_move_and_one_write() {
        let previous = Buffer::blank(5, 1);
        let mut current = Buffer::blank(5, 1);
        current.set_span(0, 0, "AB", Style::DEFAULT);

        let mut out = backend(5, 1);
        let bytes = render(&mut out, &diff(&previous, &current));
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("\x1b[H"));
        assert!(text.ends_with("AB"));
        assert_eq!(text.matches("\x1b[H").count(), 1);
    }

    #[test]
    fn test_adjacent_run_skips_cursor_move() {
        let mut out = backend(10, 1);
        let blank = Buffer::blank(10, 1);
        let mut first = blank.clone();
        first.set_span(0, 0, "ab", Style::DEFAULT);
        render(&mut out, &diff(&blank, &first));

        let mut second = first.clone();
        second.set_span(2, 0, "cd", Style::DEFAULT);
        let bytes = render(&mut out, &diff(&first, &second));

        // Cursor was left at column 2 and colors are unchanged.
        assert_eq!(bytes, b"cd");
    }

    #[test]
    fn test_colors_are_not_repeated() {
        let red = Rgb::new(255, 0, 0);
        let previous = Buffer::blank(4, 1);
        let mut current = Buffer::blank(4, 1);
        current.set_span(0, 0, "ab", Style::DEFAULT.fg(red));

        let mut out = backend(4, 1);
        let text = String::from_utf8(render(&mut out, &diff(&previous, &current))).unwrap();
        assert_eq!(text.matches("\x1b[38;2;255;0;0m").count(), 1);
        assert_eq!(text.matches("\x1b[48;2;").count(), 1);
    }

    #[test]
    fn test_removing_modifier_resets() {
        let previous = Buffer::blank(4, 1);
        let mut current = Buffer::blank(4, 1);
        current.set_span(0, 0, "a", Style::DEFAULT.modifiers(Modifiers::BOLD));
        current.set_span(1, 0, "b", Style::DEFAULT);

        let mut out = backend(4, 1);
        let text = String::from_utf8(render(&mut out, &diff(&previous, &current))).unwrap();
        let bold = text.find("\x1b[1m").unwrap();
        let reset = text.rfind("\x1b[0m").unwrap();
        assert!(reset > bold);
    }

    #[test]
    fn test_replay_on_vt100_matches_buffer() {
        let mut parser = vt100::Parser::new(3, 12, 0);
        let mut out = backend(12, 3);

        let mut first = Buffer::blank(12, 3);
        first.set_span(0, 0, "hello world", Style::DEFAULT);
        first.set_span(2, 1, "世界", Style::DEFAULT.modifiers(Modifiers::BOLD));
        parser.process(&render(&mut out, &Diff::full(&first)));

        assert_eq!(screen_line(&parser, 0), "hello world");
        assert_eq!(screen_line(&parser, 1), "  世界");
        assert!(parser.screen().cell(1, 2).unwrap().bold());
        assert!(parser.screen().cell(1, 2).unwrap().is_wide());

        let mut second = first.clone();
        second.set_span(6, 0, "there", Style::DEFAULT.fg(Rgb::new(1, 2, 3)));
        second.set_span(2, 1, "ab", Style::DEFAULT);
        parser.process(&render(&mut out, &diff(&first, &second)));

        assert_eq!(screen_line(&parser, 0), "hello there");
        assert_eq!(screen_line(&parser, 1), "  ab界");
        assert!(!parser.screen().cell(1, 2).unwrap().bold());
        assert_eq!(
            parser.screen().cell(0, 6).unwrap().fgcolor(),
            vt100::Color::Rgb(1, 2, 3)
        );
    }

    #[test]
    fn test_write_at_right_margin_forgets_cursor() {
        let mut parser = vt100::Parser::new(2, 4, 0);
        let mut out = backend(4, 2);

        let blank = Buffer::blank(4, 2);
        let mut first = blank.clone();
        first.set_span(2, 0, "xy", Style::DEFAULT);
        parser.process(&render(&mut out, &diff(&blank, &first)));

        let mut second = first.clone();
        second.set_span(0, 1, "z", Style::DEFAULT);
        let bytes = render(&mut out, &diff(&first, &second));
        assert!(bytes.starts_with(b"\x1b[2H"));
        parser.process(&bytes);

        assert_eq!(screen_line(&parser, 0), "  xy");
        assert_eq!(screen_line(&parser, 1), "z");
    }

    #[test]
    fn test_empty_diff_writes_nothing() {
        let buffer = Buffer::blank(4, 2);
        let mut out = backend(4, 2);
        assert!(render(&mut out, &diff(&buffer, &buffer)).is_empty());
    }

    #[test]
    fn test_control_character_is_not_written() {
        let previous = Buffer::blank(3, 1);
        let mut current = Buffer::blank(3, 1);
        current.set(1, 0, Cell::from_char('\u{7}'));

        let mut out = backend(3, 1);
        let bytes = render(&mut out, &diff(&previous, &current));
        assert!(!bytes.contains(&7));
    }

    #[test]
    fn test_span_with_control_characters_cannot_move_the_cursor() {
        let mut parser = vt100::Parser::new(2, 10, 0);
        let mut out = backend(10, 2);
        let previous = Buffer::blank(10, 2);
        let mut current = Buffer::blank(10, 2);
        current.set_span(0, 0, "a\nb\x1b[2Jc", Style::DEFAULT);

        let bytes = render(&mut out, &diff(&previous, &current));
        assert!(!bytes.contains(&b'\n'));
        assert!(!bytes.windows(4).any(|w| w == b"\x1b[2J"));

        parser.process(&bytes);
        assert_eq!(screen_line(&parser, 0), "a\u{fffd}b\u{fffd}[2Jc");
        assert_eq!(screen_line(&parser, 1), "");
    }

    #[test]
    fn test_cursor_is_placed_after_the_diff() {
        let mut parser = vt100::Parser::new(2, 10, 0);
        let mut out = backend(10, 2);
        let blank = Buffer::blank(10, 2);
        let mut first = blank.clone();
        first.set_span(0, 1, "> ab", Style::DEFAULT);

        out.draw(&diff(&blank, &first)).unwrap();
        out.set_cursor(Some((4, 1))).unwrap();
        out.flush().unwrap();
        let bytes = std::mem::take(out.writer_mut());
        // Already at (4, 1) after the run, so only the show is needed.
        assert!(bytes.ends_with(b"ab\x1b[?25h"));
        parser.process(&bytes);
        assert_eq!(parser.screen().cursor_position(), (1, 4));
        assert!(!parser.screen().hide_cursor());

        // Hidden while the next run is written, then moved back and shown.
        let mut second = first.clone();
        second.set_span(4, 1, "c", Style::DEFAULT);
        out.draw(&diff(&first, &second)).unwrap();
        out.set_cursor(Some((5, 1))).unwrap();
        out.flush().unwrap();
        let bytes = std::mem::take(out.writer_mut());
        assert!(bytes.starts_with(b"\x1b[?25l"));
        assert!(bytes.ends_with(b"c\x1b[?25h"));
        parser.process(&bytes);
        assert_eq!(parser.screen().cursor_position(), (1, 5));

        // No request: hidden, and only once.
        out.set_cursor(None).unwrap();
        assert_eq!(out.pending(), b"\x1b[?25l");
        out.flush().unwrap();
        out.set_cursor(None).unwrap();
        assert!(out.pending().is_empty());
    }

    #[test]
    fn test_cursor_move_without_changes() {
        let mut out = backend(10, 2);
        out.set_cursor(Some((3, 1))).unwrap();
        out.flush().unwrap();
        assert_eq!(std::mem::take(out.writer_mut()), b"\x1b[2;4H\x1b[?25h");

        let same = Buffer::blank(10, 2);
        out.draw(&diff(&same, &same)).unwrap();
        out.set_cursor(Some((3, 1))).unwrap();
        out.flush().unwrap();
        assert!(out.writer().is_empty());
    }

    #[test]
    fn test_fixed_size() {
        let out = backend(80, 24);
        assert_eq!(out.size().unwrap(), Size::new(80, 24));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_flush_error_is_reported() {
        let mut out = AnsiBackend::new(BrokenPipe).with_size(Size::new(2, 1));
        let mut current = Buffer::blank(2, 1);
        current.set(0, 0, Cell::new('x'));

        out.draw(&Diff::full(&current)).unwrap();
        let err = out.flush().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(out.pending().is_empty());
    }
}
