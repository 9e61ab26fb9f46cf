//! Cell: The atomic unit of terminal display.
//!
//! # Memory Layout
//!
//! The `Cell` struct is kept at 16 bytes so four cells share a cache line,
//! which matters for the row scans done by the diff engine:
//! - Inline grapheme storage covers almost every real-world character
//! - Longer clusters (emoji ZWJ sequences) are interned in the owning
//!   [`Buffer`](super::Buffer)'s overflow table
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │  Cell Layout (16 bytes)                                                   │
//! ├─────────────┬─────────────┬───────────┬───────────┬─────┬───────┬─────────┤
//! │  grapheme   │  len + width│    fg     │    bg     │ mod │ flags │ padding │
//! │  [u8; 4]    │  u8 + u8    │  [u8; 3]  │  [u8; 3]  │ u8  │  u8   │ [u8; 2] │
//! └─────────────┴─────────────┴───────────┴───────────┴─────┴───────┴─────────┘
//! ```

use bitflags::bitflags;
use std::hash::{Hash, Hasher};

/// True-color RGB representation.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
}

impl Rgb {
    /// Create a new RGB color.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Black (0, 0, 0)
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// White (255, 255, 255)
    pub const WHITE: Self = Self::new(255, 255, 255);
    /// Default foreground (white)
    pub const DEFAULT_FG: Self = Self::WHITE;
    /// Default background (black)
    pub const DEFAULT_BG: Self = Self::BLACK;

    /// Create from a 24-bit hex color (e.g., 0xFF5500).
    #[inline]
    pub const fn from_u32(hex: u32) -> Self {
        Self::new(
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        )
    }
}

impl std::fmt::Debug for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    #[inline]
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

impl From<u32> for Rgb {
    #[inline]
    fn from(hex: u32) -> Self {
        Self::from_u32(hex)
    }
}

bitflags! {
    /// Text style modifiers, each independently togglable.
    ///
    /// # Example
    /// ```
    /// use weft::Modifiers;
    /// let style = Modifiers::BOLD | Modifiers::ITALIC;
    /// assert!(style.contains(Modifiers::BOLD));
    /// ```
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Bold text
        const BOLD = 0b0000_0001;
        /// Dim/faint text
        const DIM = 0b0000_0010;
        /// Italic text
        const ITALIC = 0b0000_0100;
        /// Underlined text
        const UNDERLINE = 0b0000_1000;
        /// Blinking text
        const BLINK = 0b0001_0000;
        /// Reversed colors (fg/bg swapped)
        const REVERSED = 0b0010_0000;
        /// Hidden/invisible text
        const HIDDEN = 0b0100_0000;
        /// Strikethrough text
        const STRIKETHROUGH = 0b1000_0000;
    }
}

impl std::fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

bitflags! {
    /// Cell-level flags for special states.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellFlags: u8 {
        /// Grapheme lives in the buffer's overflow table
        const OVERFLOW = 0b0000_0001;
        /// Second column of a wide character
        const WIDE_CONTINUATION = 0b0000_0100;
    }
}

impl std::fmt::Debug for CellFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

/// A resolved visual style: what the styling layer hands to the core.
///
/// The core never cascades or merges styles; a `Style` is stamped onto
/// cells as-is.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Style {
    /// Foreground color.
    pub fg: Rgb,
    /// Background color.
    pub bg: Rgb,
    /// Text modifiers.
    pub modifiers: Modifiers,
}

impl Default for Style {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Style {
    /// Default colors, no modifiers.
    pub const DEFAULT: Self = Self {
        fg: Rgb::DEFAULT_FG,
        bg: Rgb::DEFAULT_BG,
        modifiers: Modifiers::empty(),
    };

    /// Set the foreground color (builder pattern).
    #[must_use]
    pub const fn fg(mut self, fg: Rgb) -> Self {
        self.fg = fg;
        self
    }

    /// Set the background color (builder pattern).
    #[must_use]
    pub const fn bg(mut self, bg: Rgb) -> Self {
        self.bg = bg;
        self
    }

    /// Set the modifiers (builder pattern).
    #[must_use]
    pub const fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// A single terminal cell.
///
/// Each cell holds a grapheme cluster, foreground and background colors,
/// and text modifiers. Cells are plain `Copy` data; all behavior that needs
/// the overflow table lives on [`Buffer`](super::Buffer).
///
/// # Grapheme Handling
///
/// Clusters of up to 4 UTF-8 bytes are stored inline. Longer clusters set
/// the `OVERFLOW` flag and store a little-endian `u32` index into the owning
/// buffer's overflow table instead. Two overflow cells from different
/// buffers must therefore be compared through their buffers, never with `==`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Cell {
    /// Inline grapheme storage (UTF-8 bytes), or the overflow index.
    grapheme: [u8; 4],
    /// Byte length of the inline grapheme (0 when overflowed).
    grapheme_len: u8,
    /// Display width (0=continuation, 1=normal, 2=wide).
    display_width: u8,
    fg: Rgb,
    bg: Rgb,
    modifiers: Modifiers,
    flags: CellFlags,
    _padding: [u8; 2],
}

const _: () = assert!(
    std::mem::size_of::<Cell>() == 16,
    "Cell must be exactly 16 bytes"
);

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Cell {
    /// A blank cell (space character with default colors).
    pub const EMPTY: Self = Self {
        grapheme: [b' ', 0, 0, 0],
        grapheme_len: 1,
        display_width: 1,
        fg: Rgb::DEFAULT_FG,
        bg: Rgb::DEFAULT_BG,
        modifiers: Modifiers::empty(),
        flags: CellFlags::empty(),
        _padding: [0, 0],
    };

    /// Create a new cell with a single character.
    ///
    /// Printable ASCII takes a fast path; anything else goes through
    /// [`Cell::from_char`].
    #[inline]
    pub fn new(c: char) -> Self {
        if c.is_ascii() && !c.is_ascii_control() {
            Self {
                grapheme: [c as u8, 0, 0, 0],
                ..Self::EMPTY
            }
        } else {
            Self::from_char(c)
        }
    }

    /// Create a cell from any character.
    ///
    /// Control characters are stored as U+FFFD.
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_char(c: char) -> Self {
        let c = if c.is_control() { REPLACEMENT } else { c };
        let mut grapheme = [0u8; 4];
        let len = c.encode_utf8(&mut grapheme).len();
        let width = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0).min(2);

        Self {
            grapheme,
            grapheme_len: len as u8,
            display_width: width as u8,
            ..Self::EMPTY
        }
    }

    /// Create a cell from a grapheme cluster.
    ///
    /// Returns `None` when the cluster does not fit in 4 bytes; the buffer
    /// then interns it and builds the cell with [`Cell::overflow`]. A
    /// cluster containing a control character is stored as U+FFFD.
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_grapheme(s: &str) -> Option<Self> {
        let s = printable(s);
        let bytes = s.as_bytes();
        if bytes.len() > 4 {
            return None;
        }

        let mut grapheme = [0u8; 4];
        grapheme[..bytes.len()].copy_from_slice(bytes);

        Some(Self {
            grapheme,
            grapheme_len: bytes.len() as u8,
            display_width: grapheme_width(s),
            ..Self::EMPTY
        })
    }

    /// Create an overflow cell pointing at an entry of a buffer's overflow table.
    #[inline]
    pub const fn overflow(index: u32, display_width: u8) -> Self {
        Self {
            grapheme: index.to_le_bytes(),
            grapheme_len: 0,
            display_width,
            flags: CellFlags::OVERFLOW,
            ..Self::EMPTY
        }
    }

    /// Create a wide-character continuation cell.
    ///
    /// This occupies the column after a character of display width 2.
    #[inline]
    pub const fn wide_continuation() -> Self {
        Self {
            grapheme: [0, 0, 0, 0],
            grapheme_len: 0,
            display_width: 0,
            flags: CellFlags::WIDE_CONTINUATION,
            ..Self::EMPTY
        }
    }

    /// Get the inline grapheme.
    ///
    /// Returns `None` for overflow cells; resolve those with
    /// [`Buffer::symbol`](super::Buffer::symbol).
    #[inline]
    pub fn grapheme(&self) -> Option<&str> {
        if self.is_overflow() {
            return None;
        }
        std::str::from_utf8(&self.grapheme[..self.grapheme_len as usize]).ok()
    }

    /// Get the overflow index if this is an overflow cell.
    #[inline]
    pub const fn overflow_index(&self) -> Option<u32> {
        if self.is_overflow() {
            Some(u32::from_le_bytes(self.grapheme))
        } else {
            None
        }
    }

    /// Check if this cell uses overflow storage.
    #[inline]
    pub const fn is_overflow(&self) -> bool {
        self.flags.contains(CellFlags::OVERFLOW)
    }

    /// Check if this is a wide-character continuation.
    #[inline]
    pub const fn is_wide_continuation(&self) -> bool {
        self.flags.contains(CellFlags::WIDE_CONTINUATION)
    }

    /// Check if this cell starts a character two columns wide.
    #[inline]
    pub const fn is_wide(&self) -> bool {
        self.display_width == 2
    }

    /// Get the display width (0, 1, or 2).
    #[inline]
    pub const fn display_width(&self) -> u8 {
        self.display_width
    }

    /// Get the foreground color.
    #[inline]
    pub const fn fg(&self) -> Rgb {
        self.fg
    }

    /// Get the background color.
    #[inline]
    pub const fn bg(&self) -> Rgb {
        self.bg
    }

    /// Get the modifiers.
    #[inline]
    pub const fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Get the flags.
    #[inline]
    pub const fn flags(&self) -> CellFlags {
        self.flags
    }

    /// Get the colors and modifiers as a [`Style`].
    #[inline]
    pub const fn style(&self) -> Style {
        Style {
            fg: self.fg,
            bg: self.bg,
            modifiers: self.modifiers,
        }
    }

    /// Set the foreground color.
    #[inline]
    pub const fn set_fg(&mut self, fg: Rgb) -> &mut Self {
        self.fg = fg;
        self
    }

    /// Set the background color.
    #[inline]
    pub const fn set_bg(&mut self, bg: Rgb) -> &mut Self {
        self.bg = bg;
        self
    }

    /// Set the modifiers.
    #[inline]
    pub const fn set_modifiers(&mut self, modifiers: Modifiers) -> &mut Self {
        self.modifiers = modifiers;
        self
    }

    /// Set the foreground color (builder pattern).
    #[inline]
    #[must_use]
    pub const fn with_fg(mut self, fg: Rgb) -> Self {
        self.fg = fg;
        self
    }

    /// Set the background color (builder pattern).
    #[inline]
    #[must_use]
    pub const fn with_bg(mut self, bg: Rgb) -> Self {
        self.bg = bg;
        self
    }

    /// Set the modifiers (builder pattern).
    #[inline]
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Apply a whole [`Style`] (builder pattern).
    #[inline]
    #[must_use]
    pub const fn with_style(mut self, style: Style) -> Self {
        self.fg = style.fg;
        self.bg = style.bg;
        self.modifiers = style.modifiers;
        self
    }

    /// Override the display width (builder pattern).
    #[inline]
    #[must_use]
    pub(crate) const fn with_display_width(mut self, width: u8) -> Self {
        self.display_width = width;
        self
    }

    /// Reset the cell to blank.
    #[inline]
    pub const fn reset(&mut self) {
        *self = Self::EMPTY;
    }
}

/// Stand-in for text that must not reach the terminal.
pub(crate) const REPLACEMENT: char = '\u{fffd}';

/// `s`, or U+FFFD if it contains a control character.
///
/// Control characters move the terminal cursor or start escape sequences,
/// so the screen would stop matching the buffer.
pub(crate) fn printable(s: &str) -> &str {
    if s.chars().any(char::is_control) {
        "\u{fffd}"
    } else {
        s
    }
}

/// Display width of a grapheme cluster, clamped to the 0..=2 a cell can hold.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn grapheme_width(s: &str) -> u8 {
    unicode_width::UnicodeWidthStr::width(s).min(2) as u8
}

impl PartialEq for Cell {
    /// Field-wise equality, grapheme bytes first since they differ most often.
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.grapheme == other.grapheme
            && self.grapheme_len == other.grapheme_len
            && self.fg == other.fg
            && self.bg == other.bg
            && self.modifiers == other.modifiers
            && self.flags == other.flags
            && self.display_width == other.display_width
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.grapheme.hash(state);
        self.grapheme_len.hash(state);
        self.display_width.hash(state);
        self.fg.hash(state);
        self.bg.hash(state);
        self.modifiers.hash(state);
        self.flags.hash(state);
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let grapheme = self.grapheme().unwrap_or("<overflow>");
        f.debug_struct("Cell")
            .field("grapheme", &grapheme)
            .field("width", &self.display_width)
            .field("fg", &self.fg)
            .field("bg", &self.bg)
            .field("modifiers", &self.modifiers)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}
