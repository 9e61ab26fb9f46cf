//! Sizing rules for one axis of a layout split.

/// The axis a layout splits along.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Direction {
    /// Children are placed left to right.
    Horizontal,
    /// Children are placed top to bottom.
    #[default]
    Vertical,
}

/// A per-child sizing rule along the split axis.
///
/// Constraints are resolved in a fixed priority order: `Length`, then
/// `Percentage` and `Ratio`, then the `Min` floors, and finally whatever
/// is left is shared among `Fill` and `Max` children.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Constraint {
    /// Exactly this many cells.
    Length(u16),
    /// This percentage of the distributable length; values above 100 clamp to 100.
    Percentage(u16),
    /// `numerator / denominator` of the distributable length. A zero
    /// denominator resolves to zero.
    Ratio(u32, u32),
    /// At least this many cells.
    Min(u16),
    /// A share of the leftover space (weight 1), never more than this many cells.
    Max(u16),
    /// A share of the leftover space proportional to the weight.
    Fill(u16),
}

impl Default for Constraint {
    fn default() -> Self {
        Self::Fill(1)
    }
}

/// Empty space around the area a layout splits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Margin {
    /// Rows above.
    pub top: u16,
    /// Columns to the right.
    pub right: u16,
    /// Rows below.
    pub bottom: u16,
    /// Columns to the left.
    pub left: u16,
}

impl Margin {
    /// No margin.
    pub const NONE: Self = Self::new(0, 0, 0, 0);

    /// Create a margin from each side, clockwise from the top.
    pub const fn new(top: u16, right: u16, bottom: u16, left: u16) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// The same margin on every side.
    pub const fn uniform(value: u16) -> Self {
        Self::new(value, value, value, value)
    }

    /// `vertical` above and below, `horizontal` left and right.
    pub const fn symmetric(vertical: u16, horizontal: u16) -> Self {
        Self::new(vertical, horizontal, vertical, horizontal)
    }
}
