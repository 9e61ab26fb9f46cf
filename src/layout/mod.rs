//! Layout module: constraint-based partitioning of screen rectangles.
//!
//! [`split`] resolves one list of constraints against one rectangle.
//! [`LayoutTree`] nests splits and resolves the whole tree in a single
//! iterative pass, so a frame's layout is computed once before painting.

mod constraint;
mod rect;
mod split;
mod tree;

pub use constraint::{Constraint, Direction, Margin};
pub use rect::{Rect, Size};
pub use split::{split, Layout};
pub use tree::{Flow, LayoutTree, NodeId};
