//! Buffer module: the cell grid every frame is painted into.
//!
//! This module contains:
//! - [`Cell`]: The atomic unit of display, optimized for cache efficiency
//! - [`Buffer`]: A grid of cells representing the terminal screen
//! - [`Rgb`], [`Modifiers`], [`Style`]: what a cell looks like
//! - [`diff()`]: the engine that turns two buffers into minimal [`Run`]s

mod cell;
#[allow(clippy::module_inception)]
mod buffer;
mod diff;

pub use buffer::Buffer;
pub use cell::{Cell, CellFlags, Modifiers, Rgb, Style};
pub use diff::{diff, Diff, Run};
