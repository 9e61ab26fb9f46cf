//! # Weft
//!
//! The rendering core of a terminal UI toolkit.
//!
//! Applications describe a tree of widgets; Weft lays the tree out, lets each
//! widget paint into a cell grid, and writes only the cells that changed
//! since the previous frame.
//!
//! ## Core Concepts
//!
//! - **Cell grid**: every frame is a [`Buffer`] of 16-byte [`Cell`]s
//! - **Minimal diff**: changed cells are coalesced into runs, one cursor move each
//! - **Constraint layout**: [`Layout`] splits a [`Rect`] by [`Constraint`]s, and
//!   a [`LayoutTree`] nests splits
//! - **Explicit frames**: [`Renderer`] takes the terminal size as an argument,
//!   and only adopts a frame once its output has been flushed
//!
//! ## Example
//!
//! ```rust
//! use weft::{Buffer, Constraint, Flow, PaintError, Rect, Style, Terminal, View};
//! use weft::terminal::TestBackend;
//!
//! let mut view = View::new(Flow::vertical());
//! let root = view.root();
//! view.add_widget(root, Constraint::Length(1), |area: Rect, buf: &mut Buffer| -> Result<(), PaintError> {
//!     buf.set_span(area.x, area.y, "Hello", Style::DEFAULT);
//!     Ok(())
//! });
//!
//! let mut terminal = Terminal::new(TestBackend::new(80, 24));
//! let stats = terminal.draw(&view)?;
//! assert_eq!(stats.cells_changed, 80 * 24);
//!
//! // Nothing changed, nothing to write.
//! assert_eq!(terminal.draw(&view)?.cells_changed, 0);
//! # Ok::<(), weft::RenderError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod buffer;
pub mod config;
pub mod error;
pub mod layout;
pub mod render;
pub mod terminal;
pub mod widget;

// Re-exports for convenience
pub use buffer::{diff, Buffer, Cell, CellFlags, Diff, Modifiers, Rgb, Run, Style};
pub use config::RenderConfig;
pub use error::{PaintError, RenderError};
pub use layout::{Constraint, Direction, Flow, Layout, LayoutTree, Margin, NodeId, Rect, Size};
pub use render::{FrameScheduler, FrameState, FrameStats, RedrawHandle, Renderer, Terminal};
pub use widget::{View, Widget};
