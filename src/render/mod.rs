//! Render loop: layout, paint, diff, flush.
//!
//! [`Renderer`] is the frame state machine and works without any terminal.
//! [`Terminal`] binds it to a [`Backend`](crate::terminal::Backend) so one
//! call renders one frame end to end. [`FrameScheduler`] decides when the
//! next frame is due.

mod renderer;
mod scheduler;
mod terminal;

pub use renderer::{FrameState, FrameStats, PreparedFrame, Renderer};
pub use scheduler::{FrameScheduler, RedrawHandle, Tick, Wake};
pub use terminal::{RenderStats, Terminal};
