//! Widget trait and the view tree widgets are mounted in.
//!
//! A widget is anything that can paint itself into a rectangle of a buffer.
//! Widgets do not know where they are placed: the [`View`]'s layout tree
//! decides, and hands each widget its area when the frame is painted.
//!
//! Any closure `Fn(Rect, &mut Buffer) -> Result<(), PaintError>` is a widget:
//!
//! ```
//! use weft::buffer::{Buffer, Style};
//! use weft::layout::{Constraint, Flow, Rect};
//! use weft::widget::View;
//! use weft::PaintError;
//!
//! let mut view = View::new(Flow::vertical());
//! let root = view.root();
//! view.add_widget(root, Constraint::Length(1), |area: Rect, buf: &mut Buffer| -> Result<(), PaintError> {
//!     buf.set_span(area.x, area.y, "title", Style::DEFAULT);
//!     Ok(())
//! });
//! ```

mod view;

pub use view::{PaintReport, View};

use crate::buffer::Buffer;
use crate::error::PaintError;
use crate::layout::Rect;

/// A UI component that can paint itself into a buffer.
pub trait Widget {
    /// Paint into `area` of `buffer`.
    ///
    /// The widget should only write to cells within `area`; writes outside
    /// the buffer are dropped. On error, whatever was already painted stays.
    ///
    /// # Errors
    ///
    /// Returns a [`PaintError`] when the widget cannot draw itself. The
    /// render loop logs it and carries on with the other widgets.
    fn paint(&self, area: Rect, buffer: &mut Buffer) -> Result<(), PaintError>;

    /// Where the terminal cursor should sit once the frame is on screen,
    /// e.g. the caret of a text input.
    ///
    /// `area` is the area the widget painted into. Positions outside it are
    /// ignored. When several widgets ask, the one painted last wins; when
    /// none does, the cursor is hidden.
    fn cursor(&self, area: Rect) -> Option<(u16, u16)> {
        let _ = area;
        None
    }

    /// Name used when logging paint failures.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F> Widget for F
where
    F: Fn(Rect, &mut Buffer) -> Result<(), PaintError>,
{
    fn paint(&self, area: Rect, buffer: &mut Buffer) -> Result<(), PaintError> {
        self(area, buffer)
    }
}
