//! View: a layout tree with widgets mounted on its nodes.

use super::Widget;
use crate::buffer::Buffer;
use crate::layout::{Constraint, Flow, LayoutTree, NodeId, Rect};

/// What one frame renders: a [`LayoutTree`] plus the widget on each node.
///
/// Containers may carry a widget too (a background or a border); it paints
/// before its children since painting follows tree pre-order.
pub struct View<'a> {
    tree: LayoutTree,
    widgets: Vec<Option<Box<dyn Widget + 'a>>>,
}

/// Outcome of painting a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaintReport {
    /// Widgets that painted successfully.
    pub painted: usize,
    /// Widgets whose paint returned an error.
    pub failures: usize,
}

impl<'a> View<'a> {
    /// Create an empty view whose root splits its children with `flow`.
    pub fn new(flow: Flow) -> Self {
        Self {
            tree: LayoutTree::new(flow),
            widgets: vec![None],
        }
    }

    /// The root node; it always covers the whole screen.
    pub const fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// The underlying layout tree.
    pub const fn tree(&self) -> &LayoutTree {
        &self.tree
    }

    /// Add a leaf holding `widget` under `parent`.
    pub fn add_widget(
        &mut self,
        parent: NodeId,
        constraint: Constraint,
        widget: impl Widget + 'a,
    ) -> NodeId {
        let node = self.add_node(parent, constraint);
        self.widgets[node.index()] = Some(Box::new(widget));
        node
    }

    /// Add a container under `parent` that splits its own children with `flow`.
    pub fn add_container(&mut self, parent: NodeId, constraint: Constraint, flow: Flow) -> NodeId {
        let node = self.add_node(parent, constraint);
        self.tree.set_flow(node, flow);
        node
    }

    /// Mount `widget` on an existing node, replacing any previous one.
    pub fn set_widget(&mut self, node: NodeId, widget: impl Widget + 'a) {
        if let Some(slot) = self.widgets.get_mut(node.index()) {
            *slot = Some(Box::new(widget));
        }
    }

    fn add_node(&mut self, parent: NodeId, constraint: Constraint) -> NodeId {
        let node = self.tree.add_child(parent, constraint);
        self.widgets.push(None);
        node
    }

    /// Resolve every node's rectangle for a screen of `area`.
    pub fn layout(&self, area: Rect) -> Vec<Rect> {
        self.tree.compute(area)
    }

    /// Paint every widget into `buffer` in tree pre-order, given the
    /// rectangles from [`View::layout`].
    ///
    /// A failing widget is logged and skipped; the rest still paint.
    pub fn paint(&self, rects: &[Rect], buffer: &mut Buffer) -> PaintReport {
        let mut report = PaintReport::default();

        for node in self.tree.preorder() {
            let Some(widget) = self.widgets.get(node.index()).and_then(Option::as_ref) else {
                continue;
            };
            let area = rects.get(node.index()).copied().unwrap_or(Rect::ZERO);

            match widget.paint(area, buffer) {
                Ok(()) => report.painted += 1,
                Err(err) => {
                    report.failures += 1;
                    tracing::warn!(
                        widget = widget.name(),
                        node = node.index(),
                        ?area,
                        error = %err,
                        "widget failed to paint"
                    );
                }
            }
        }

        report
    }

    /// The cursor position requested by the last widget in paint order
    /// that asks for one inside its own area.
    pub fn cursor(&self, rects: &[Rect]) -> Option<(u16, u16)> {
        self.tree
            .preorder()
            .into_iter()
            .filter_map(|node| {
                let widget = self.widgets.get(node.index())?.as_ref()?;
                let area = rects.get(node.index()).copied()?;
                widget.cursor(area).filter(|&(x, y)| area.contains(x, y))
            })
            .last()
    }
}
