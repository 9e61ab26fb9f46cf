//! LayoutTree: nested splits resolved in one pass.
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`]. Every
//! node carries the constraint its parent uses to size it, and a [`Flow`]
//! describing how its own children are split. Traversal is iterative, so
//! arbitrarily deep trees never grow the call stack.

use super::constraint::{Constraint, Direction, Margin};
use super::rect::Rect;
use super::split::split;

/// Index of a node in a [`LayoutTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in arena order.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a node splits its children.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Flow {
    /// Axis the children are placed along.
    pub direction: Direction,
    /// Gap between adjacent children.
    pub spacing: u16,
    /// Space around the children.
    pub margin: Margin,
}

impl Flow {
    /// Children side by side.
    pub const fn horizontal() -> Self {
        Self {
            direction: Direction::Horizontal,
            spacing: 0,
            margin: Margin::NONE,
        }
    }

    /// Children stacked top to bottom.
    pub const fn vertical() -> Self {
        Self {
            direction: Direction::Vertical,
            spacing: 0,
            margin: Margin::NONE,
        }
    }

    /// Set the spacing (builder pattern).
    #[must_use]
    pub const fn with_spacing(mut self, spacing: u16) -> Self {
        self.spacing = spacing;
        self
    }

    /// Set the margin (builder pattern).
    #[must_use]
    pub const fn with_margin(mut self, margin: Margin) -> Self {
        self.margin = margin;
        self
    }
}

#[derive(Clone, Debug)]
struct Node {
    constraint: Constraint,
    flow: Flow,
    children: Vec<NodeId>,
}

/// A tree of nested splits.
///
/// The root always exists and always covers the whole area passed to
/// [`LayoutTree::compute`].
#[derive(Clone, Debug)]
pub struct LayoutTree {
    nodes: Vec<Node>,
}

impl LayoutTree {
    /// Create a tree whose root splits its children with `flow`.
    pub fn new(flow: Flow) -> Self {
        Self {
            nodes: vec![Node {
                constraint: Constraint::default(),
                flow,
                children: Vec::new(),
            }],
        }
    }

    /// The root node.
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always has a root, so this is never true.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a child to `parent`, sized by `constraint`.
    ///
    /// The child splits its own children vertically until [`set_flow`](Self::set_flow)
    /// says otherwise.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this tree.
    pub fn add_child(&mut self, parent: NodeId, constraint: Constraint) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Node {
            constraint,
            flow: Flow::default(),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Change how `node` splits its children.
    pub fn set_flow(&mut self, node: NodeId, flow: Flow) {
        if let Some(n) = self.nodes.get_mut(node.index()) {
            n.flow = flow;
        }
    }

    /// The constraint `node`'s parent sizes it with.
    pub fn constraint(&self, node: NodeId) -> Option<Constraint> {
        self.nodes.get(node.index()).map(|n| n.constraint)
    }

    /// How `node` splits its children.
    pub fn flow(&self, node: NodeId) -> Option<Flow> {
        self.nodes.get(node.index()).map(|n| n.flow)
    }

    /// Children of `node` in order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.index())
            .map_or(&[], |n| n.children.as_slice())
    }

    /// Resolve every node's rectangle; the result is indexed by [`NodeId::index`].
    pub fn compute(&self, area: Rect) -> Vec<Rect> {
        let mut rects = vec![Rect::ZERO; self.nodes.len()];
        rects[0] = area;

        let mut stack = vec![self.root()];
        let mut constraints = Vec::new();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.index()];
            if node.children.is_empty() {
                continue;
            }

            constraints.clear();
            constraints.extend(node.children.iter().map(|c| self.nodes[c.index()].constraint));
            let parts = split(
                rects[id.index()],
                node.flow.direction,
                &constraints,
                node.flow.spacing,
                node.flow.margin,
            );
            for (&child, rect) in node.children.iter().zip(parts) {
                rects[child.index()] = rect;
                stack.push(child);
            }
        }
        rects
    }

    /// Node ids in pre-order: parent before children, siblings in order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.index()].children.iter().rev().copied());
        }
        order
    }
}

impl Default for LayoutTree {
    fn default() -> Self {
        Self::new(Flow::default())
    }
}
