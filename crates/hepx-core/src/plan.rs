//! # Arena-Based Logical Plan
//!
//! The plan is a tree of operator nodes stored in an arena (`Vec`-backed) and
//! addressed by `NodeId`. Children are referenced by index, so "replace a
//! parent's input" is a single slot assignment -- no aliasing hazards when the
//! driver's worklist revisits nodes after a rewrite.
//!
//! ## Supersession and `Link` nodes
//!
//! The arena is append-only. When a rule replaces a node, it adds the
//! replacement, writes the new index into the parent's child slot, and turns
//! the old node into a `Link` pointing at the replacement. Any stale `NodeId`
//! held elsewhere (worklists, sibling references) then resolves transparently
//! through [`PlanArena::resolve`]. Traversals must resolve ids before
//! inspecting operator kinds.
//!
//! ## Operator vocabulary
//!
//! `PlanOp` is a closed tagged-variant over the operator kinds the rewriter
//! recognizes. Operators outside that vocabulary are carried as `Opaque`
//! nodes: traversal descends through them, but no rule inspects or rewrites
//! them (the "default arm" of every match).

use crate::error::{PlanError, Result};
use crate::expr::{ColumnRef, Expr, JoinType, TableRef};
use serde::{Deserialize, Serialize};

/// Index of a node in the plan arena.
pub type NodeId = u32;

/// A logical plan operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanOp {
    /// Table scan: reads rows from a base table. Always a leaf node.
    Scan {
        table: TableRef,
        columns: Vec<ColumnRef>,
    },
    /// Filter: applies a predicate to its single child.
    Filter { predicate: Expr },
    /// Projection: computes output expressions from its child's columns.
    Project { exprs: Vec<Expr>, aliases: Vec<String> },
    /// Join: combines two child relations using the given join type and
    /// condition. `semi_join_done` records that a semi-join conversion pass
    /// already visited this join; rewrites must carry it through unchanged.
    Join {
        join_type: JoinType,
        condition: Expr,
        semi_join_done: bool,
    },
    /// Passthrough to the current version of a superseded node (single child).
    Link,
    /// An operator outside the rewriter's vocabulary, carried untouched.
    Opaque { name: String },
}

/// Kind discriminant for pattern matching (without data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanOpKind {
    Scan,
    Filter,
    Project,
    Join,
    Link,
    Opaque,
}

impl PlanOp {
    pub fn kind(&self) -> PlanOpKind {
        match self {
            PlanOp::Scan { .. } => PlanOpKind::Scan,
            PlanOp::Filter { .. } => PlanOpKind::Filter,
            PlanOp::Project { .. } => PlanOpKind::Project,
            PlanOp::Join { .. } => PlanOpKind::Join,
            PlanOp::Link => PlanOpKind::Link,
            PlanOp::Opaque { .. } => PlanOpKind::Opaque,
        }
    }
}

/// A node in the plan arena: an operator plus the ids of its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanNode {
    pub op: PlanOp,
    pub children: Vec<NodeId>,
}

/// The plan arena.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanArena {
    nodes: Vec<PlanNode>,
    root: NodeId,
}

impl PlanArena {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: 0,
        }
    }

    /// Add a node and return its id. Children must already be in the arena.
    pub fn add(&mut self, op: PlanOp, children: Vec<NodeId>) -> NodeId {
        debug_assert!(children.iter().all(|&c| (c as usize) < self.nodes.len()));
        let id = self.nodes.len() as NodeId;
        self.nodes.push(PlanNode { op, children });
        id
    }

    /// Set the root of the plan.
    pub fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    /// Current top of the plan, with any `Link` indirection resolved.
    pub fn root(&self) -> NodeId {
        self.resolve(self.root)
    }

    pub fn node(&self, id: NodeId) -> &PlanNode {
        &self.nodes[id as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut PlanNode {
        &mut self.nodes[id as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Follow `Link` passthroughs to the current version of a node.
    ///
    /// Links always point at nodes added after them, so chains are finite.
    pub fn resolve(&self, mut id: NodeId) -> NodeId {
        while let PlanNode {
            op: PlanOp::Link,
            children,
        } = self.node(id)
        {
            id = children[0];
        }
        id
    }

    /// Replace the child of `parent` at position `slot` with `new_child`.
    ///
    /// An out-of-range slot means the caller and the plan disagree about the
    /// parent's arity -- a host-contract violation, reported as a hard error.
    pub fn replace_child(&mut self, parent: NodeId, slot: usize, new_child: NodeId) -> Result<()> {
        if (parent as usize) >= self.nodes.len() {
            return Err(PlanError::UnknownNode(parent));
        }
        let arity = self.node(parent).children.len();
        if slot >= arity {
            return Err(PlanError::ChildSlotOutOfRange {
                node: parent,
                slot,
                arity,
            });
        }
        self.node_mut(parent).children[slot] = new_child;
        Ok(())
    }

    /// Turn `old` into a `Link` pointing at `new`, so stale references to `old`
    /// resolve to the replacement.
    pub fn supersede(&mut self, old: NodeId, new: NodeId) {
        let node = self.node_mut(old);
        node.op = PlanOp::Link;
        node.children = vec![new];
    }

    /// Depth-first preorder traversal from the root, with `Link` nodes
    /// resolved away. Every reachable non-link node appears exactly once per
    /// occurrence in the tree.
    pub fn dfs(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        self.dfs_from(self.root(), &mut order);
        order
    }

    fn dfs_from(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let id = self.resolve(id);
        out.push(id);
        for i in 0..self.node(id).children.len() {
            self.dfs_from(self.node(id).children[i], out);
        }
    }

    /// Render the plan as an indented tree, for logs and test output.
    pub fn display(&self) -> String {
        let mut out = String::new();
        self.display_node(self.root(), 0, &mut out);
        out
    }

    fn display_node(&self, id: NodeId, indent: usize, out: &mut String) {
        let id = self.resolve(id);
        let pad = "  ".repeat(indent);
        let line = match &self.node(id).op {
            PlanOp::Scan { table, .. } => format!("Scan({})", table),
            PlanOp::Filter { predicate } => format!("Filter({})", predicate),
            PlanOp::Project { exprs, .. } => format!("Project({} exprs)", exprs.len()),
            PlanOp::Join {
                join_type,
                condition,
                ..
            } => format!("{} Join({})", join_type, condition),
            PlanOp::Link => "Link".to_string(),
            PlanOp::Opaque { name } => format!("Opaque({})", name),
        };
        out.push_str(&pad);
        out.push_str(&line);
        out.push('\n');
        for i in 0..self.node(id).children.len() {
            self.display_node(self.node(id).children[i], indent + 1, out);
        }
    }
}
