//! # Declarative Pattern Matching for Rewrite Rules
//!
//! Each rewrite rule declares a `Pattern` describing the plan shape it can
//! transform. Before calling `apply()`, the driver checks the pattern against
//! the current node, so rules never see non-matching shapes.
//!
//! ## Pattern Language
//!
//! - `Pattern::Operator(matcher, children)`: matches a node whose operator
//!   satisfies `matcher` and whose children (in order, exact arity) match the
//!   child patterns.
//! - `Pattern::ParentOfChild(p)`: matches any node with at least one direct
//!   child matching `p`, regardless of the node's own operator or arity. This
//!   is how a rule targets "any parent of a Join" without enumerating parent
//!   kinds.
//! - `Pattern::Any`: wildcard.
//! - `Pattern::Leaf`: matches only nodes with no children (e.g., Scan).
//!
//! Child ids are resolved through `Link` passthroughs before matching, so a
//! pattern sees the current version of every node.

use crate::plan::{NodeId, PlanArena, PlanOpKind};

/// Pattern for matching plan nodes.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Match an operator with child patterns (exact arity).
    Operator(OpMatcher, Vec<Pattern>),
    /// Match any node with at least one direct child matching the inner pattern.
    ParentOfChild(Box<Pattern>),
    /// Match any subtree.
    Any,
    /// Match a leaf node (no children).
    Leaf,
}

/// Matcher for operator kinds (without data).
#[derive(Debug, Clone)]
pub enum OpMatcher {
    Op(PlanOpKind),
    AnyOp,
}

impl Pattern {
    /// Match a join with two any-children.
    pub fn join() -> Self {
        Pattern::Operator(
            OpMatcher::Op(PlanOpKind::Join),
            vec![Pattern::Any, Pattern::Any],
        )
    }

    /// Match a filter with one child.
    pub fn filter() -> Self {
        Pattern::Operator(OpMatcher::Op(PlanOpKind::Filter), vec![Pattern::Any])
    }

    /// Match a filter on top of a join.
    pub fn filter_join() -> Self {
        Pattern::Operator(OpMatcher::Op(PlanOpKind::Filter), vec![Pattern::join()])
    }

    /// Match a filter on top of another filter.
    pub fn filter_filter() -> Self {
        Pattern::Operator(OpMatcher::Op(PlanOpKind::Filter), vec![Pattern::filter()])
    }

    /// Match any node whose direct child is a join.
    pub fn parent_of_join() -> Self {
        Pattern::ParentOfChild(Box::new(Pattern::join()))
    }
}

/// Check if a plan node matches a pattern.
pub fn matches(plan: &PlanArena, node: NodeId, pattern: &Pattern) -> bool {
    let node = plan.resolve(node);
    match pattern {
        Pattern::Any => true,
        Pattern::Leaf => plan.node(node).children.is_empty(),
        Pattern::ParentOfChild(child_pattern) => plan
            .node(node)
            .children
            .iter()
            .any(|&c| matches(plan, c, child_pattern)),
        Pattern::Operator(matcher, child_patterns) => {
            let op_matches = match matcher {
                OpMatcher::Op(kind) => plan.node(node).op.kind() == *kind,
                OpMatcher::AnyOp => true,
            };
            if !op_matches {
                return false;
            }
            if plan.node(node).children.len() != child_patterns.len() {
                return false;
            }
            plan.node(node)
                .children
                .iter()
                .zip(child_patterns.iter())
                .all(|(&c, p)| matches(plan, c, p))
        }
    }
}
