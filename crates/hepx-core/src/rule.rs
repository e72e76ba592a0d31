//! # Rewrite Rule System
//!
//! A `RewriteRule` commits a correctness-preserving rewrite directly to the
//! plan arena. Each rule declares a `Pattern`; the driver fires `apply()` only
//! on nodes that match, handing the rule a `RuleCall` with mutable access to
//! the plan and the session state.
//!
//! ## Applicability vs. failure
//!
//! `apply()` distinguishes three outcomes:
//!
//! - `Ok(Applied::Changed)`: the rule rewrote the plan in place. The driver
//!   requeues the plan for further matching.
//! - `Ok(Applied::Unchanged)`: the rule was not applicable (wrong condition
//!   shape, nothing to prove, already memoized). Never an error.
//! - `Err(_)`: the host planner violated a precondition. Propagates and aborts.
//!
//! ## Registry
//!
//! `RuleRegistry` collects rules in registration order, which is also the
//! order the driver tries them on each node. Order matters when one rule
//! consumes evidence another reads (see the default registry in `hepx-rules`).

use crate::error::Result;
use crate::pattern::Pattern;
use crate::plan::{NodeId, PlanArena};
use crate::session::Session;

/// Outcome of a rule application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The plan was rewritten in place; requeue for further matching.
    Changed,
    /// The rule was not applicable here.
    Unchanged,
}

/// Context passed to rules during application.
pub struct RuleCall<'a> {
    /// The plan under optimization. Rules mutate it in place.
    pub plan: &'a mut PlanArena,
    /// The matched node (already resolved through any `Link`).
    pub node: NodeId,
    /// Session-scoped state, including the processed-condition memo.
    pub session: &'a mut Session,
}

/// A rule rewrites matching plan nodes in place.
pub trait RewriteRule: Send + Sync {
    /// Unique name of this rule.
    fn name(&self) -> &str;

    /// Pattern that this rule matches against.
    fn pattern(&self) -> Pattern;

    /// Apply the rule to a matching node.
    fn apply(&self, call: &mut RuleCall<'_>) -> Result<Applied>;
}

/// Registry of rewrite rules, tried in registration order.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Box<dyn RewriteRule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, rule: Box<dyn RewriteRule>) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Box<dyn RewriteRule>] {
        &self.rules
    }
}
