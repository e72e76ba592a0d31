//! # Heuristic Fixpoint Driver
//!
//! The driver walks the plan arena depth-first and fires every registered rule
//! whose pattern matches the current node. When any rule commits a rewrite, the
//! whole plan is requeued: the driver runs another full pass so new shapes
//! created by one rule become visible to the others. The loop terminates when a
//! complete pass makes no change (the fixpoint) or when the iteration budget is
//! exhausted.
//!
//! One invocation runs to completion on the calling thread: no I/O, no locks,
//! no suspension points. The caller must guarantee exclusive access to the plan
//! for the duration of the call and must supply a `Session` that is not shared
//! with any concurrently optimizing plan.

use crate::error::Result;
use crate::pattern::matches;
use crate::plan::PlanArena;
use crate::rule::{Applied, RuleCall, RuleRegistry};
use crate::session::Session;
use std::sync::Arc;
use tracing::{debug, trace};

/// Configuration knobs for the fixpoint loop.
///
/// Rewrite rules are expected to converge on their own (the strengthening
/// rule, for example, memoizes analyzed conditions). The budgets are safety
/// valves against a misbehaving rule set, not tuning parameters.
pub struct DriverConfig {
    /// Upper bound on full passes over the plan.
    pub max_passes: usize,
    /// Upper bound on total rule applications across all passes.
    pub max_applications: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_passes: 100,
            max_applications: 10_000,
        }
    }
}

/// The heuristic rewrite driver.
pub struct HepDriver {
    /// Registry of rewrite rules, tried in registration order on each node.
    pub rule_registry: Arc<RuleRegistry>,
    /// Budgets for the fixpoint loop.
    pub config: DriverConfig,
}

impl HepDriver {
    pub fn new(rule_registry: Arc<RuleRegistry>, config: DriverConfig) -> Self {
        Self {
            rule_registry,
            config,
        }
    }

    /// Drive the plan to a fixpoint. Returns whether any rule changed the plan.
    pub fn run(&self, plan: &mut PlanArena, session: &mut Session) -> Result<bool> {
        let mut changed_any = false;
        let mut applications = 0usize;

        for pass in 0..self.config.max_passes {
            let mut changed_this_pass = false;

            // Snapshot the traversal order up front; rewrites during the pass
            // leave Link nodes behind, so stale ids resolve to replacements.
            let order = plan.dfs();
            trace!(pass, nodes = order.len(), "starting rewrite pass");

            for node in order {
                for rule in self.rule_registry.rules() {
                    // Re-resolve before every rule: an earlier rule in this
                    // visit may have superseded the node.
                    let node = plan.resolve(node);
                    if applications >= self.config.max_applications {
                        debug!(applications, "hit rule application budget");
                        return Ok(changed_any);
                    }
                    if !matches(plan, node, &rule.pattern()) {
                        continue;
                    }
                    applications += 1;
                    trace!(rule = rule.name(), node, "applying rewrite rule");

                    let mut call = RuleCall {
                        plan: &mut *plan,
                        node,
                        session: &mut *session,
                    };
                    if rule.apply(&mut call)? == Applied::Changed {
                        debug!(rule = rule.name(), node, "plan rewritten, requeued");
                        changed_this_pass = true;
                        changed_any = true;
                    }
                }
            }

            if !changed_this_pass {
                debug!(pass, applications, "fixpoint reached");
                break;
            }
        }

        Ok(changed_any)
    }
}
