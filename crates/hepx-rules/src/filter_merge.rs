//! # Filter Merge Rule
//!
//! Fuses a Filter sitting directly on another Filter into a single Filter
//! whose predicate is the conjunction of both. Besides removing a node, this
//! normalizes filter stacks so that later analyses (null-rejection
//! classification, pushdown) see one predicate per filter site.
//!
//! ```text
//! Before: Filter(p1, Filter(p2, X))
//! After:  Filter(p1 AND p2, X)
//! ```

use hepx_core::error::Result;
use hepx_core::expr::Expr;
use hepx_core::pattern::Pattern;
use hepx_core::plan::PlanOp;
use hepx_core::rule::{Applied, RewriteRule, RuleCall};
use tracing::debug;

/// Fuse adjacent filters into one conjunction.
pub struct FilterMergeRule;

impl RewriteRule for FilterMergeRule {
    fn name(&self) -> &str {
        "FilterMerge"
    }

    fn pattern(&self) -> Pattern {
        Pattern::filter_filter()
    }

    fn apply(&self, call: &mut RuleCall<'_>) -> Result<Applied> {
        let outer = call.node;
        let PlanOp::Filter { predicate } = &call.plan.node(outer).op else {
            return Ok(Applied::Unchanged);
        };
        let outer_pred = predicate.clone();

        let inner = call.plan.resolve(call.plan.node(outer).children[0]);
        let PlanOp::Filter { predicate } = &call.plan.node(inner).op else {
            return Ok(Applied::Unchanged);
        };
        let inner_pred = predicate.clone();

        let mut conjuncts: Vec<Expr> = outer_pred.conjuncts().into_iter().cloned().collect();
        conjuncts.extend(inner_pred.conjuncts().into_iter().cloned());
        let merged = Expr::and(conjuncts);

        debug!(outer, inner, predicate = %merged, "fusing adjacent filters");

        let grandchildren = call.plan.node(inner).children.clone();
        let replacement = call
            .plan
            .add(PlanOp::Filter { predicate: merged }, grandchildren);
        call.plan.supersede(outer, replacement);
        call.plan.supersede(inner, replacement);
        Ok(Applied::Changed)
    }
}
