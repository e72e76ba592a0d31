//! # Built-in Rewrite Rules
//!
//! This crate provides the default set of rewrite rules for the heuristic
//! fixpoint driver in `hepx-core`:
//!
//! - **`OuterJoinStrengtheningRule`**: Narrows FULL and LEFT outer joins
//!   (FULL -> LEFT, FULL -> INNER, LEFT -> INNER) when filter predicates in
//!   the plan provably reject the NULL-extended rows the weaker join type
//!   would keep.
//! - **`FilterMergeRule`**: Fuses adjacent Filter nodes into one conjunction.
//! - **`PredicatePushdownRule`**: Merges a Filter into the Inner join directly
//!   beneath it.

pub mod filter_merge;
pub mod outer_join_strengthening;
pub mod predicate_pushdown;

use hepx_core::rule::RuleRegistry;

/// Create a default rule registry with all built-in rules.
///
/// Registration order is application order per node. Strengthening runs
/// first: predicate pushdown consumes the very filters whose null-rejecting
/// predicates the strengthening analysis reads, so it must not get there
/// before the join types are settled.
pub fn default_rule_registry() -> RuleRegistry {
    let mut registry = RuleRegistry::new();

    registry.add_rule(Box::new(
        outer_join_strengthening::OuterJoinStrengtheningRule,
    ));
    registry.add_rule(Box::new(filter_merge::FilterMergeRule));
    registry.add_rule(Box::new(predicate_pushdown::PredicatePushdownRule));

    registry
}
