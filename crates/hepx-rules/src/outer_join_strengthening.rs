//! # Outer-Join Strengthening Rule
//!
//! Strengthens outer joins into narrower join types when filter predicates
//! elsewhere in the plan provably reject the NULL-extended rows the weaker
//! join type would otherwise keep.
//!
//! Consider `foo(a, b)` and `bar(c, d)`:
//!
//! ```text
//! 1. FULL -> LEFT
//!      select * from foo full outer join bar on a = c where a is not null
//!    = select * from foo left outer join bar on a = c where a is not null
//!
//! 2. FULL -> INNER
//!      select * from foo full outer join bar on a = c
//!        where a is not null and c is not null
//!    = select * from foo join bar on a = c
//!
//! 3. LEFT -> INNER
//!      select * from foo left outer join bar on a = c where c is not null
//!    = select * from foo join bar on a = c
//! ```
//!
//! A predicate is treated as null-rejecting for a join column when it is any
//! comparison other than `IS NULL` whose first operand is that column:
//! `a IS NOT NULL`, `a = 1`, `a > 10` all count. No truth-table evaluation is
//! performed; the presence of such a predicate is taken as sufficient proof.
//!
//! ## How the analysis runs
//!
//! 1. Consult the session's processed-condition memo; a join condition that was
//!    already analyzed in this session is skipped outright.
//! 2. Extract equality join columns from the join's own condition: a top-level
//!    two-column equality, or the two-column equalities among the *immediate*
//!    operands of a top-level AND/OR (one level deep, no recursion). Either
//!    side empty means the optimization cannot proceed.
//! 3. Collect every Filter node in the whole plan, walking depth-first from the
//!    root and resolving `Link` passthroughs. Null-rejecting predicates may sit
//!    anywhere downstream of or beside the join, not only on its parent chain.
//!    This is a conservative syntactic scan: a filter on an unrelated sibling
//!    branch is credited too, a known soundness caveat inherited from the
//!    original design.
//! 4. Classify each collected predicate (again flattened one level through
//!    AND/OR) into per-side null-rejected column sets. A column appearing in
//!    both join-column sets (a self-join) is ambiguous and excluded from both.
//! 5. Decide: a side counts as null-rejected only when *every* equality column
//!    on that side is individually proven (partial coverage does not count).
//!    FULL+left -> LEFT, FULL+both -> INNER, LEFT+right -> INNER; everything
//!    else is unchanged. There is deliberately no FULL+right-only mirror: right
//!    outer joins are normalized away before heuristic rewriting, so the pass
//!    preserves the asymmetry rather than introduce a RIGHT join.
//!
//! The rewrite never touches the join condition or inputs; only `join_type`
//! changes. The new join is spliced into the parent's child slot and the old
//! node is superseded with a `Link`.

use hepx_core::error::{PlanError, Result};
use hepx_core::expr::{BinaryOp, ColumnRef, Expr, JoinType, UnaryOp};
use hepx_core::pattern::Pattern;
use hepx_core::plan::{NodeId, PlanArena, PlanOp};
use hepx_core::rule::{Applied, RewriteRule, RuleCall};
use hepx_core::session::Session;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Strengthen FULL and LEFT outer joins via null-rejecting filter predicates.
///
/// Matches any node with a direct Join child and analyzes each such child.
pub struct OuterJoinStrengtheningRule;

impl RewriteRule for OuterJoinStrengtheningRule {
    fn name(&self) -> &str {
        "OuterJoinStrengthening"
    }

    fn pattern(&self) -> Pattern {
        Pattern::parent_of_join()
    }

    fn apply(&self, call: &mut RuleCall<'_>) -> Result<Applied> {
        let parent = call.node;
        let mut changed = false;

        // A parent may hold several join children (e.g. a join of joins);
        // analyze each slot independently.
        let arity = call.plan.node(parent).children.len();
        for slot in 0..arity {
            let child = call.plan.resolve(call.plan.node(parent).children[slot]);
            if !matches!(call.plan.node(child).op, PlanOp::Join { .. }) {
                continue;
            }
            if strengthen(call.plan, call.session, parent, slot, child)? == Applied::Changed {
                changed = true;
            }
        }

        Ok(if changed {
            Applied::Changed
        } else {
            Applied::Unchanged
        })
    }
}

/// Analyze one (parent, join) pair and commit the rewrite if justified.
fn strengthen(
    plan: &mut PlanArena,
    session: &mut Session,
    parent: NodeId,
    slot: usize,
    join_id: NodeId,
) -> Result<Applied> {
    let (join_type, condition, semi_join_done) = match &plan.node(join_id).op {
        PlanOp::Join {
            join_type,
            condition,
            semi_join_done,
        } => (*join_type, condition.clone(), *semi_join_done),
        _ => return Ok(Applied::Unchanged),
    };

    // Memo check first: one analysis per condition signature per session,
    // regardless of how often the fixpoint loop revisits this join.
    if !session.mark_condition_analyzed(condition.signature()) {
        trace!(join = join_id, "join condition already analyzed, skipping");
        return Ok(Applied::Unchanged);
    }

    let Some((left_cols, right_cols)) = equality_join_columns(&condition) else {
        return Ok(Applied::Unchanged);
    };

    let filters = collect_filters(plan);
    if filters.is_empty() {
        return Ok(Applied::Unchanged);
    }

    let (rejected_left, rejected_right) =
        classify_null_rejection(plan, &filters, &left_cols, &right_cols);

    // A side counts only when every one of its equality columns is proven.
    let left_rejected = !rejected_left.is_empty() && left_cols.is_subset(&rejected_left);
    let right_rejected = !rejected_right.is_empty() && right_cols.is_subset(&rejected_right);
    if !left_rejected && !right_rejected {
        return Ok(Applied::Unchanged);
    }

    let new_type = match join_type {
        JoinType::Full if left_rejected && right_rejected => Some(JoinType::Inner),
        JoinType::Full if left_rejected => Some(JoinType::Left),
        // No mirrored rule for FULL with only the right side rejected.
        JoinType::Full => None,
        JoinType::Left if right_rejected => Some(JoinType::Inner),
        JoinType::Left => None,
        JoinType::Inner => None,
        other => {
            // The planner normalizes RIGHT to LEFT and routes SEMI/ANTI/CROSS
            // around this rule before heuristic rewriting; reaching here means
            // that precondition was violated.
            return Err(PlanError::UnsupportedJoinType {
                node: join_id,
                join_type: other,
            });
        }
    };
    let Some(new_type) = new_type else {
        return Ok(Applied::Unchanged);
    };

    debug!(
        join = join_id,
        from = %join_type,
        to = %new_type,
        condition = %condition,
        "strengthening outer join"
    );

    // Identical join, narrower type. Condition and inputs are never modified.
    let inputs = plan.node(join_id).children.clone();
    let replacement = plan.add(
        PlanOp::Join {
            join_type: new_type,
            condition,
            semi_join_done,
        },
        inputs,
    );
    plan.replace_child(parent, slot, replacement)?;
    plan.supersede(join_id, replacement);

    Ok(Applied::Changed)
}

/// Extract candidate equality join columns from a join condition.
///
/// The first operand of each two-column equality goes to the left set, the
/// second to the right set. A top-level AND/OR is inspected one level deep
/// only. Returns `None` when either set ends up empty.
fn equality_join_columns(condition: &Expr) -> Option<(HashSet<ColumnRef>, HashSet<ColumnRef>)> {
    let mut left = HashSet::new();
    let mut right = HashSet::new();

    match condition {
        eq @ Expr::BinaryOp {
            op: BinaryOp::Eq, ..
        } => add_equality_columns(eq, &mut left, &mut right),
        Expr::And(operands) | Expr::Or(operands) => {
            for operand in operands {
                add_equality_columns(operand, &mut left, &mut right);
            }
        }
        _ => {}
    }

    if left.is_empty() || right.is_empty() {
        None
    } else {
        Some((left, right))
    }
}

fn add_equality_columns(
    expr: &Expr,
    left: &mut HashSet<ColumnRef>,
    right: &mut HashSet<ColumnRef>,
) {
    if let Expr::BinaryOp {
        op: BinaryOp::Eq,
        left: lhs,
        right: rhs,
    } = expr
    {
        if let (Expr::Column(lc), Expr::Column(rc)) = (lhs.as_ref(), rhs.as_ref()) {
            left.insert(lc.clone());
            right.insert(rc.clone());
        }
    }
}

/// Gather every Filter node in the plan, depth-first from the root.
///
/// `Link` passthroughs are resolved before inspection, so filters behind
/// superseded nodes are still found.
fn collect_filters(plan: &PlanArena) -> Vec<NodeId> {
    let mut filters = Vec::new();
    collect_filters_from(plan, plan.root(), &mut filters);
    filters
}

fn collect_filters_from(plan: &PlanArena, id: NodeId, out: &mut Vec<NodeId>) {
    let id = plan.resolve(id);
    if matches!(plan.node(id).op, PlanOp::Filter { .. }) {
        out.push(id);
    }
    for i in 0..plan.node(id).children.len() {
        collect_filters_from(plan, plan.node(id).children[i], out);
    }
}

/// Derive the per-side null-rejected column sets from the collected filters.
fn classify_null_rejection(
    plan: &PlanArena,
    filters: &[NodeId],
    left_cols: &HashSet<ColumnRef>,
    right_cols: &HashSet<ColumnRef>,
) -> (HashSet<ColumnRef>, HashSet<ColumnRef>) {
    let mut rejected_left = HashSet::new();
    let mut rejected_right = HashSet::new();

    for &filter in filters {
        let PlanOp::Filter { predicate } = &plan.node(filter).op else {
            continue;
        };
        // Same one-level flattening policy as the join-column extraction.
        match predicate {
            Expr::And(parts) | Expr::Or(parts) => {
                for part in parts {
                    classify_candidate(part, left_cols, right_cols, &mut rejected_left, &mut rejected_right);
                }
            }
            other => {
                classify_candidate(other, left_cols, right_cols, &mut rejected_left, &mut rejected_right);
            }
        }
    }

    (rejected_left, rejected_right)
}

fn classify_candidate(
    expr: &Expr,
    left_cols: &HashSet<ColumnRef>,
    right_cols: &HashSet<ColumnRef>,
    rejected_left: &mut HashSet<ColumnRef>,
    rejected_right: &mut HashSet<ColumnRef>,
) {
    let Some(col) = null_rejecting_column(expr) else {
        return;
    };
    let on_left = left_cols.contains(col);
    let on_right = right_cols.contains(col);
    // Ambiguous columns (self-join: present on both sides) prove nothing.
    if on_left && !on_right {
        rejected_left.insert(col.clone());
    } else if on_right && !on_left {
        rejected_right.insert(col.clone());
    }
}

/// The column a predicate null-rejects, if any: the first operand of any
/// comparison or call whose operator is not `IS NULL`.
fn null_rejecting_column(expr: &Expr) -> Option<&ColumnRef> {
    match expr {
        Expr::UnaryOp {
            op: UnaryOp::IsNull,
            ..
        } => None,
        Expr::UnaryOp { operand, .. } => as_column(operand),
        Expr::BinaryOp { left, .. } => as_column(left),
        Expr::Function { args, .. } => args.first().and_then(as_column),
        _ => None,
    }
}

fn as_column(expr: &Expr) -> Option<&ColumnRef> {
    match expr {
        Expr::Column(c) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, index: u32) -> ColumnRef {
        ColumnRef {
            table: None,
            name: name.into(),
            index,
        }
    }

    fn col_expr(name: &str, index: u32) -> Expr {
        Expr::Column(col(name, index))
    }

    fn eq(l: Expr, r: Expr) -> Expr {
        Expr::BinaryOp {
            op: BinaryOp::Eq,
            left: Box::new(l),
            right: Box::new(r),
        }
    }

    #[test]
    fn test_extracts_single_equality() {
        let cond = eq(col_expr("a", 0), col_expr("c", 2));
        let (left, right) = equality_join_columns(&cond).unwrap();
        assert_eq!(left, [col("a", 0)].into_iter().collect());
        assert_eq!(right, [col("c", 2)].into_iter().collect());
    }

    #[test]
    fn test_extracts_conjunction_one_level_deep() {
        let cond = Expr::And(vec![
            eq(col_expr("a", 0), col_expr("c", 2)),
            eq(col_expr("b", 1), col_expr("d", 3)),
            // Nested combinator: not inspected.
            Expr::And(vec![eq(col_expr("x", 4), col_expr("y", 5))]),
        ]);
        let (left, right) = equality_join_columns(&cond).unwrap();
        assert_eq!(left.len(), 2);
        assert_eq!(right.len(), 2);
        assert!(!left.contains(&col("x", 4)));
    }

    #[test]
    fn test_non_column_equality_yields_nothing() {
        let cond = eq(
            col_expr("a", 0),
            Expr::Literal(hepx_core::expr::ScalarValue::Int64(1)),
        );
        assert!(equality_join_columns(&cond).is_none());
    }

    #[test]
    fn test_non_equality_condition_yields_nothing() {
        let cond = Expr::BinaryOp {
            op: BinaryOp::Lt,
            left: Box::new(col_expr("a", 0)),
            right: Box::new(col_expr("c", 2)),
        };
        assert!(equality_join_columns(&cond).is_none());
    }

    #[test]
    fn test_is_null_is_never_null_rejecting() {
        let pred = Expr::UnaryOp {
            op: UnaryOp::IsNull,
            operand: Box::new(col_expr("a", 0)),
        };
        assert!(null_rejecting_column(&pred).is_none());
    }

    #[test]
    fn test_is_not_null_and_comparisons_are_null_rejecting() {
        let is_not_null = Expr::UnaryOp {
            op: UnaryOp::IsNotNull,
            operand: Box::new(col_expr("a", 0)),
        };
        assert_eq!(null_rejecting_column(&is_not_null), Some(&col("a", 0)));

        let gt = Expr::BinaryOp {
            op: BinaryOp::Gt,
            left: Box::new(col_expr("a", 0)),
            right: Box::new(Expr::Literal(hepx_core::expr::ScalarValue::Int64(10))),
        };
        assert_eq!(null_rejecting_column(&gt), Some(&col("a", 0)));
    }

    #[test]
    fn test_ambiguous_column_excluded_from_both_sides() {
        // Self-join: column "a" appears on both sides of the join condition.
        let ambiguous: HashSet<_> = [col("a", 0)].into_iter().collect();
        let mut rejected_left = HashSet::new();
        let mut rejected_right = HashSet::new();
        let pred = Expr::UnaryOp {
            op: UnaryOp::IsNotNull,
            operand: Box::new(col_expr("a", 0)),
        };
        classify_candidate(
            &pred,
            &ambiguous,
            &ambiguous,
            &mut rejected_left,
            &mut rejected_right,
        );
        assert!(rejected_left.is_empty());
        assert!(rejected_right.is_empty());
    }
}
