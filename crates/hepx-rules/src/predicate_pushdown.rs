//! # Predicate Pushdown Rule
//!
//! Merges a Filter's predicate into the condition of the Inner join directly
//! beneath it, letting the join evaluate the predicate during execution
//! instead of in a separate pass afterward.
//!
//! ```text
//! Before: Filter(pred, Join(A, B, cond))
//! After:  Join(A, B, cond AND pred)
//! ```
//!
//! Only Inner and Cross joins qualify. For an outer join, rows that fail the
//! merged condition would be NULL-extended instead of dropped, changing the
//! result; those filters are left in place (and remain visible to the
//! outer-join strengthening analysis).

use hepx_core::error::Result;
use hepx_core::expr::{Expr, JoinType};
use hepx_core::pattern::Pattern;
use hepx_core::plan::PlanOp;
use hepx_core::rule::{Applied, RewriteRule, RuleCall};
use tracing::debug;

/// Push filter predicates into inner-join conditions.
pub struct PredicatePushdownRule;

impl RewriteRule for PredicatePushdownRule {
    fn name(&self) -> &str {
        "PredicatePushdown"
    }

    fn pattern(&self) -> Pattern {
        Pattern::filter_join()
    }

    fn apply(&self, call: &mut RuleCall<'_>) -> Result<Applied> {
        let filter = call.node;
        let PlanOp::Filter { predicate } = &call.plan.node(filter).op else {
            return Ok(Applied::Unchanged);
        };
        let predicate = predicate.clone();

        let join = call.plan.resolve(call.plan.node(filter).children[0]);
        let (join_type, condition, semi_join_done) = match &call.plan.node(join).op {
            PlanOp::Join {
                join_type,
                condition,
                semi_join_done,
            } => (*join_type, condition.clone(), *semi_join_done),
            _ => return Ok(Applied::Unchanged),
        };
        if !matches!(join_type, JoinType::Inner | JoinType::Cross) {
            return Ok(Applied::Unchanged);
        }

        let mut conjuncts: Vec<Expr> = condition.conjuncts().into_iter().cloned().collect();
        conjuncts.extend(predicate.conjuncts().into_iter().cloned());
        let merged = Expr::and(conjuncts);

        debug!(filter, join, condition = %merged, "merging filter into join condition");

        // A cross join gains a real condition and becomes an inner join.
        let inputs = call.plan.node(join).children.clone();
        let replacement = call.plan.add(
            PlanOp::Join {
                join_type: JoinType::Inner,
                condition: merged,
                semi_join_done,
            },
            inputs,
        );
        call.plan.supersede(filter, replacement);
        call.plan.supersede(join, replacement);
        Ok(Applied::Changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hepx_core::expr::{BinaryOp, ColumnRef, TableRef, UnaryOp};
    use hepx_core::plan::{NodeId, PlanArena};
    use hepx_core::session::Session;

    fn filter_over_join(join_type: JoinType) -> (PlanArena, NodeId) {
        let mut plan = PlanArena::new();
        let mut scan = |plan: &mut PlanArena, name: &str| {
            plan.add(
                PlanOp::Scan {
                    table: TableRef {
                        schema: "t".into(),
                        name: name.into(),
                    },
                    columns: vec![],
                },
                vec![],
            )
        };
        let foo = scan(&mut plan, "foo");
        let bar = scan(&mut plan, "bar");
        let cond = Expr::BinaryOp {
            op: BinaryOp::Eq,
            left: Box::new(Expr::Column(ColumnRef {
                table: None,
                name: "a".into(),
                index: 0,
            })),
            right: Box::new(Expr::Column(ColumnRef {
                table: None,
                name: "c".into(),
                index: 2,
            })),
        };
        let join = plan.add(
            PlanOp::Join {
                join_type,
                condition: cond,
                semi_join_done: false,
            },
            vec![foo, bar],
        );
        let filter = plan.add(
            PlanOp::Filter {
                predicate: Expr::UnaryOp {
                    op: UnaryOp::IsNotNull,
                    operand: Box::new(Expr::Column(ColumnRef {
                        table: None,
                        name: "a".into(),
                        index: 0,
                    })),
                },
            },
            vec![join],
        );
        plan.set_root(filter);
        (plan, filter)
    }

    #[test]
    fn test_inner_join_absorbs_filter() {
        let (mut plan, filter) = filter_over_join(JoinType::Inner);
        let mut session = Session::new();
        let mut call = RuleCall {
            plan: &mut plan,
            node: filter,
            session: &mut session,
        };
        let applied = PredicatePushdownRule.apply(&mut call).unwrap();
        assert_eq!(applied, Applied::Changed);

        let root = plan.root();
        let PlanOp::Join { condition, .. } = &plan.node(root).op else {
            panic!("expected join at root after pushdown");
        };
        assert_eq!(condition.conjuncts().len(), 2);
    }

    #[test]
    fn test_outer_join_filter_left_in_place() {
        let (mut plan, filter) = filter_over_join(JoinType::Left);
        let mut session = Session::new();
        let mut call = RuleCall {
            plan: &mut plan,
            node: filter,
            session: &mut session,
        };
        let applied = PredicatePushdownRule.apply(&mut call).unwrap();
        assert_eq!(applied, Applied::Unchanged);
        assert!(matches!(plan.node(plan.root()).op, PlanOp::Filter { .. }));
    }
}
