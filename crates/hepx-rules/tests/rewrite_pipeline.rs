//! End-to-end test of the default rule registry: strengthening, filter
//! merging and predicate pushdown cooperating in one fixpoint run.

use hepx_core::driver::{DriverConfig, HepDriver};
use hepx_core::expr::{BinaryOp, ColumnRef, Expr, JoinType, TableRef, UnaryOp};
use hepx_core::plan::{NodeId, PlanArena, PlanOp};
use hepx_core::session::Session;
use std::sync::Arc;

fn col(table: &str, name: &str, index: u32) -> ColumnRef {
    ColumnRef {
        table: Some(table.into()),
        name: name.into(),
        index,
    }
}

fn eq(l: ColumnRef, r: ColumnRef) -> Expr {
    Expr::BinaryOp {
        op: BinaryOp::Eq,
        left: Box::new(Expr::Column(l)),
        right: Box::new(Expr::Column(r)),
    }
}

fn is_not_null(c: ColumnRef) -> Expr {
    Expr::UnaryOp {
        op: UnaryOp::IsNotNull,
        operand: Box::new(Expr::Column(c)),
    }
}

fn scan(plan: &mut PlanArena, name: &str) -> NodeId {
    plan.add(
        PlanOp::Scan {
            table: TableRef {
                schema: "test".into(),
                name: name.into(),
            },
            columns: vec![],
        },
        vec![],
    )
}

fn default_driver() -> HepDriver {
    HepDriver::new(
        Arc::new(hepx_rules::default_rule_registry()),
        DriverConfig::default(),
    )
}

#[test]
fn test_left_join_strengthens_then_filter_is_absorbed() {
    // select * from foo left outer join bar on a = c where c is not null
    //
    // Strengthening turns the join INNER; pushdown then merges the filter
    // into the (now inner) join condition.
    let mut plan = PlanArena::new();
    let foo = scan(&mut plan, "foo");
    let bar = scan(&mut plan, "bar");
    let join = plan.add(
        PlanOp::Join {
            join_type: JoinType::Left,
            condition: eq(col("foo", "a", 0), col("bar", "c", 2)),
            semi_join_done: false,
        },
        vec![foo, bar],
    );
    let filter = plan.add(
        PlanOp::Filter {
            predicate: is_not_null(col("bar", "c", 2)),
        },
        vec![join],
    );
    let root = plan.add(
        PlanOp::Project {
            exprs: vec![],
            aliases: vec![],
        },
        vec![filter],
    );
    plan.set_root(root);

    let changed = default_driver()
        .run(&mut plan, &mut Session::new())
        .unwrap();
    println!("{}", plan.display());
    assert!(changed);

    let top = plan.resolve(plan.node(plan.root()).children[0]);
    let PlanOp::Join {
        join_type,
        condition,
        ..
    } = &plan.node(top).op
    else {
        panic!("filter should have been absorbed into the join");
    };
    assert_eq!(*join_type, JoinType::Inner);
    assert_eq!(condition.conjuncts().len(), 2);
}

#[test]
fn test_filter_stack_fuses_and_strengthens_full_join() {
    // Two stacked filters prove both sides non-null; after fusing, the FULL
    // join is strengthened all the way to INNER.
    let mut plan = PlanArena::new();
    let foo = scan(&mut plan, "foo");
    let bar = scan(&mut plan, "bar");
    let join = plan.add(
        PlanOp::Join {
            join_type: JoinType::Full,
            condition: eq(col("foo", "a", 0), col("bar", "c", 2)),
            semi_join_done: false,
        },
        vec![foo, bar],
    );
    let f1 = plan.add(
        PlanOp::Filter {
            predicate: is_not_null(col("bar", "c", 2)),
        },
        vec![join],
    );
    let f2 = plan.add(
        PlanOp::Filter {
            predicate: is_not_null(col("foo", "a", 0)),
        },
        vec![f1],
    );
    let root = plan.add(
        PlanOp::Project {
            exprs: vec![],
            aliases: vec![],
        },
        vec![f2],
    );
    plan.set_root(root);

    let changed = default_driver()
        .run(&mut plan, &mut Session::new())
        .unwrap();
    println!("{}", plan.display());
    assert!(changed);

    // The join ends up INNER; with the default registry the fused filter is
    // then pushed into its condition as well.
    let top = plan.resolve(plan.node(plan.root()).children[0]);
    let PlanOp::Join { join_type, .. } = &plan.node(top).op else {
        panic!("expected the join directly under the project");
    };
    assert_eq!(*join_type, JoinType::Inner);
}

#[test]
fn test_outer_join_pipeline_leaves_filter_in_place() {
    // FULL -> LEFT strengthening, but pushdown must not merge the filter into
    // an outer join.
    let mut plan = PlanArena::new();
    let foo = scan(&mut plan, "foo");
    let bar = scan(&mut plan, "bar");
    let join = plan.add(
        PlanOp::Join {
            join_type: JoinType::Full,
            condition: eq(col("foo", "a", 0), col("bar", "c", 2)),
            semi_join_done: false,
        },
        vec![foo, bar],
    );
    let filter = plan.add(
        PlanOp::Filter {
            predicate: is_not_null(col("foo", "a", 0)),
        },
        vec![join],
    );
    let root = plan.add(
        PlanOp::Project {
            exprs: vec![],
            aliases: vec![],
        },
        vec![filter],
    );
    plan.set_root(root);

    let changed = default_driver()
        .run(&mut plan, &mut Session::new())
        .unwrap();
    assert!(changed);

    let top = plan.resolve(plan.node(plan.root()).children[0]);
    assert!(
        matches!(plan.node(top).op, PlanOp::Filter { .. }),
        "filter over an outer join must stay in place"
    );
    let strengthened = plan.resolve(plan.node(top).children[0]);
    let PlanOp::Join { join_type, .. } = &plan.node(strengthened).op else {
        panic!("expected a join under the filter");
    };
    assert_eq!(*join_type, JoinType::Left);
}
