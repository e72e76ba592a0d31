//! Hard-failure errors for the rewrite engine.
//!
//! Rules never fail on shapes they merely cannot classify -- those are silent
//! no-ops. An error here means the host planner handed the engine a plan that
//! violates its own contract (a dangling node id, a child slot that does not
//! exist, a strengthening candidate with a join type the planner was supposed
//! to have normalized away). Such violations propagate with `?` and abort the
//! optimization.

use crate::expr::JoinType;
use crate::plan::NodeId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("node id {0} does not exist in the plan arena")]
    UnknownNode(NodeId),

    #[error("child slot {slot} out of range for node {node} with {arity} children")]
    ChildSlotOutOfRange {
        node: NodeId,
        slot: usize,
        arity: usize,
    },

    #[error("join node {node} reports unsupported join type {join_type}")]
    UnsupportedJoinType { node: NodeId, join_type: JoinType },
}

pub type Result<T, E = PlanError> = std::result::Result<T, E>;
