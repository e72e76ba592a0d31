//! # hepx-core: Heuristic Plan-Rewrite Engine
//!
//! This crate implements the core data structures and the fixpoint driver for a
//! heuristic (rule-based) query plan rewriter. Unlike a cost-based search, the
//! engine applies correctness-preserving rewrites in place until no rule fires.
//!
//! ## Module Overview
//!
//! - **`plan`**: The arena-based logical plan -- nodes addressed by index, with
//!   child replacement by slot assignment and `Link` passthroughs for superseded nodes.
//! - **`expr`**: Scalar expression trees (column references, comparisons, AND/OR,
//!   null checks) and join type definitions.
//! - **`pattern`**: Declarative pattern matching for rule applicability checks.
//! - **`rule`**: The RewriteRule trait and RuleRegistry for in-place rewrite rules.
//! - **`driver`**: The depth-first fixpoint loop that fires rules until quiescence.
//! - **`session`**: Session-scoped optimization state (the processed-condition memo).
//! - **`error`**: Hard-failure error type for host-contract violations.

pub mod driver;
pub mod error;
pub mod expr;
pub mod pattern;
pub mod plan;
pub mod rule;
pub mod session;
