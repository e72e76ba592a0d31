//! # Session-Scoped Optimization State
//!
//! A `Session` owns the mutable state that persists across rule invocations
//! within one optimization run, most importantly the processed-join-condition
//! memo. The driver revisits nodes repeatedly while chasing a fixpoint; the
//! memo makes re-analysis of an already-seen join condition an O(1) no-op.
//!
//! Each independent optimization owns its own `Session` -- the state is passed
//! explicitly into every rule call, never shared through a global. A session
//! must be `reset()` (or freshly constructed) before optimizing a new plan:
//! stale memo entries silently suppress valid rewrites.

use std::collections::HashSet;

/// Per-optimization mutable state shared across rule invocations.
#[derive(Debug, Default)]
pub struct Session {
    /// Normalized signatures of join conditions already analyzed for
    /// strengthening. Presence means "evaluated, skip".
    analyzed_conditions: HashSet<u64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new optimization session, discarding all memoized state.
    pub fn reset(&mut self) {
        self.analyzed_conditions.clear();
    }

    /// Whether the condition with this signature was already analyzed.
    pub fn condition_analyzed(&self, signature: u64) -> bool {
        self.analyzed_conditions.contains(&signature)
    }

    /// Record a condition signature as analyzed. Returns `true` if this is the
    /// first time the signature is seen in this session.
    pub fn mark_condition_analyzed(&mut self, signature: u64) -> bool {
        self.analyzed_conditions.insert(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memo_marks_once_per_session() {
        let mut session = Session::new();
        assert!(session.mark_condition_analyzed(42));
        assert!(!session.mark_condition_analyzed(42));
        assert!(session.condition_analyzed(42));
    }

    #[test]
    fn test_reset_allows_reanalysis() {
        let mut session = Session::new();
        session.mark_condition_analyzed(42);
        session.reset();
        assert!(!session.condition_analyzed(42));
        assert!(session.mark_condition_analyzed(42));
    }
}
