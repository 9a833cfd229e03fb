//! Rewrite run metrics.
//!
//! Returned by [`CommonRulesRewriter::rewrite_with_metrics`](crate::CommonRulesRewriter::rewrite_with_metrics)
//! for profiling and for inspecting which scopes were resolved, in which
//! order, and how many actions each one applied.

use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct RewriteMetrics {
    /// Total elapsed time for the rewrite call.
    pub total: Duration,
    /// One entry per resolved boolean scope, in resolution order (innermost
    /// first, root last).
    pub scopes: Vec<ScopeMetrics>,
}

impl RewriteMetrics {
    pub fn applied(&self) -> usize {
        self.scopes.iter().map(|s| s.applied).sum()
    }
}

#[derive(Debug, Default, Clone)]
pub struct ScopeMetrics {
    /// Nesting depth of the scope; the root is 0.
    pub depth: usize,
    /// Positions in the raw sequence (boundaries not counted).
    pub positions: usize,
    /// Candidate matches deposited by the rules collection.
    pub candidates: usize,
    /// Actions the selection strategy returned and the rewriter applied.
    pub applied: usize,
    pub duration: Duration,
}
