//! Selection strategies.
//!
//! A rules collection reports *every* candidate match of a sequence. A
//! selection strategy turns those candidates into the final, ordered list of
//! actions that the rewriter applies without second-guessing:
//!
//! ```text
//! create_collector() ──▶ collector ◀── collect(action) × n   (rules collection)
//!                            │
//!                        evaluate() ──▶ Vec<Action>          (rewriter applies in order)
//! ```
//!
//! Bundled policies:
//!
//! - [`FlatSelectionStrategy`]: apply every candidate, in rule declaration order.
//! - [`CriteriaSelectionStrategy`]: filter by rule properties, sort, limit.
//! - [`NonOverlappingSelectionStrategy`]: longest match wins, no two accepted
//!   spans overlap.

#[path = "select/criteria.rs"]
mod criteria;
#[path = "select/flat.rs"]
mod flat;
#[path = "select/non_overlapping.rs"]
mod non_overlapping;
#[cfg(test)]
#[path = "select/test_support.rs"]
pub(crate) mod test_support;

pub use criteria::{CriteriaSelectionStrategy, Direction, Filter, Limit, Sorting};
pub use flat::FlatSelectionStrategy;
pub use non_overlapping::NonOverlappingSelectionStrategy;

use crate::error::Result;
use crate::rules::Action;
use std::fmt;

/// Per-sequence sink for candidate actions.
pub trait ActionCollector {
    fn collect(&mut self, action: Action);

    /// Number of candidates deposited so far, including any the strategy will drop.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve the candidates into the actions to apply, in application order.
    fn evaluate(self: Box<Self>) -> Result<Vec<Action>>;
}

/// Policy object shared by all rewrite calls of a rewriter.
pub trait SelectionStrategy: fmt::Debug + Send + Sync {
    /// A fresh collector for one sequence resolution.
    fn create_collector(&self) -> Box<dyn ActionCollector>;
}
