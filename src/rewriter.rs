//! The rewriting core.
//!
//! ## How the parts work together
//!
//! ```text
//! ExpandedQuery ──▶ Traversal (traversal.rs)
//!                     - one PositionSequence per boolean scope (stack)
//!                     - scopes resolved innermost first
//!                            │ pop
//!                            v
//!                   apply_sequence (apply.rs)
//!                     - root: add_boundaries / nested: to_input_sequence (sequence.rs)
//!                     - RulesCollection deposits candidates into a collector
//!                     - SelectionStrategy's collector evaluates to actions
//!                     - instructions applied in order, debug + audit logging
//!                            │
//!                            v
//!                   root emptied but boost/filter clauses present
//!                     └─▶ user query becomes MatchAll
//! ```
//!
//! ## Responsibilities by module
//!
//! - `sequence.rs`: position sequences, boundaries, lookup input.
//! - `traversal.rs`: the per-call state and the depth-first walk.
//! - `apply.rs`: lookup, selection, instruction application, logging.
//! - `common_rules.rs`: [`CommonRulesRewriter`] and the rewriter traits.
//! - `chain.rs`: [`RewriteChain`], running several rewriters in sequence.
//! - `metrics.rs`: optional timing and per-scope counts.
//!
//! ## Debugging
//!
//! Scope resolution is reported at `debug` level and every applied action at
//! `trace` level through `tracing`; install a subscriber to see them.

#[path = "rewriter/apply.rs"]
mod apply;
#[path = "rewriter/chain.rs"]
mod chain;
#[path = "rewriter/common_rules.rs"]
mod common_rules;
#[path = "rewriter/metrics.rs"]
mod metrics;
#[path = "rewriter/sequence.rs"]
mod sequence;
#[path = "rewriter/traversal.rs"]
mod traversal;


pub use chain::RewriteChain;
pub use common_rules::{CommonRulesRewriter, ContextAwareQueryRewriter, QueryRewriter};
pub use metrics::{RewriteMetrics, ScopeMetrics};
pub use sequence::{Boundary, InputElement, InputSequence, PositionSequence, add_boundaries, to_input_sequence};
