//! Rule-based query rewriting.
//!
//! A [`CommonRulesRewriter`] walks the boolean structure of an
//! [`ExpandedQuery`], builds one position sequence per boolean scope, looks
//! each sequence up in a [`RulesCollection`], lets a [`SelectionStrategy`]
//! decide which matches fire, and applies the instructions of those rules to
//! the query in place.
//!
//! ```text
//! ExpandedQuery ──▶ CommonRulesRewriter ──▶ RulesCollection ──▶ SelectionStrategy
//!       ▲                   │                 (candidates)        (ordered actions)
//!       └──── Instruction::apply ◀───────────────────────────────────────┘
//! ```
//!
//! Instructions are supplied by the host through the [`Instruction`] trait;
//! this crate only provides the machinery that decides *where* and *when*
//! they run.

#[macro_use]
mod macros;
mod context;
mod error;
mod model;
mod rewriter;
mod rules;
mod select;

pub use context::{
    APPLIED_RULES, CONTEXT_KEY_DEBUG_DATA, CONTEXT_KEY_DEBUG_ENABLED, ContextValue, InfoLogRecord, InfoLoggingContext,
    RewriteContext,
};
pub use error::{Result, RewriteError, RuleError};
pub use model::{
    BooleanClause, BooleanQuery, BoostQuery, DisjunctionClause, DisjunctionMaxQuery, ExpandedQuery, FilterQuery,
    NodeId, NodeKey, NodeRef, Occur, Term, TermId, UserQuery,
};
pub use rewriter::{
    Boundary, CommonRulesRewriter, ContextAwareQueryRewriter, InputElement, InputSequence, PositionSequence,
    QueryRewriter, RewriteChain, RewriteMetrics, ScopeMetrics, add_boundaries, to_input_sequence,
};
pub use rules::{
    Action, Anchors, Input, InputToken, Instruction, Instructions, PROPERTY_ID, PROPERTY_LOG_MESSAGE,
    PROPERTY_PRIORITY, Properties, PropertyValue, Rule, RulesCollection, RulesCollectionBuilder, TermMatch,
    TrieRulesCollection,
};
pub use select::{
    ActionCollector, CriteriaSelectionStrategy, Direction, Filter, FlatSelectionStrategy, Limit,
    NonOverlappingSelectionStrategy, SelectionStrategy, Sorting,
};
