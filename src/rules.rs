//! Rules: what a rule does ([`Instructions`]), what a match of it looks like
//! ([`Action`]), and where matches come from ([`RulesCollection`]).
//!
//! The rewriter only depends on the [`RulesCollection`] lookup contract: given
//! an input sequence, deposit every match the collection recognizes into the
//! collector. No deposit order is promised; ordering and conflict resolution
//! belong to the selection strategy (see `select.rs`).
//!
//! [`TrieRulesCollection`] is the bundled implementation. Rules are added
//! through [`RulesCollectionBuilder`] using the input syntax described in
//! `rules/input.rs`.

#[path = "rules/action.rs"]
mod action;
#[path = "rules/input.rs"]
mod input;
#[path = "rules/instructions.rs"]
mod instructions;
#[path = "rules/trie.rs"]
mod trie;

pub use action::{Action, TermMatch};
pub use input::{Anchors, Input, InputToken};
pub use instructions::{
    Instruction, Instructions, PROPERTY_ID, PROPERTY_LOG_MESSAGE, PROPERTY_PRIORITY, Properties, PropertyValue, Rule,
};
pub use trie::{RulesCollectionBuilder, TrieRulesCollection};

use crate::error::Result;
use crate::rewriter::InputSequence;
use crate::select::ActionCollector;

/// Lookup contract of a rule index.
pub trait RulesCollection: Send + Sync {
    /// Deposit every rule match found in `sequence` into `collector`.
    fn collect_rewrite_actions(&self, sequence: &InputSequence<'_>, collector: &mut dyn ActionCollector) -> Result<()>;
}
