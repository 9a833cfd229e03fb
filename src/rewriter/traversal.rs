//! Sequence building.
//!
//! The traversal walks the user query depth-first and keeps one
//! [`PositionSequence`] per open boolean scope on a stack:
//!
//! ```text
//! enter boolean     push a fresh sequence
//! enter disjunction open the next position of the top sequence
//! visit term        add it to the current position of the top sequence
//! leave boolean     pop, resolve (no boundaries)
//! leave root        pop, resolve (with boundaries)
//! ```
//!
//! Scopes are resolved post-order, so a nested scope is fully rewritten before
//! its parent continues, and the parent's later positions reflect whatever the
//! nested rules did.
//!
//! Nodes are addressed by key paths that are resolved against the live tree
//! at every step; sequences hold term snapshots. Instructions can therefore
//! restructure the tree while a traversal is in progress. When the walk enters
//! a node it takes the keys of the children present at that moment and visits
//! those still present when their turn comes:
//!
//! ```text
//! root: a  (b)  d        keys [A, B, D]
//! visit B: rule deletes b, (b) is pruned    root: a d
//! next key D is found at index 1, not skipped
//! ```

use crate::context::RewriteContext;
use crate::error::Result;
use crate::model::{ExpandedQuery, NodeKey, NodeRef, Term, UserQuery};
use crate::rewriter::{PositionSequence, ScopeMetrics};
use crate::rules::RulesCollection;
use crate::select::SelectionStrategy;

/// What the traversal found at a path. Terms are cloned out so that no borrow
/// of the tree survives the lookup.
enum Visit {
    Boolean,
    Disjunction,
    Term(Term),
}

/// State of one rewrite call. Never shared between calls.
pub(super) struct Traversal<'a> {
    pub(super) rules: &'a dyn RulesCollection,
    pub(super) strategy: &'a dyn SelectionStrategy,
    pub(super) query: &'a mut ExpandedQuery,
    pub(super) context: &'a mut RewriteContext,
    pub(super) stack: Vec<PositionSequence<Term>>,
    pub(super) scopes: Vec<ScopeMetrics>,
}

impl<'a> Traversal<'a> {
    pub(super) fn new(
        rules: &'a dyn RulesCollection,
        strategy: &'a dyn SelectionStrategy,
        query: &'a mut ExpandedQuery,
        context: &'a mut RewriteContext,
    ) -> Self {
        Traversal { rules, strategy, query, context, stack: Vec::new(), scopes: Vec::new() }
    }

    /// Rewrite the user query and return the metrics of every resolved scope,
    /// innermost first.
    pub(super) fn run(mut self) -> Result<Vec<ScopeMetrics>> {
        if !matches!(self.query.user_query, UserQuery::Query(_)) {
            return Ok(self.scopes);
        }

        self.stack.push(PositionSequence::new());
        self.visit_children(&mut Vec::new())?;
        let sequence = self.pop_sequence();
        self.apply_sequence(sequence, true, 0)?;

        let emptied = self.query.user_boolean_query().is_some_and(|bq| bq.is_empty());
        if emptied && self.query.needs_match_all_when_empty() {
            self.query.user_query = UserQuery::MatchAll { generated: true };
        }

        Ok(self.scopes)
    }

    fn node_at(&self, path: &[NodeKey]) -> Option<Visit> {
        let node = self.query.user_boolean_query()?.node_by_keys(path)?;
        Some(match node {
            NodeRef::Boolean(_) => Visit::Boolean,
            NodeRef::Disjunction(_) => Visit::Disjunction,
            NodeRef::Term(term) => Visit::Term(term.clone()),
        })
    }

    fn visit_children(&mut self, path: &mut Vec<NodeKey>) -> Result<()> {
        let keys = match self.query.user_boolean_query().and_then(|bq| bq.node_by_keys(path)) {
            Some(node) => node.child_keys(),
            None => return Ok(()),
        };

        for key in keys {
            path.push(key);
            // pruned by an instruction of an earlier sibling's scope
            if let Some(node) = self.node_at(path) {
                self.visit(node, path)?;
            }
            path.pop();
        }
        Ok(())
    }

    fn visit(&mut self, node: Visit, path: &mut Vec<NodeKey>) -> Result<()> {
        match node {
            Visit::Boolean => {
                self.stack.push(PositionSequence::new());
                self.visit_children(path)?;
                let depth = self.stack.len() - 1;
                let sequence = self.pop_sequence();
                self.apply_sequence(sequence, false, depth)
            }
            Visit::Disjunction => {
                if let Some(top) = self.stack.last_mut() {
                    top.next_position();
                }
                self.visit_children(path)
            }
            Visit::Term(term) => {
                if let Some(top) = self.stack.last_mut() {
                    top.add_element(term);
                }
                Ok(())
            }
        }
    }

    fn pop_sequence(&mut self) -> PositionSequence<Term> {
        let mut sequence = self.stack.pop().unwrap_or_default();
        sequence.compact();
        sequence
    }
}
