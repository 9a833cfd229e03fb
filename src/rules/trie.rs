//! Trie-backed rules collection.
//!
//! Rule inputs are compiled into a trie whose edges are boundaries or
//! (field, value) terms. Prefix tokens hang off the node they follow and carry
//! their own sub-trie, so an anchored prefix (`"laptop*"`) still reaches its
//! `Right` boundary edge.
//!
//! Matching starts a walk at every position of the input sequence and
//! advances one position at a time. A position holding several alternative
//! terms can follow several edges at once, so a walk is a set of
//! `(node, matched terms)` states:
//!
//! ```text
//! input:  Left  [iphone, apple]  [case]  Right
//! start=1 ─┐
//!          root ──iphone──▶ n1 ──case──▶ n2 (rules: "iphone case")
//!               └─apple───▶ n3 ──case──▶ ∅
//! ```
//!
//! Every state that reaches a node with rules deposits one [`Action`] per rule.

use crate::error::{Result, RuleError};
use crate::model::Term;
use crate::rewriter::{Boundary, InputElement, InputSequence};
use crate::rules::{Action, Anchors, Input, InputToken, Instructions, Rule, RulesCollection, TermMatch};
use crate::select::ActionCollector;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Edge {
    Boundary(Boundary),
    Term { field: Option<String>, value: String },
}

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<Edge, TrieNode>,
    prefixes: Vec<PrefixEntry>,
    rules: Vec<Arc<Instructions>>,
}

#[derive(Debug)]
struct PrefixEntry {
    field: Option<String>,
    prefix: String,
    next: TrieNode,
}

impl TrieNode {
    fn child_mut(&mut self, edge: Edge) -> &mut TrieNode {
        self.children.entry(edge).or_default()
    }

    fn prefix_mut(&mut self, token: &InputToken) -> &mut TrieNode {
        let idx = match self.prefixes.iter().position(|p| p.field == token.field && p.prefix == token.value) {
            Some(idx) => idx,
            None => {
                self.prefixes.push(PrefixEntry {
                    field: token.field.clone(),
                    prefix: token.value.clone(),
                    next: TrieNode::default(),
                });
                self.prefixes.len() - 1
            }
        };
        &mut self.prefixes[idx].next
    }
}

/// Options for building a [`TrieRulesCollection`].
#[derive(Debug)]
pub struct RulesCollectionBuilder {
    ignore_case: bool,
    root: TrieNode,
    next_ord: usize,
}

impl Default for RulesCollectionBuilder {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RulesCollectionBuilder {
    /// With `ignore_case`, rule inputs and query terms are compared lowercased.
    pub fn new(ignore_case: bool) -> Self {
        RulesCollectionBuilder { ignore_case, root: TrieNode::default(), next_ord: 0 }
    }

    /// Add a rule. Rules get their declaration order (`ord`) from the order
    /// in which they are added.
    pub fn add_rule(&mut self, input: &str, mut instructions: Instructions) -> std::result::Result<(), RuleError> {
        let parsed = Input::parse(input, self.ignore_case)?;

        let ord = self.next_ord;
        self.next_ord += 1;
        if instructions.id().is_empty() {
            instructions.set_id(format!("{}#{}", input.trim(), ord));
        }
        let instructions = Arc::new(instructions.with_ord(ord));

        let mut node = &mut self.root;
        if parsed.anchors.contains(Anchors::LEFT) {
            node = node.child_mut(Edge::Boundary(Boundary::Left));
        }
        for token in &parsed.tokens {
            node = if token.prefix {
                node.prefix_mut(token)
            } else {
                node.child_mut(Edge::Term { field: token.field.clone(), value: token.value.clone() })
            };
        }
        if parsed.anchors.contains(Anchors::RIGHT) {
            node = node.child_mut(Edge::Boundary(Boundary::Right));
        }
        node.rules.push(instructions);
        Ok(())
    }

    pub fn add(&mut self, rule: Rule) -> std::result::Result<(), RuleError> {
        self.add_rule(&rule.input, rule.instructions)
    }

    pub fn build(self) -> TrieRulesCollection {
        debug!(rules = self.next_ord, ignore_case = self.ignore_case, "built rules collection");
        TrieRulesCollection { ignore_case: self.ignore_case, root: self.root, rule_count: self.next_ord }
    }
}

/// Immutable rule index; safe to share between threads.
#[derive(Debug)]
pub struct TrieRulesCollection {
    ignore_case: bool,
    root: TrieNode,
    rule_count: usize,
}

type State<'t> = (&'t TrieNode, Vec<TermMatch>);

impl TrieRulesCollection {
    pub fn builder() -> RulesCollectionBuilder {
        RulesCollectionBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.rule_count
    }

    pub fn is_empty(&self) -> bool {
        self.rule_count == 0
    }

    fn normalize<'v>(&self, value: &'v str) -> std::borrow::Cow<'v, str> {
        if self.ignore_case { std::borrow::Cow::Owned(value.to_lowercase()) } else { std::borrow::Cow::Borrowed(value) }
    }

    /// Follow every edge of `node` that `element` can take.
    fn step<'t>(
        &'t self,
        node: &'t TrieNode,
        matches: &[TermMatch],
        element: InputElement<'_>,
        out: &mut Vec<State<'t>>,
    ) {
        match element {
            InputElement::Boundary(boundary) => {
                if let Some(child) = node.children.get(&Edge::Boundary(boundary)) {
                    out.push((child, matches.to_vec()));
                }
            }
            InputElement::Terms(terms) => {
                for term in terms {
                    let value = self.normalize(&term.value);
                    self.step_term(node, matches, term, &value, out);
                }
            }
        }
    }

    fn step_term<'t>(
        &'t self,
        node: &'t TrieNode,
        matches: &[TermMatch],
        term: &Term,
        value: &str,
        out: &mut Vec<State<'t>>,
    ) {
        let with = |m: TermMatch| {
            let mut next = matches.to_vec();
            next.push(m);
            next
        };

        let mut fields = vec![None];
        if term.field.is_some() {
            fields.push(term.field.clone());
        }
        for field in fields {
            if let Some(child) = node.children.get(&Edge::Term { field, value: value.to_string() }) {
                out.push((child, with(TermMatch::new(term.clone()))));
            }
        }

        for entry in &node.prefixes {
            let field_ok = entry.field.is_none() || entry.field == term.field;
            if field_ok && value.len() > entry.prefix.len() && value.starts_with(entry.prefix.as_str()) {
                let rest = &value[entry.prefix.len()..];
                out.push((&entry.next, with(TermMatch::prefix(term.clone(), rest))));
            }
        }
    }
}

impl RulesCollection for TrieRulesCollection {
    fn collect_rewrite_actions(&self, sequence: &InputSequence<'_>, collector: &mut dyn ActionCollector) -> Result<()> {
        for start in 0..sequence.len() {
            let mut states: Vec<State<'_>> = vec![(&self.root, Vec::new())];

            for (position, element) in sequence.iter().enumerate().skip(start) {
                let mut next = Vec::new();
                for (node, matches) in &states {
                    self.step(node, matches, element, &mut next);
                }

                for (node, matches) in &next {
                    for instructions in &node.rules {
                        collector.collect(Action::new(instructions.clone(), matches.clone(), start, position + 1));
                    }
                }

                if next.is_empty() {
                    break;
                }
                states = next;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewriter::{PositionSequence, add_boundaries, to_input_sequence};
    use crate::rules::Properties;

    #[derive(Default)]
    struct Gather(Vec<Action>);

    impl ActionCollector for Gather {
        fn collect(&mut self, action: Action) {
            self.0.push(action);
        }

        fn len(&self) -> usize {
            self.0.len()
        }

        fn evaluate(self: Box<Self>) -> Result<Vec<Action>> {
            Ok(self.0)
        }
    }

    fn rules(inputs: &[&str]) -> TrieRulesCollection {
        let mut builder = TrieRulesCollection::builder();
        for input in inputs {
            builder.add_rule(input, Instructions::new(*input, Vec::new(), Properties::new())).unwrap();
        }
        builder.build()
    }

    fn sequence(slots: &[&[&str]]) -> PositionSequence<Term> {
        let mut seq = PositionSequence::new();
        for slot in slots {
            seq.next_position();
            for value in *slot {
                seq.add_element(Term::new(*value));
            }
        }
        seq
    }

    fn hits(rules: &TrieRulesCollection, input: &InputSequence<'_>) -> Vec<(String, usize, usize)> {
        let mut gather = Gather::default();
        rules.collect_rewrite_actions(input, &mut gather).unwrap();
        let mut out: Vec<_> = gather
            .0
            .into_iter()
            .map(|a| (a.instructions.id().to_string(), a.start_position, a.end_position))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn matches_contiguous_spans_across_alternatives() {
        let rules = rules(&["iphone case", "case", "apple"]);
        let seq = sequence(&[&["iPhone", "apple"], &["case"]]);

        assert_eq!(
            hits(&rules, &to_input_sequence(&seq)),
            vec![("apple".into(), 0, 1), ("case".into(), 1, 2), ("iphone case".into(), 0, 2)]
        );
    }

    #[test]
    fn anchored_rules_need_boundaries() {
        let rules = rules(&["\"iphone", "case\"", "\"iphone case\"", "\"\""]);
        let seq = sequence(&[&["iphone"], &["case"]]);

        assert!(hits(&rules, &to_input_sequence(&seq)).is_empty());
        assert_eq!(
            hits(&rules, &add_boundaries(&seq)),
            vec![("\"iphone".into(), 0, 2), ("\"iphone case\"".into(), 0, 4), ("case\"".into(), 2, 4)]
        );

        let empty = PositionSequence::new();
        assert_eq!(hits(&rules, &add_boundaries(&empty)), vec![("\"\"".into(), 0, 2)]);
    }

    #[test]
    fn prefix_tokens_report_the_wildcard_part() {
        let rules = rules(&["laptop*", "\"bag laptop*\""]);
        let seq = sequence(&[&["bag"], &["Laptops"]]);

        let mut gather = Gather::default();
        rules.collect_rewrite_actions(&add_boundaries(&seq), &mut gather).unwrap();
        assert_eq!(gather.0.len(), 2);
        for action in &gather.0 {
            let last = action.term_matches.last().unwrap();
            assert!(last.is_prefix);
            assert_eq!(last.wildcard_match.as_deref(), Some("s"));
            assert_eq!(last.term.value, "Laptops");
        }

        // the prefix alone is not a match
        let exact = sequence(&[&["laptop"]]);
        assert!(hits(&rules, &to_input_sequence(&exact)).is_empty());
    }

    #[test]
    fn field_tokens_only_match_their_field() {
        let rules = rules(&["brand:apple"]);
        let mut seq = PositionSequence::new();
        seq.next_position();
        seq.add_element(Term::new("apple"));
        seq.add_element(Term::with_field("color", "apple"));
        assert!(hits(&rules, &to_input_sequence(&seq)).is_empty());

        seq.add_element(Term::with_field("brand", "Apple"));
        assert_eq!(hits(&rules, &to_input_sequence(&seq)), vec![("brand:apple".into(), 0, 1)]);
    }

    #[test]
    fn case_sensitive_collections_compare_verbatim() {
        let mut builder = RulesCollectionBuilder::new(false);
        builder.add_rule("Apple", Instructions::new("r", Vec::new(), Properties::new())).unwrap();
        let rules = builder.build();

        assert!(hits(&rules, &to_input_sequence(&sequence(&[&["apple"]]))).is_empty());
        assert_eq!(hits(&rules, &to_input_sequence(&sequence(&[&["Apple"]]))).len(), 1);
    }

    #[test]
    fn ord_follows_declaration_and_ids_are_derived() {
        let mut builder = TrieRulesCollection::builder();
        builder.add_rule("a", Instructions::new("first", Vec::new(), Properties::new())).unwrap();
        builder.add_rule(" a b ", Instructions::new("", Vec::new(), Properties::new())).unwrap();
        assert_eq!(
            builder.add_rule("a* b", Instructions::new("", Vec::new(), Properties::new())),
            Err(RuleError::MisplacedWildcard("a*".into()))
        );
        let rules = builder.build();
        assert_eq!(rules.len(), 2);

        let mut gather = Gather::default();
        rules.collect_rewrite_actions(&to_input_sequence(&sequence(&[&["a"], &["b"]])), &mut gather).unwrap();
        let mut seen: Vec<(usize, String)> =
            gather.0.iter().map(|a| (a.instructions.ord(), a.instructions.id().to_string())).collect();
        seen.sort();
        assert_eq!(seen, vec![(0, "first".to_string()), (1, "a b#1".to_string())]);
    }
}
