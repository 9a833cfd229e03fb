use crate::model::Term;
use crate::rules::Instructions;
use std::fmt;
use std::sync::Arc;

/// A query term matched by one token of a rule input.
#[derive(Debug, Clone, PartialEq)]
pub struct TermMatch {
    /// Snapshot of the matched term; its id points back into the live tree.
    pub term: Term,
    pub is_prefix: bool,
    /// The part of the term value covered by the wildcard of a prefix token.
    pub wildcard_match: Option<String>,
}

impl TermMatch {
    pub fn new(term: Term) -> Self {
        TermMatch { term, is_prefix: false, wildcard_match: None }
    }

    pub fn prefix(term: Term, wildcard_match: impl Into<String>) -> Self {
        TermMatch { term, is_prefix: true, wildcard_match: Some(wildcard_match.into()) }
    }
}

/// A rule match: the span `[start_position, end_position)` of the looked-up
/// sequence, the terms inside it, and the instructions to run.
///
/// Actions are candidates until a selection strategy accepts them.
#[derive(Debug, Clone)]
pub struct Action {
    pub instructions: Arc<Instructions>,
    pub term_matches: Vec<TermMatch>,
    pub start_position: usize,
    pub end_position: usize,
}

impl Action {
    pub fn new(
        instructions: Arc<Instructions>,
        term_matches: Vec<TermMatch>,
        start_position: usize,
        end_position: usize,
    ) -> Self {
        Action { instructions, term_matches, start_position, end_position }
    }

    /// Number of positions covered by the match.
    pub fn span_len(&self) -> usize {
        self.end_position.saturating_sub(self.start_position)
    }

    pub fn overlaps(&self, other: &Action) -> bool {
        self.start_position < other.end_position && other.start_position < self.end_position
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action[rule={}, terms=[", self.instructions.id())?;
        for (idx, m) in self.term_matches.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", m.term)?;
            if let Some(rest) = &m.wildcard_match {
                write!(f, "(*{})", rest)?;
            }
        }
        write!(f, "], span={}..{}]", self.start_position, self.end_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Properties;

    fn action(start: usize, end: usize) -> Action {
        let instructions = Arc::new(Instructions::new("r", Vec::new(), Properties::new()));
        Action::new(instructions, vec![TermMatch::new(Term::new("a"))], start, end)
    }

    #[test]
    fn overlap_is_half_open() {
        assert!(action(0, 2).overlaps(&action(1, 3)));
        assert!(!action(0, 2).overlaps(&action(2, 3)));
        assert_eq!(action(1, 4).span_len(), 3);
    }

    #[test]
    fn display_names_rule_terms_and_span() {
        let mut a = action(1, 2);
        a.term_matches.push(TermMatch::prefix(Term::with_field("f", "laptops"), "s"));
        assert_eq!(a.to_string(), "Action[rule=r, terms=[a, f:laptops(*s)], span=1..2]");
    }
}
