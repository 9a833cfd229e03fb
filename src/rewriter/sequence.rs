//! Position sequences and lookup input.
//!
//! A [`PositionSequence`] is the linear view of one boolean scope: an ordered
//! list of slots, each holding every element that occupies that logical
//! position. A disjunction with the alternatives `a | b` followed by a term
//! `c` gives:
//!
//! ```text
//! pos:   0        1
//!      [a, b]    [c]
//! ```
//!
//! Before a sequence goes to the rules collection it is frozen into an
//! [`InputSequence`]. The root scope is additionally wrapped in boundary
//! markers so rules can anchor to the start and end of the whole query:
//!
//! ```text
//! pos:   0        1       2      3
//!      Left    [a, b]    [c]   Right
//! ```

use crate::model::Term;
use std::slice;

/// Ordered slots, each holding the elements that share one position.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSequence<T> {
    positions: Vec<Vec<T>>,
}

impl<T> Default for PositionSequence<T> {
    fn default() -> Self {
        PositionSequence { positions: Vec::new() }
    }
}

impl<T> PositionSequence<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new, empty slot after the current last one.
    pub fn next_position(&mut self) {
        self.positions.push(Vec::new());
    }

    /// Add `element` to the last slot, opening one if the sequence has none yet.
    pub fn add_element(&mut self, element: T) {
        match self.positions.last_mut() {
            Some(last) => last.push(element),
            None => self.positions.push(vec![element]),
        }
    }

    pub fn push_position(&mut self, elements: Vec<T>) {
        self.positions.push(elements);
    }

    /// Drop slots that never received an element (e.g. a disjunction whose
    /// only clauses are nested boolean queries).
    pub fn compact(&mut self) {
        self.positions.retain(|slot| !slot.is_empty());
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&[T]> {
        self.positions.get(position).map(Vec::as_slice)
    }

    pub fn iter(&self) -> slice::Iter<'_, Vec<T>> {
        self.positions.iter()
    }
}

impl<'a, T> IntoIterator for &'a PositionSequence<T> {
    type Item = &'a Vec<T>;
    type IntoIter = slice::Iter<'a, Vec<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.positions.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Boundary {
    Left,
    Right,
}

/// One position of the lookup input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputElement<'a> {
    Boundary(Boundary),
    /// The frozen alternatives of one slot of the raw sequence.
    Terms(&'a [Term]),
}

/// The read-only sequence handed to a rules collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputSequence<'a> {
    elements: Vec<InputElement<'a>>,
}

impl<'a> InputSequence<'a> {
    pub fn new(elements: Vec<InputElement<'a>>) -> Self {
        InputSequence { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<InputElement<'a>> {
        self.elements.get(position).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = InputElement<'a>> + '_ {
        self.elements.iter().copied()
    }
}

/// Freeze each slot of `sequence` into a term group, without boundaries.
/// Used for nested scopes.
pub fn to_input_sequence(sequence: &PositionSequence<Term>) -> InputSequence<'_> {
    InputSequence::new(sequence.iter().map(|slot| InputElement::Terms(slot.as_slice())).collect())
}

/// Like [`to_input_sequence`], with a `Left` boundary before the first slot
/// and a `Right` boundary after the last one. Used for the root scope only.
pub fn add_boundaries(sequence: &PositionSequence<Term>) -> InputSequence<'_> {
    let mut elements = Vec::with_capacity(sequence.len() + 2);
    elements.push(InputElement::Boundary(Boundary::Left));
    elements.extend(sequence.iter().map(|slot| InputElement::Terms(slot.as_slice())));
    elements.push(InputElement::Boundary(Boundary::Right));
    InputSequence::new(elements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PositionSequence<Term> {
        let mut seq = PositionSequence::new();
        seq.next_position();
        seq.add_element(Term::new("a"));
        seq.add_element(Term::new("b"));
        seq.next_position();
        seq.add_element(Term::new("c"));
        seq
    }

    fn values(element: InputElement<'_>) -> Vec<&str> {
        match element {
            InputElement::Terms(terms) => terms.iter().map(|t| t.value.as_str()).collect(),
            InputElement::Boundary(b) => panic!("unexpected boundary {:?}", b),
        }
    }

    #[test]
    fn slots_group_alternatives() {
        let seq = sample();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.get(0).map(<[Term]>::len), Some(2));
        assert_eq!(seq.get(1).map(<[Term]>::len), Some(1));
        assert!(seq.get(2).is_none());
    }

    #[test]
    fn compact_drops_empty_slots() {
        let mut seq = PositionSequence::new();
        seq.next_position();
        seq.next_position();
        seq.add_element(1);
        seq.next_position();
        seq.compact();
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.get(0), Some(&[1][..]));
    }

    #[test]
    fn add_element_without_slot_opens_one() {
        let mut seq = PositionSequence::new();
        seq.add_element("x");
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn boundaries_wrap_the_root_sequence() {
        let seq = sample();
        let input = add_boundaries(&seq);

        assert_eq!(input.len(), 4);
        assert_eq!(input.get(0), Some(InputElement::Boundary(Boundary::Left)));
        assert_eq!(values(input.get(1).unwrap()), vec!["a", "b"]);
        assert_eq!(values(input.get(2).unwrap()), vec!["c"]);
        assert_eq!(input.get(3), Some(InputElement::Boundary(Boundary::Right)));

        // the raw sequence is untouched
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn nested_conversion_has_no_boundaries() {
        let seq = sample();
        let input = to_input_sequence(&seq);
        assert_eq!(input.len(), 2);
        assert!(input.iter().all(|e| matches!(e, InputElement::Terms(_))));
    }

    #[test]
    fn empty_root_still_gets_both_boundaries() {
        let seq: PositionSequence<Term> = PositionSequence::new();
        let input = add_boundaries(&seq);
        assert_eq!(
            input.iter().collect::<Vec<_>>(),
            vec![InputElement::Boundary(Boundary::Left), InputElement::Boundary(Boundary::Right)]
        );
    }
}
