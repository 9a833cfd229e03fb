use crate::context::RewriteContext;
use crate::error::Result;
use crate::model::{ExpandedQuery, Term};
use crate::rewriter::PositionSequence;
use crate::rules::TermMatch;
use std::collections::BTreeMap;
use std::fmt;
use std::slice;

/// Identifier of the rule.
pub const PROPERTY_ID: &str = "_id";
/// Message reported under `APPLIED_RULES` when audit logging is on.
pub const PROPERTY_LOG_MESSAGE: &str = "_log";
/// Numeric priority used by the selection strategies (higher is preferred).
pub const PROPERTY_PRIORITY: &str = "priority";

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Number(f64),
    Flag(bool),
}

impl PropertyValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            PropertyValue::Text(s) => s.trim().parse().ok(),
            PropertyValue::Flag(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::Number(n) => write!(f, "{}", n),
            PropertyValue::Flag(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Number(value as f64)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Flag(value)
    }
}

pub type Properties = BTreeMap<String, PropertyValue>;

/// A single rewrite operation.
///
/// Instructions are shared by every query that matches their rule, possibly
/// from several threads at once, so they must not keep per-call state: all
/// mutation goes to the `query` and `context` arguments.
///
/// ```text
/// sequence      the raw (boundary-free) term sequence of the scope
/// term_matches  snapshots of the terms the rule input matched
/// start..end    span of the match in the looked-up sequence
/// ```
pub trait Instruction: fmt::Debug + Send + Sync {
    fn apply(
        &self,
        sequence: &PositionSequence<Term>,
        term_matches: &[TermMatch],
        start_position: usize,
        end_position: usize,
        query: &mut ExpandedQuery,
        context: &mut RewriteContext,
    ) -> Result<()>;
}

/// The ordered instructions of one rule plus its declarative properties.
#[derive(Debug)]
pub struct Instructions {
    ord: usize,
    id: String,
    instructions: Vec<Box<dyn Instruction>>,
    properties: Properties,
}

impl Instructions {
    /// Create the instructions of a rule. An empty `id` lets the rules
    /// collection derive one from the rule input.
    pub fn new(id: impl Into<String>, instructions: Vec<Box<dyn Instruction>>, properties: Properties) -> Self {
        let mut out = Instructions { ord: 0, id: String::new(), instructions, properties };
        out.set_id(id.into());
        out
    }

    /// Declaration order of the rule, the default tie-breaker of selection.
    pub fn with_ord(mut self, ord: usize) -> Self {
        self.ord = ord;
        self
    }

    pub(crate) fn set_id(&mut self, id: String) {
        if !id.is_empty() {
            self.properties.insert(PROPERTY_ID.to_string(), PropertyValue::Text(id.clone()));
        }
        self.id = id;
    }

    pub fn ord(&self) -> usize {
        self.ord
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn log_message(&self) -> Option<String> {
        self.property(PROPERTY_LOG_MESSAGE).map(PropertyValue::to_string)
    }

    pub fn priority(&self) -> Option<f64> {
        self.property(PROPERTY_PRIORITY).and_then(PropertyValue::as_number)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Box<dyn Instruction>> {
        self.instructions.iter()
    }
}

impl<'a> IntoIterator for &'a Instructions {
    type Item = &'a Box<dyn Instruction>;
    type IntoIter = slice::Iter<'a, Box<dyn Instruction>>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

/// A rule definition: its input text and what to do when it matches.
#[derive(Debug)]
pub struct Rule {
    pub input: String,
    pub instructions: Instructions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_and_log_message_are_properties() {
        let mut props = Properties::new();
        props.insert(PROPERTY_LOG_MESSAGE.to_string(), "apple rule".into());
        props.insert(PROPERTY_PRIORITY.to_string(), "7".into());
        let instructions = Instructions::new("r1", Vec::new(), props).with_ord(3);

        assert_eq!(instructions.id(), "r1");
        assert_eq!(instructions.ord(), 3);
        assert_eq!(instructions.property(PROPERTY_ID), Some(&PropertyValue::Text("r1".into())));
        assert_eq!(instructions.log_message().as_deref(), Some("apple rule"));
        assert_eq!(instructions.priority(), Some(7.0));
        assert!(instructions.is_empty());
    }

    #[test]
    fn empty_id_leaves_no_id_property() {
        let instructions = Instructions::new("", Vec::new(), Properties::new());
        assert!(instructions.property(PROPERTY_ID).is_none());
        assert!(instructions.log_message().is_none());
        assert!(instructions.priority().is_none());
    }
}
