//! Fixtures shared by the selection strategy tests.

use crate::model::Term;
use crate::rules::{Action, Instructions, PROPERTY_PRIORITY, Properties, TermMatch};
use std::sync::Arc;

pub fn instructions(id: &str, ord: usize, priority: Option<f64>) -> Arc<Instructions> {
    let mut props = Properties::new();
    if let Some(p) = priority {
        props.insert(PROPERTY_PRIORITY.to_string(), p.into());
    }
    Arc::new(Instructions::new(id, Vec::new(), props).with_ord(ord))
}

pub fn action(instructions: &Arc<Instructions>, start: usize, end: usize) -> Action {
    let matches = (start..end).map(|i| TermMatch::new(Term::new(format!("t{}", i)))).collect();
    Action::new(instructions.clone(), matches, start, end)
}

pub fn summary(actions: &[Action]) -> Vec<(String, usize, usize)> {
    actions.iter().map(|a| (a.instructions.id().to_string(), a.start_position, a.end_position)).collect()
}
