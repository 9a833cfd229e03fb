use crate::error::Result;
use crate::rules::Action;
use crate::select::{ActionCollector, SelectionStrategy};
use std::cmp::Ordering;

/// Longest match wins; accepted spans never overlap.
///
/// Candidates are ranked by:
///
/// 1. span length (longer first)
/// 2. `priority` property (higher first, absent counts as 0)
/// 3. rule declaration order (earlier first)
/// 4. start position (earlier first)
///
/// and accepted greedily when their span is disjoint from every span already
/// accepted. The result is returned in ascending start position, which is the
/// order the rewriter applies it in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonOverlappingSelectionStrategy;

#[derive(Debug, Default)]
struct NonOverlappingCollector {
    actions: Vec<Action>,
}

fn rank(a: &Action, b: &Action) -> Ordering {
    let priority = |x: &Action| x.instructions.priority().unwrap_or(0.0);
    b.span_len()
        .cmp(&a.span_len())
        .then(priority(b).total_cmp(&priority(a)))
        .then(a.instructions.ord().cmp(&b.instructions.ord()))
        .then(a.start_position.cmp(&b.start_position))
}

impl ActionCollector for NonOverlappingCollector {
    fn collect(&mut self, action: Action) {
        self.actions.push(action);
    }

    fn len(&self) -> usize {
        self.actions.len()
    }

    fn evaluate(self: Box<Self>) -> Result<Vec<Action>> {
        let mut candidates = self.actions;
        candidates.sort_by(rank);

        let mut accepted: Vec<Action> = Vec::new();
        for candidate in candidates {
            if accepted.iter().all(|a| !a.overlaps(&candidate)) {
                accepted.push(candidate);
            }
        }
        accepted.sort_by_key(|a| (a.start_position, a.instructions.ord()));
        Ok(accepted)
    }
}

impl SelectionStrategy for NonOverlappingSelectionStrategy {
    fn create_collector(&self) -> Box<dyn ActionCollector> {
        Box::new(NonOverlappingCollector::default())
    }
}
