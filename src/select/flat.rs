use crate::error::Result;
use crate::rules::Action;
use crate::select::{ActionCollector, SelectionStrategy};

/// Apply every candidate, ordered by rule declaration order, then position.
///
/// This is the default policy: overlapping matches are not filtered, so two
/// rules matching the same terms both fire.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatSelectionStrategy;

#[derive(Debug, Default)]
struct FlatCollector {
    actions: Vec<Action>,
}

impl ActionCollector for FlatCollector {
    fn collect(&mut self, action: Action) {
        self.actions.push(action);
    }

    fn len(&self) -> usize {
        self.actions.len()
    }

    fn evaluate(self: Box<Self>) -> Result<Vec<Action>> {
        let mut actions = self.actions;
        actions.sort_by_key(|a| (a.instructions.ord(), a.start_position, a.end_position));
        Ok(actions)
    }
}

impl SelectionStrategy for FlatSelectionStrategy {
    fn create_collector(&self) -> Box<dyn ActionCollector> {
        Box::new(FlatCollector::default())
    }
}
