//! Property-driven selection: filter, sort, limit.
//!
//! ```text
//! candidates ──filter (all must match)──▶ sort ──limit──▶ actions
//! ```
//!
//! The limit counts *rules*, not actions: one rule matching twice in the
//! same sequence uses one slot. With `use_levels`, the limit counts distinct
//! sort keys instead, so rules that tie on the sort property are kept or
//! dropped together.

use crate::error::Result;
use crate::rules::{Action, Instructions, PropertyValue};
use crate::select::{ActionCollector, SelectionStrategy};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Sorting {
    /// Rule declaration order.
    #[default]
    Ord,
    /// By a rule property. Rules without the property sort last.
    Property { name: String, direction: Direction },
}

/// Keep only rules whose `property` matches `pattern`.
#[derive(Debug, Clone)]
pub struct Filter {
    pub property: String,
    pub pattern: Regex,
}

impl Filter {
    pub fn new(property: impl Into<String>, pattern: Regex) -> Self {
        Filter { property: property.into(), pattern }
    }

    fn accepts(&self, instructions: &Instructions) -> bool {
        instructions.property(&self.property).is_some_and(|v| self.pattern.is_match(&v.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub count: usize,
    pub use_levels: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CriteriaSelectionStrategy {
    sorting: Sorting,
    limit: Option<Limit>,
    filters: Vec<Filter>,
}

impl CriteriaSelectionStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort_by(mut self, sorting: Sorting) -> Self {
        self.sorting = sorting;
        self
    }

    pub fn limit(mut self, count: usize, use_levels: bool) -> Self {
        self.limit = Some(Limit { count, use_levels });
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }
}

impl SelectionStrategy for CriteriaSelectionStrategy {
    fn create_collector(&self) -> Box<dyn ActionCollector> {
        Box::new(CriteriaCollector { criteria: self.clone(), actions: Vec::new(), deposited: 0 })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Text(String),
    Missing,
}

impl SortKey {
    fn of(sorting: &Sorting, instructions: &Instructions) -> SortKey {
        match sorting {
            Sorting::Ord => SortKey::Number(instructions.ord() as f64),
            Sorting::Property { name, .. } => match instructions.property(name) {
                Some(PropertyValue::Number(n)) => SortKey::Number(*n),
                Some(value) => match value.as_number() {
                    Some(n) => SortKey::Number(n),
                    None => SortKey::Text(value.to_string()),
                },
                None => SortKey::Missing,
            },
        }
    }

    fn compare(&self, other: &SortKey, direction: Direction) -> Ordering {
        let directed = |o: Ordering| if direction == Direction::Desc { o.reverse() } else { o };
        match (self, other) {
            (SortKey::Missing, SortKey::Missing) => Ordering::Equal,
            (SortKey::Missing, _) => Ordering::Greater,
            (_, SortKey::Missing) => Ordering::Less,
            (SortKey::Number(a), SortKey::Number(b)) => directed(a.total_cmp(b)),
            (SortKey::Text(a), SortKey::Text(b)) => directed(a.cmp(b)),
            // numbers before text
            (SortKey::Number(_), SortKey::Text(_)) => directed(Ordering::Less),
            (SortKey::Text(_), SortKey::Number(_)) => directed(Ordering::Greater),
        }
    }
}

struct CriteriaCollector {
    criteria: CriteriaSelectionStrategy,
    actions: Vec<Action>,
    /// Every deposit, including the ones the filters rejected.
    deposited: usize,
}

impl ActionCollector for CriteriaCollector {
    fn collect(&mut self, action: Action) {
        self.deposited += 1;
        if self.criteria.filters.iter().all(|f| f.accepts(&action.instructions)) {
            self.actions.push(action);
        }
    }

    fn len(&self) -> usize {
        self.deposited
    }

    fn evaluate(self: Box<Self>) -> Result<Vec<Action>> {
        let CriteriaCollector { criteria, actions, .. } = *self;
        let direction = match &criteria.sorting {
            Sorting::Ord => Direction::Asc,
            Sorting::Property { direction, .. } => *direction,
        };

        let mut keyed: Vec<(SortKey, Action)> =
            actions.into_iter().map(|a| (SortKey::of(&criteria.sorting, &a.instructions), a)).collect();
        keyed.sort_by(|(ka, a), (kb, b)| {
            ka.compare(kb, direction)
                .then(a.instructions.ord().cmp(&b.instructions.ord()))
                .then(a.start_position.cmp(&b.start_position))
                .then(a.end_position.cmp(&b.end_position))
        });

        let Some(limit) = criteria.limit else {
            return Ok(keyed.into_iter().map(|(_, a)| a).collect());
        };

        let mut levels: Vec<SortKey> = Vec::new();
        let mut rules: Vec<Arc<Instructions>> = Vec::new();
        let mut selected = Vec::new();
        for (key, action) in keyed {
            let admitted = if limit.use_levels {
                admit(&mut levels, key, limit.count, |a, b| a == b)
            } else {
                admit(&mut rules, action.instructions.clone(), limit.count, Arc::ptr_eq)
            };
            if admitted {
                selected.push(action);
            }
        }
        Ok(selected)
    }
}

/// True if `unit` is one of the first `count` distinct units seen.
fn admit<T>(seen: &mut Vec<T>, unit: T, count: usize, same: impl Fn(&T, &T) -> bool) -> bool {
    if seen.iter().any(|s| same(s, &unit)) {
        return true;
    }
    if seen.len() < count {
        seen.push(unit);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{PROPERTY_PRIORITY, Properties};
    use crate::select::test_support::{action, instructions, summary};

    fn run(strategy: &CriteriaSelectionStrategy, actions: Vec<Action>) -> Vec<(String, usize, usize)> {
        let mut collector = strategy.create_collector();
        for a in actions {
            collector.collect(a);
        }
        summary(&collector.evaluate().unwrap())
    }

    fn by_priority() -> Sorting {
        Sorting::Property { name: PROPERTY_PRIORITY.to_string(), direction: Direction::Desc }
    }

    #[test]
    fn sorts_by_property_and_puts_missing_last() {
        let low = instructions("low", 0, Some(1.0));
        let high = instructions("high", 1, Some(5.0));
        let none = instructions("none", 2, None);

        let strategy = CriteriaSelectionStrategy::new().sort_by(by_priority());
        assert_eq!(
            run(&strategy, vec![action(&none, 0, 1), action(&low, 0, 1), action(&high, 1, 2)]),
            vec![("high".into(), 1, 2), ("low".into(), 0, 1), ("none".into(), 0, 1)]
        );
    }

    #[test]
    fn limit_counts_rules_not_actions() {
        let a = instructions("a", 0, None);
        let b = instructions("b", 1, None);

        let strategy = CriteriaSelectionStrategy::new().limit(1, false);
        assert_eq!(
            run(&strategy, vec![action(&b, 0, 1), action(&a, 0, 1), action(&a, 2, 3)]),
            vec![("a".into(), 0, 1), ("a".into(), 2, 3)]
        );
    }

    #[test]
    fn limit_with_levels_keeps_ties_together() {
        let a = instructions("a", 0, Some(3.0));
        let b = instructions("b", 1, Some(3.0));
        let c = instructions("c", 2, Some(1.0));

        let strategy = CriteriaSelectionStrategy::new().sort_by(by_priority()).limit(1, true);
        assert_eq!(
            run(&strategy, vec![action(&c, 0, 1), action(&b, 0, 1), action(&a, 1, 2)]),
            vec![("a".into(), 1, 2), ("b".into(), 0, 1)]
        );
    }

    #[test]
    fn filters_drop_rules_without_matching_property() {
        let mut props = Properties::new();
        props.insert("group".to_string(), "electronics".into());
        let tagged = Arc::new(Instructions::new("tagged", Vec::new(), props).with_ord(0));
        let plain = instructions("plain", 1, None);

        let strategy =
            CriteriaSelectionStrategy::new().filter(Filter::new("group", Regex::new("^elec").unwrap()));
        let mut collector = strategy.create_collector();
        collector.collect(action(&plain, 0, 1));
        collector.collect(action(&tagged, 0, 1));
        // rejected deposits still count as candidates
        assert_eq!(collector.len(), 2);
        assert_eq!(summary(&collector.evaluate().unwrap()), vec![("tagged".into(), 0, 1)]);
    }
}
