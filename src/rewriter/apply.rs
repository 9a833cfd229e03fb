//! Sequence resolution: lookup, selection, and instruction application.
//!
//! ```text
//! PositionSequence<Term> ──(boundaries?)──▶ InputSequence
//!        │                                     │ RulesCollection::collect_rewrite_actions
//!        │                                     ▼
//!        │                        collector ──evaluate──▶ Vec<Action>
//!        │                                                   │
//!        └──────── raw sequence ──▶ Instruction::apply ◀─────┘  (in order)
//! ```
//!
//! Side effects besides the instructions themselves:
//!
//! - debug capture: the description of every applied action is appended to
//!   the context's debug list, in application order;
//! - audit logging: log messages of the applied rules are deduplicated and
//!   emitted once per resolved scope under `APPLIED_RULES`.

use crate::context::{APPLIED_RULES, InfoLoggingContext};
use crate::error::Result;
use crate::model::Term;
use crate::rewriter::traversal::Traversal;
use crate::rewriter::{PositionSequence, ScopeMetrics, add_boundaries, to_input_sequence};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::{debug, trace};

impl Traversal<'_> {
    pub(super) fn apply_sequence(
        &mut self,
        sequence: PositionSequence<Term>,
        with_boundaries: bool,
        depth: usize,
    ) -> Result<()> {
        let started = Instant::now();
        let lookup = if with_boundaries { add_boundaries(&sequence) } else { to_input_sequence(&sequence) };

        let is_debug = self.context.is_debug();
        if is_debug {
            self.context.ensure_debug_data();
        }

        let mut collector = self.strategy.create_collector();
        self.rules.collect_rewrite_actions(&lookup, collector.as_mut())?;
        let candidates = collector.len();
        let actions = collector.evaluate()?;

        let info_logging =
            self.context.info_logging.as_ref().is_some_and(InfoLoggingContext::is_enabled_for_rewriter);
        let mut applied_rules = BTreeSet::new();

        for action in &actions {
            if is_debug {
                self.context.push_debug_data(action.to_string());
            }
            trace!(%action, "applying action");

            for instruction in action.instructions.iter() {
                instruction.apply(
                    &sequence,
                    &action.term_matches,
                    action.start_position,
                    action.end_position,
                    self.query,
                    self.context,
                )?;
            }

            if info_logging {
                if let Some(message) = action.instructions.log_message() {
                    applied_rules.insert(message);
                }
            }
        }

        if !applied_rules.is_empty() {
            if let Some(logging) = self.context.info_logging_mut() {
                logging.log(BTreeMap::from([(APPLIED_RULES, applied_rules)]));
            }
        }

        debug!(depth, positions = sequence.len(), candidates, applied = actions.len(), "resolved sequence");
        self.scopes.push(ScopeMetrics {
            depth,
            positions: sequence.len(),
            candidates,
            applied: actions.len(),
            duration: started.elapsed(),
        });
        Ok(())
    }
}
