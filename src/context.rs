//! Request-scoped state handed to rewriters and instructions.
//!
//! A [`RewriteContext`] is created by the host for one query and is never
//! shared between calls. It carries:
//!
//! - a key/value map (debug switches, captured debug data, and anything the
//!   host wants to pass on to instructions);
//! - an optional [`InfoLoggingContext`], the audit sink that collects which
//!   rules fired.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::info;

/// Set to `ContextValue::Flag(true)` to capture a description of every
/// applied action.
pub const CONTEXT_KEY_DEBUG_ENABLED: &str = "rewrite.debug.enabled";
/// Where captured action descriptions are stored (`ContextValue::List`).
pub const CONTEXT_KEY_DEBUG_DATA: &str = "rewrite.debug.data";
/// Key of the audit record listing the log messages of applied rules.
pub const APPLIED_RULES: &str = "APPLIED_RULES";

#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, Default)]
pub struct RewriteContext {
    pub values: HashMap<String, ContextValue>,
    pub info_logging: Option<InfoLoggingContext>,
}

impl RewriteContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debug(mut self) -> Self {
        self.values.insert(CONTEXT_KEY_DEBUG_ENABLED.to_string(), ContextValue::Flag(true));
        self
    }

    pub fn with_info_logging(mut self, info_logging: InfoLoggingContext) -> Self {
        self.info_logging = Some(info_logging);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ContextValue) -> Option<ContextValue> {
        self.values.insert(key.into(), value)
    }

    pub fn is_debug(&self) -> bool {
        matches!(self.values.get(CONTEXT_KEY_DEBUG_ENABLED), Some(ContextValue::Flag(true)))
    }

    /// Descriptions of the actions applied so far, if debug capture is on.
    pub fn debug_data(&self) -> Option<&[String]> {
        match self.values.get(CONTEXT_KEY_DEBUG_DATA) {
            Some(ContextValue::List(list)) => Some(list),
            _ => None,
        }
    }

    /// Make sure the debug list exists. It is created once and then reused by
    /// every scope (and every rewriter) working on the same query.
    pub(crate) fn ensure_debug_data(&mut self) {
        if !matches!(self.values.get(CONTEXT_KEY_DEBUG_DATA), Some(ContextValue::List(_))) {
            self.values.insert(CONTEXT_KEY_DEBUG_DATA.to_string(), ContextValue::List(Vec::new()));
        }
    }

    pub(crate) fn push_debug_data(&mut self, description: String) {
        match self.values.get_mut(CONTEXT_KEY_DEBUG_DATA) {
            Some(ContextValue::List(list)) => list.push(description),
            _ => {
                self.values.insert(CONTEXT_KEY_DEBUG_DATA.to_string(), ContextValue::List(vec![description]));
            }
        }
    }

    pub fn info_logging_mut(&mut self) -> Option<&mut InfoLoggingContext> {
        self.info_logging.as_mut()
    }
}

/// One audit record, attributed to the rewriter that emitted it.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoLogRecord {
    pub rewriter_id: Option<String>,
    pub message: BTreeMap<&'static str, BTreeSet<String>>,
}

impl InfoLogRecord {
    pub fn applied_rules(&self) -> Option<&BTreeSet<String>> {
        self.message.get(APPLIED_RULES)
    }
}

/// Audit sink for one query.
///
/// Logging is switched on per rewriter id; the caller (usually a
/// [`RewriteChain`](crate::RewriteChain)) sets the id of the rewriter that is
/// about to run.
#[derive(Debug, Clone, Default)]
pub struct InfoLoggingContext {
    enabled_for: HashSet<String>,
    rewriter_id: Option<String>,
    records: Vec<InfoLogRecord>,
}

impl InfoLoggingContext {
    pub fn new<I, S>(enabled_for: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        InfoLoggingContext { enabled_for: enabled_for.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    /// Enabled for `rewriter_id`, which is also set as the current rewriter.
    pub fn for_rewriter(rewriter_id: &str) -> Self {
        let mut ctx = Self::new([rewriter_id]);
        ctx.set_rewriter_id(Some(rewriter_id));
        ctx
    }

    pub fn set_rewriter_id(&mut self, rewriter_id: Option<&str>) {
        self.rewriter_id = rewriter_id.map(str::to_string);
    }

    pub fn rewriter_id(&self) -> Option<&str> {
        self.rewriter_id.as_deref()
    }

    pub fn is_enabled_for_rewriter(&self) -> bool {
        self.rewriter_id.as_ref().is_some_and(|id| self.enabled_for.contains(id))
    }

    pub fn log(&mut self, message: BTreeMap<&'static str, BTreeSet<String>>) {
        let rewriter = self.rewriter_id.as_deref().unwrap_or("-");
        for (key, values) in &message {
            info!(rewriter, key, values = ?values, "rewriter info log");
        }
        self.records.push(InfoLogRecord { rewriter_id: self.rewriter_id.clone(), message });
    }

    pub fn records(&self) -> &[InfoLogRecord] {
        &self.records
    }
}
