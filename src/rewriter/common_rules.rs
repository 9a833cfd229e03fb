use crate::context::RewriteContext;
use crate::error::{Result, RewriteError};
use crate::model::ExpandedQuery;
use crate::rewriter::RewriteMetrics;
use crate::rewriter::traversal::Traversal;
use crate::rules::RulesCollection;
use crate::select::{FlatSelectionStrategy, SelectionStrategy};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// A rewriter that can run without request state.
pub trait QueryRewriter {
    fn rewrite(&self, query: &mut ExpandedQuery) -> Result<()>;
}

/// A rewriter that needs the request context.
///
/// The query is rewritten in place. On error, whatever was applied before the
/// failure stays in `query`.
pub trait ContextAwareQueryRewriter: Send + Sync {
    fn rewrite_with_context(&self, query: &mut ExpandedQuery, context: &mut RewriteContext) -> Result<()>;
}

/// Applies a rules collection to every boolean scope of a query.
///
/// The rewriter holds only shared, immutable state and can serve any number
/// of concurrent calls; all per-call state lives in the traversal created by
/// each call.
#[derive(Clone)]
pub struct CommonRulesRewriter {
    rules: Arc<dyn RulesCollection>,
    selection_strategy: Arc<dyn SelectionStrategy>,
}

impl fmt::Debug for CommonRulesRewriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommonRulesRewriter")
            .field("rules", &"<rules collection>")
            .field("selection_strategy", &self.selection_strategy)
            .finish()
    }
}

impl CommonRulesRewriter {
    pub fn new(rules: Arc<dyn RulesCollection>, selection_strategy: Arc<dyn SelectionStrategy>) -> Self {
        CommonRulesRewriter { rules, selection_strategy }
    }

    /// Use [`FlatSelectionStrategy`]: every match fires, in declaration order.
    pub fn with_default_selection(rules: Arc<dyn RulesCollection>) -> Self {
        Self::new(rules, Arc::new(FlatSelectionStrategy))
    }

    /// Rewrite `query` and report per-scope metrics.
    pub fn rewrite_with_metrics(
        &self,
        query: &mut ExpandedQuery,
        context: &mut RewriteContext,
    ) -> Result<RewriteMetrics> {
        let started = Instant::now();
        let scopes = Traversal::new(self.rules.as_ref(), self.selection_strategy.as_ref(), query, context).run()?;
        Ok(RewriteMetrics { total: started.elapsed(), scopes })
    }
}

impl QueryRewriter for CommonRulesRewriter {
    /// Always fails with [`RewriteError::ContextRequired`]; `query` is not
    /// touched.
    fn rewrite(&self, _query: &mut ExpandedQuery) -> Result<()> {
        Err(RewriteError::ContextRequired)
    }
}

impl ContextAwareQueryRewriter for CommonRulesRewriter {
    fn rewrite_with_context(&self, query: &mut ExpandedQuery, context: &mut RewriteContext) -> Result<()> {
        self.rewrite_with_metrics(query, context).map(|_| ())
    }
}
