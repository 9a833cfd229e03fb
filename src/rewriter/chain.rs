use crate::context::RewriteContext;
use crate::error::Result;
use crate::model::ExpandedQuery;
use crate::rewriter::ContextAwareQueryRewriter;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Runs rewriters one after another on the same query and context.
///
/// Before each rewriter runs, its id becomes the current rewriter id of the
/// info-logging context, so audit records are attributed to it and logging
/// can be switched on per rewriter. The chain stops at the first error.
#[derive(Clone, Default)]
pub struct RewriteChain {
    rewriters: Vec<(String, Arc<dyn ContextAwareQueryRewriter>)>,
}

impl fmt::Debug for RewriteChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteChain").field("rewriters", &self.ids().collect::<Vec<_>>()).finish()
    }
}

impl RewriteChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<String>, rewriter: Arc<dyn ContextAwareQueryRewriter>) -> Self {
        self.push(id, rewriter);
        self
    }

    pub fn push(&mut self, id: impl Into<String>, rewriter: Arc<dyn ContextAwareQueryRewriter>) {
        self.rewriters.push((id.into(), rewriter));
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rewriters.iter().map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.rewriters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewriters.is_empty()
    }
}

impl ContextAwareQueryRewriter for RewriteChain {
    fn rewrite_with_context(&self, query: &mut ExpandedQuery, context: &mut RewriteContext) -> Result<()> {
        let previous = context.info_logging.as_ref().and_then(|l| l.rewriter_id().map(str::to_string));

        for (id, rewriter) in &self.rewriters {
            if let Some(logging) = context.info_logging_mut() {
                logging.set_rewriter_id(Some(id.as_str()));
            }
            debug!(rewriter = %id, "running rewriter");
            let result = rewriter.rewrite_with_context(query, context);
            if let Some(logging) = context.info_logging_mut() {
                logging.set_rewriter_id(previous.as_deref());
            }
            result?;
        }
        Ok(())
    }
}
