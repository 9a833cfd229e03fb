//! Error types.
//!
//! Rewriting is a pure in-process transform, so there is no retry and no
//! fallback here: every failure travels up to the caller unchanged, and
//! whatever instructions already applied stays applied.

/// Errors raised while rewriting a query.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// The context-free entry point was called on a rewriter that needs a
    /// request context. This is a usage error; no work was done.
    #[error("this rewriter needs a query context")]
    ContextRequired,

    #[error("instruction of rule '{rule}' failed: {message}")]
    Instruction { rule: String, message: String },

    #[error("rules collection failed: {0}")]
    RulesCollection(String),

    #[error("selection strategy failed: {0}")]
    Selection(String),

    #[error(transparent)]
    Rule(#[from] RuleError),
}

impl RewriteError {
    pub fn instruction(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Instruction { rule: rule.into(), message: message.into() }
    }

    /// True for programming errors, as opposed to failures caused by data.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, RewriteError::ContextRequired)
    }
}

/// Errors raised while adding a rule to a rules collection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("rule input is empty")]
    EmptyInput,

    #[error("wildcard is only allowed at the end of the last input token: '{0}'")]
    MisplacedWildcard(String),

    #[error("empty field or value in input token '{0}'")]
    EmptyToken(String),
}

pub type Result<T> = std::result::Result<T, RewriteError>;
