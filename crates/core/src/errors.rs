use thiserror::Error;

/// Failure inside a pricing calculation. Never escapes the engine: it is
/// logged and turned into the fallback result.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("arithmetic overflow during {operation}")]
    Arithmetic { operation: &'static str },
    #[error("condition evaluation failed: {0}")]
    Evaluator(String),
    #[error("adjustment application failed: {0}")]
    Applier(String),
    #[error("pricing calculation panicked: {0}")]
    Panicked(String),
    #[error(transparent)]
    RuleFetch(#[from] RepositoryError),
}

impl PricingError {
    /// Stable label used in structured log fields.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Arithmetic { .. } => "arithmetic",
            Self::Evaluator(_) => "evaluator",
            Self::Applier(_) => "applier",
            Self::Panicked(_) => "panic",
            Self::RuleFetch(_) => "rule_fetch",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("rule repository unavailable: {0}")]
    Unavailable(String),
}
