//! Error types for the DexScout trading engine

use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("Cycle error: {0}")]
    Cycle(String),

    #[error("State store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(String),
}

impl BotError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        BotError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Provider and transport failures are scoped to one token and may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BotError::Provider { .. } | BotError::Http(_))
    }
}

/// Failures raised by a chain adapter. Each one is scoped to a single trade attempt.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    #[error("No route found from {token_in} to {token_out}")]
    NoRouteFound { token_in: String, token_out: String },

    #[error("Execution failed: {0}")]
    ExecutionFailed(ExecutionFailure),

    #[error("Price unavailable for {0}")]
    PriceUnavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionFailure {
    #[error("slippage exceeded: expected at most {expected}%, got {actual}%")]
    SlippageExceeded { expected: Decimal, actual: Decimal },

    #[error("insufficient liquidity: {0}")]
    InsufficientLiquidity(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("rejected: {0}")]
    Rejected(String),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for BotError {
    fn from(e: reqwest::Error) -> Self {
        BotError::Http(e.to_string())
    }
}

/// Result type alias for engine operations
pub type BotResult<T> = Result<T, BotError>;
