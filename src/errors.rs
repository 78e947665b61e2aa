use bigdecimal::BigDecimal;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Domain error: {0}")]
    Domain(String),

    #[error("Invalid fee rate: {0} (expected 0 <= rate < 1)")]
    InvalidRate(BigDecimal),

    #[error("Slippage exceeded: {0}")]
    SlippageExceeded(Slippage),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),

    #[error("Parse decimal error: {0}")]
    ParseDecimal(#[from] bigdecimal::ParseBigDecimalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl EngineError {
    pub fn domain(msg: impl Into<String>) -> Self {
        Self::Domain(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Which side of a swap violated the caller's threshold amount.
#[derive(Debug, Clone, PartialEq)]
pub enum Slippage {
    /// Exact-input swap produced less than the minimum acceptable output.
    OutputBelowMinimum {
        amount_out: BigDecimal,
        threshold: BigDecimal,
    },
    /// Exact-output swap required more gross input than the caller allows.
    InputAboveMaximum {
        amount_in: BigDecimal,
        threshold: BigDecimal,
    },
}

impl fmt::Display for Slippage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutputBelowMinimum {
                amount_out,
                threshold,
            } => write!(
                f,
                "threshold amount not met | amountOut: {amount_out} < thresholdAmount: {threshold}"
            ),
            Self::InputAboveMaximum {
                amount_in,
                threshold,
            } => write!(
                f,
                "threshold amount exceeded | amountIn: {amount_in} > thresholdAmount: {threshold}"
            ),
        }
    }
}
