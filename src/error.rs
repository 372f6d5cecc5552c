use thiserror::Error;

/// Errors raised by the indicator calculator and the backtest engine.
///
/// Degenerate numeric situations (zero variance, no position changes, flat
/// prices) are not errors; they resolve to documented fallback values.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("insufficient data for {indicator}: {required} bars required, {available} available")]
    InsufficientData {
        indicator: String,
        required: usize,
        available: usize,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl EngineError {
    pub fn insufficient(indicator: impl Into<String>, required: usize, available: usize) -> Self {
        EngineError::InsufficientData {
            indicator: indicator.into(),
            required,
            available,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        EngineError::InvalidInput(message.into())
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
