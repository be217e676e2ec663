use crate::model::Variable;

/// Failure of a single call to the external NSR evaluator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("evaluation failed: {0}")]
    Failed(String),

    #[error("invalid input for {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
}

impl EvaluationError {
    pub fn failed(msg: impl Into<String>) -> Self {
        EvaluationError::Failed(msg.into())
    }
}

/// Errors that abort a sensitivity sweep before any sample is trusted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SweepError {
    /// Percentage offsets are meaningless around zero.
    #[error("break-even undefined for zero base value ({0})")]
    ZeroBaseValue(Variable),

    #[error("invalid sweep configuration: {0}")]
    InvalidConfig(String),

    /// Sweep was cancelled by the caller; partial samples were discarded
    #[error("sweep cancelled")]
    Cancelled,
}

/// Errors from refreshing the price deck.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PriceError {
    #[error("price source unavailable: {0}")]
    Unavailable(String),

    #[error("invalid {metal} price {value}: prices must be finite and positive")]
    InvalidPrice { metal: &'static str, value: f64 },
}

/// Problems found while validating an import column mapping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error("required field '{0}' is not mapped to any column")]
    MissingRequired(&'static str),

    #[error("column '{column}' is mapped to unknown field '{field}'")]
    UnknownField { column: String, field: String },

    #[error("mapped column '{0}' is not present in the header row")]
    MissingColumn(String),

    #[error("row {row}: empty value for required field '{field}'")]
    EmptyRequired { row: usize, field: &'static str },

    #[error("row {row}: cannot parse '{value}' as a number for field '{field}'")]
    InvalidNumber {
        row: usize,
        field: &'static str,
        value: String,
    },
}

/// Rejected economic configuration values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("cutoff must be a non-negative number, got {0}")]
    InvalidCutoff(f64),

    #[error("marginal multiplier must be at least 1.0, got {0}")]
    InvalidMultiplier(f64),

    #[error("palette thresholds must be ascending")]
    UnorderedPalette,
}
