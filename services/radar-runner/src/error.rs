//! Error types for the radar engine

/// Per-symbol and collaborator errors.
///
/// None of these abort a polling cycle: the runner records the symbol as
/// skipped and moves on to the next one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RadarError {
    #[error("Insufficient data for {symbol}: need {required} bars, have {available}")]
    InsufficientData {
        symbol: String,
        required: usize,
        available: usize,
    },

    #[error("No usable bars for {symbol}")]
    EmptySeries { symbol: String },

    #[error("Data source error for {symbol}: {message}")]
    DataSource { symbol: String, message: String },

    #[error("{operation} for {symbol} timed out after {secs}s")]
    Timeout {
        operation: String,
        symbol: String,
        secs: u64,
    },

    #[error("Notification transport failed: {0}")]
    TransportFailure(String),

    #[error("Alert history is empty")]
    EmptyHistory,
}

impl RadarError {
    /// Symbol the error belongs to, if any
    pub fn symbol(&self) -> Option<&str> {
        match self {
            RadarError::InsufficientData { symbol, .. }
            | RadarError::EmptySeries { symbol }
            | RadarError::DataSource { symbol, .. }
            | RadarError::Timeout { symbol, .. } => Some(symbol),
            _ => None,
        }
    }
}

/// Startup configuration errors. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to load config: {0}")]
    Load(#[from] config::ConfigError),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
