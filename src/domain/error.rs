//! Domain error types.

/// Top-level error type for signalgate.
///
/// Only conditions that cannot be recovered locally surface here. Short
/// indicator input, logically inverted stops and gatekeeper rejections are
/// handled inside the pipeline and never become errors.
#[derive(Debug, thiserror::Error)]
pub enum SignalGateError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid candle at {timestamp}: {reason}")]
    InvalidCandle { timestamp: i64, reason: String },

    #[error("invalid series for {asset}: {reason}")]
    InvalidSeries { asset: String, reason: String },

    #[error("invalid signal candidate: {reason}")]
    InvalidCandidate { reason: String },

    #[error("no data for {asset} at {interval}")]
    NoData { asset: String, interval: String },

    #[error("insufficient data for {asset} at {interval}: have {candles} candles, need {minimum}")]
    InsufficientData {
        asset: String,
        interval: String,
        candles: usize,
        minimum: usize,
    },

    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SignalGateError {
    fn from(err: serde_json::Error) -> Self {
        SignalGateError::Serialization {
            reason: err.to_string(),
        }
    }
}

impl From<&SignalGateError> for std::process::ExitCode {
    fn from(err: &SignalGateError) -> Self {
        let code: u8 = match err {
            SignalGateError::Io(_) => 1,
            SignalGateError::ConfigParse { .. }
            | SignalGateError::ConfigMissing { .. }
            | SignalGateError::ConfigInvalid { .. } => 2,
            SignalGateError::InvalidCandle { .. } | SignalGateError::InvalidSeries { .. } => 3,
            SignalGateError::InvalidCandidate { .. } => 4,
            SignalGateError::NoData { .. } | SignalGateError::InsufficientData { .. } => 5,
            SignalGateError::Serialization { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
