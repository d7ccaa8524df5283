//! Error types for decoding, ABI encoding, configuration and the sink.

use thiserror::Error;

/// Errors raised while turning raw RPC results into numbers.
///
/// These are treated as transient by the collectors: logged, and the tick
/// is skipped.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid hex quantity '{value}': {reason}")]
    InvalidQuantity { value: String, reason: String },

    #[error("Return data too short: expected at least {expected} bytes, got {got}")]
    ShortReturnData { expected: usize, got: usize },

    #[error("Block mismatch: requested {requested}, node returned {returned}")]
    BlockMismatch { requested: u64, returned: u64 },
}

/// Errors raised while preparing a contract call.
///
/// These are static configuration errors: they are reported once at
/// construction and never retried.
#[derive(Debug, Error)]
pub enum AbiError {
    #[error("Invalid ABI JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("ABI declares no function")]
    NoFunction,

    #[error("ABI declares {} functions, expected exactly one: {}", .names.len(), .names.join(", "))]
    AmbiguousFunction { names: Vec<String> },

    #[error("Argument count mismatch for '{function}': ABI has {expected}, got {got}")]
    ArgCount {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("Cannot resolve type of parameter {index}: {reason}")]
    UnresolvedType { index: usize, reason: String },

    #[error("Invalid {ty} argument '{value}': {reason}")]
    InvalidArgument {
        ty: String,
        value: String,
        reason: String,
    },

    #[error("Value '{value}' out of range for {ty}")]
    OutOfRange { ty: String, value: String },
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid config field '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by a [`MetricSink`](crate::sink::MetricSink).
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Series '{series}' expects {expected} labels, got {got}")]
    LabelMismatch {
        series: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}
