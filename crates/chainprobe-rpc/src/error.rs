//! Transport-level error types.

use chainprobe_core::DecodeError;
use thiserror::Error;

use crate::request::JsonRpcError;

/// Errors that can occur during an RPC call.
///
/// All of them are transient from the collectors' point of view: the tick is
/// skipped and the next one tries again.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, non-2xx status, ...).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON-RPC protocol-level error returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// The call did not complete within the configured timeout.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Response could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// A field of the response was not a valid quantity.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The node does not (yet) know the requested block.
    #[error("Block {block} not found")]
    BlockNotFound { block: String },

    /// The HTTP client could not be constructed.
    #[error("Client build error: {0}")]
    Build(String),
}

impl TransportError {
    /// Returns `true` if this is a node-side execution error (revert, bad params).
    pub fn is_execution_error(&self) -> bool {
        matches!(self, Self::Rpc(_))
    }
}
