//! The `RpcTransport` trait: how a request reaches an endpoint.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// Sends one JSON-RPC request to one endpoint.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`: a single transport is shared by
/// every collector polling the same endpoint.
///
/// # Object Safety
/// The trait is object-safe and can be stored as `Arc<dyn RpcTransport>`.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Send a single JSON-RPC request and return the response.
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError>;

    /// The endpoint URL, used for labels and logs.
    fn url(&self) -> &str;
}

#[async_trait]
impl<T: RpcTransport + ?Sized> RpcTransport for std::sync::Arc<T> {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        (**self).send(req).await
    }

    fn url(&self) -> &str {
        (**self).url()
    }
}
