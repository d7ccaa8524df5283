//! Typed EVM calls on top of a [`RpcTransport`].
//!
//! The collectors only see [`ChainRpc`]; tests substitute their own
//! implementation, production wires an [`EthClient`] per endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use chainprobe_core::decode::{parse_quantity, parse_quantity_u64};
use chainprobe_core::{BlockHeader, BlockTag};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::TransportError;
use crate::http::HttpTransport;
use crate::request::JsonRpcRequest;
use crate::transport::RpcTransport;

/// The chain queries a collector can make. Every call may fail or stall.
#[async_trait]
pub trait ChainRpc: Send + Sync + 'static {
    /// Native balance of `address` at the latest block, in wei.
    async fn balance_at(&self, address: Address) -> Result<U256, TransportError>;

    /// Transaction count of `address` at the latest block.
    async fn nonce_at(&self, address: Address) -> Result<u64, TransportError>;

    /// Header fields of a block. An unknown block is [`TransportError::BlockNotFound`].
    async fn block_by_number(&self, block: BlockTag) -> Result<BlockHeader, TransportError>;

    /// `eth_call` against the latest block.
    async fn call_contract(&self, to: Address, data: &Bytes) -> Result<Bytes, TransportError>;

    /// Height of the latest block.
    async fn current_block_height(&self) -> Result<u64, TransportError>;

    /// Endpoint URL, used in labels and logs.
    fn url(&self) -> &str;
}

/// Block fields as they appear in `eth_getBlockByNumber`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlockHeader {
    number: String,
    hash: B256,
    state_root: B256,
}

/// `ChainRpc` over JSON-RPC with a per-call timeout.
pub struct EthClient<T> {
    transport: T,
    timeout: Duration,
    next_id: AtomicU64,
}

impl EthClient<HttpTransport> {
    /// HTTP client for `url`; every call is bounded by `timeout`.
    pub fn http(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self::new(HttpTransport::new(url, timeout)?, timeout))
    }
}

impl<T: RpcTransport> EthClient<T> {
    pub fn new(transport: T, timeout: Duration) -> Self {
        Self {
            transport,
            timeout,
            next_id: AtomicU64::new(1),
        }
    }

    async fn request<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<R, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::new(id, method, params);

        let resp = tokio::time::timeout(self.timeout, self.transport.send(req))
            .await
            .map_err(|_| TransportError::Timeout {
                ms: self.timeout.as_millis() as u64,
            })??;

        let result = resp.into_result().map_err(TransportError::Rpc)?;
        Ok(serde_json::from_value(result)?)
    }
}

#[async_trait]
impl<T: RpcTransport> ChainRpc for EthClient<T> {
    async fn balance_at(&self, address: Address) -> Result<U256, TransportError> {
        let raw: String = self
            .request("eth_getBalance", vec![json!(address), json!("latest")])
            .await?;
        Ok(parse_quantity(&raw)?)
    }

    async fn nonce_at(&self, address: Address) -> Result<u64, TransportError> {
        let raw: String = self
            .request("eth_getTransactionCount", vec![json!(address), json!("latest")])
            .await?;
        Ok(parse_quantity_u64(&raw)?)
    }

    async fn block_by_number(&self, block: BlockTag) -> Result<BlockHeader, TransportError> {
        let raw: Option<RawBlockHeader> = self
            .request("eth_getBlockByNumber", vec![json!(block.to_param()), json!(false)])
            .await?;
        let raw = raw.ok_or_else(|| TransportError::BlockNotFound {
            block: block.to_string(),
        })?;
        Ok(BlockHeader {
            number: parse_quantity_u64(&raw.number)?,
            hash: raw.hash,
            state_root: raw.state_root,
        })
    }

    async fn call_contract(&self, to: Address, data: &Bytes) -> Result<Bytes, TransportError> {
        self.request("eth_call", vec![json!({ "to": to, "data": data }), json!("latest")])
            .await
    }

    async fn current_block_height(&self) -> Result<u64, TransportError> {
        let raw: String = self.request("eth_blockNumber", vec![]).await?;
        Ok(parse_quantity_u64(&raw)?)
    }

    fn url(&self) -> &str {
        self.transport.url()
    }
}
