//! chainprobe-rpc — the chain-facing side of ChainProbe.
//!
//! - [`RpcTransport`] — async trait for sending one JSON-RPC request
//! - [`HttpTransport`] — `reqwest`-backed transport with a request timeout
//! - [`ChainRpc`] — the five typed calls the collectors need
//! - [`EthClient`] — `ChainRpc` over any transport, one per endpoint
//! - [`TransportError`] — structured error type

pub mod client;
pub mod error;
pub mod http;
pub mod request;
pub mod transport;

pub use client::{ChainRpc, EthClient};
pub use error::TransportError;
pub use http::HttpTransport;
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId};
pub use transport::RpcTransport;
