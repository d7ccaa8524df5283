//! chainprobe-core — the pure, I/O-free half of ChainProbe.
//!
//! # Overview
//!
//! ChainProbe samples EVM nodes over JSON-RPC and exposes the latest values
//! as Prometheus gauges. This crate holds everything that does not touch the
//! network:
//!
//! - [`decode`] — hex quantities, fixed-point scaling, tail-word results
//! - [`abi`] — typed coercion of string arguments and one-shot call encoding
//! - [`fingerprint`] — compact per-block drift fingerprints
//! - [`sink`] — the [`MetricSink`] trait plus Prometheus and in-memory sinks
//! - [`config`] — the YAML configuration model
//! - [`types`] — block headers and block tags shared with the RPC layer

pub mod abi;
pub mod config;
pub mod decode;
pub mod error;
pub mod fingerprint;
pub mod sink;
pub mod types;

pub use abi::{ParamKind, PreparedCall};
pub use config::{ContractCallConfig, Erc20Config, ExporterConfig};
pub use error::{AbiError, ConfigError, DecodeError, SinkError};
pub use fingerprint::BlockFingerprints;
pub use sink::{MemorySink, MetricSink, PrometheusSink, Series};
pub use types::{BlockHeader, BlockTag};
