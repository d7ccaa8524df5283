//! chainprobe-collector — the polling side of ChainProbe.
//!
//! Every configured target becomes one [`Collector`]: an independently
//! scheduled task that polls one endpoint, decodes the result and writes it
//! to a [`MetricSink`](chainprobe_core::MetricSink).
//!
//! - [`NativeBalanceCollector`] — ether balance and nonce of one account
//! - [`TokenBalanceCollector`] — ERC-20 `balanceOf` for one (token, account)
//! - [`ContractCallCollector`] — any single-function read-only call
//! - [`ConsistencyChecker`] — block fingerprints across replica endpoints
//! - [`Engine`] — registry, series ownership, start and shutdown
//! - [`build_engine`] — configuration to engine in one call
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chainprobe_collector::{build_engine, http_connector};
//! use chainprobe_core::{ExporterConfig, PrometheusSink};
//! use chainprobe_rpc::EthClient;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExporterConfig::from_path("config.yaml")?;
//! let client = Arc::new(EthClient::http("https://rpc.ankr.com/eth", config.rpc_timeout())?);
//! let sink = Arc::new(PrometheusSink::new()?);
//!
//! let built = build_engine(&config, "eth-mainnet", client, http_connector(config.rpc_timeout()), sink)?;
//! let handle = built.engine.start();
//! tokio::signal::ctrl_c().await?;
//! handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod collector;
pub mod consistency;
pub mod contract;
pub mod engine;
pub mod error;
pub mod native;
pub mod token;

#[cfg(test)]
pub(crate) mod test_support;

pub use builder::{build_engine, http_connector, BuiltEngine};
pub use collector::{ChainLabels, Collector};
pub use consistency::{ConsistencyChecker, ConsistencyReport, Replica, ReplicaOutcome, CONSISTENCY_TASK};
pub use contract::ContractCallCollector;
pub use engine::{Engine, EngineHandle};
pub use error::{BuildError, CollectError, SetupError, TaskFailure};
pub use native::NativeBalanceCollector;
pub use token::{TokenBalanceCollector, TokenTarget};
