//! The `Collector` trait and helpers shared by every collector.

use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;
use chainprobe_core::Series;

use crate::error::{CollectError, SetupError};

/// One independently scheduled polling task.
///
/// A collector owns its target, its interval and the label sets it writes.
/// The engine calls [`tick`](Collector::tick) once per interval, forever.
#[async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Stable task name, used in logs and the health gauge.
    fn name(&self) -> &str;

    /// Time between the end of one tick and the start of the next.
    fn interval(&self) -> Duration;

    /// Every (series, label values) pair this task writes.
    ///
    /// No two registered collectors may return the same pair.
    fn owned_series(&self) -> Vec<(Series, Vec<String>)>;

    /// Poll, decode and write once.
    async fn tick(&self) -> Result<(), CollectError>;
}

/// Labels every series starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLabels {
    pub chain_name: String,
    pub rpc_url: String,
}

impl ChainLabels {
    pub fn new(chain_name: impl Into<String>, rpc_url: impl Into<String>) -> Self {
        Self {
            chain_name: chain_name.into(),
            rpc_url: rpc_url.into(),
        }
    }

    /// `[chainName, rpcUrl, rest...]`
    pub(crate) fn with(&self, rest: &[&str]) -> Vec<String> {
        let mut labels = Vec::with_capacity(2 + rest.len());
        labels.push(self.chain_name.clone());
        labels.push(self.rpc_url.clone());
        labels.extend(rest.iter().map(|s| s.to_string()));
        labels
    }
}

/// Borrow owned label values for a sink write.
pub(crate) fn label_refs(labels: &[String]) -> Vec<&str> {
    labels.iter().map(String::as_str).collect()
}

/// Parse a configured address, naming the offending config field on error.
pub(crate) fn parse_address(field: &str, value: &str) -> Result<Address, SetupError> {
    Address::from_str(value.trim()).map_err(|e| SetupError::Address {
        field: field.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}
