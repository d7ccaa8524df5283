//! The metric sink: `(series, label values) -> last written f64`.
//!
//! Every series is registered up front with a fixed, ordered list of label
//! names. Writes are upserts; there is no history. Both implementations are
//! safe for concurrent writes from any number of tasks.

use std::collections::HashMap;
use std::sync::RwLock;

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::error::SinkError;

/// Every series ChainProbe exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Series {
    AccountBalance,
    AccountNonce,
    Erc20Balance,
    ContractData,
    BlockHashFingerprint,
    StateRootFingerprint,
    CollectorUp,
    BuildInfo,
}

impl Series {
    pub const ALL: [Series; 8] = [
        Self::AccountBalance,
        Self::AccountNonce,
        Self::Erc20Balance,
        Self::ContractData,
        Self::BlockHashFingerprint,
        Self::StateRootFingerprint,
        Self::CollectorUp,
        Self::BuildInfo,
    ];

    /// Exported metric name.
    pub fn name(self) -> &'static str {
        match self {
            Self::AccountBalance => "chain_accountbalance",
            Self::AccountNonce => "chain_account_nounce",
            Self::Erc20Balance => "chain_erc20balance",
            Self::ContractData => "chain_contractdata",
            Self::BlockHashFingerprint => "chain_blockhash_eigenvalue",
            Self::StateRootFingerprint => "chain_stateroot_eigenvalue",
            Self::CollectorUp => "chain_collector_up",
            Self::BuildInfo => "chain_exporter_build_info",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Self::AccountBalance => "Native balance of an account, in ether",
            Self::AccountNonce => "Transaction count (nonce) of an account",
            Self::Erc20Balance => "ERC-20 token balance of an account, scaled by token decimals",
            Self::ContractData => "Result of a configured contract call, scaled by output decimals",
            Self::BlockHashFingerprint => "Block hash fingerprint reported by a replica endpoint",
            Self::StateRootFingerprint => "State root fingerprint reported by a replica endpoint",
            Self::CollectorUp => "1 if the collector task was scheduled, 0 if its configuration failed",
            Self::BuildInfo => "Exporter build information",
        }
    }

    /// Ordered label names. Writers pass label values in this order.
    pub fn label_names(self) -> &'static [&'static str] {
        match self {
            Self::AccountBalance | Self::AccountNonce => {
                &["chainName", "rpcUrl", "accountName", "accountAddress"]
            }
            Self::Erc20Balance => &["chainName", "rpcUrl", "symbol", "accountName", "accountAddress"],
            Self::ContractData => &[
                "chainName",
                "rpcUrl",
                "contractName",
                "contractAddress",
                "methodDef",
                "args",
            ],
            Self::BlockHashFingerprint | Self::StateRootFingerprint => {
                &["chainName", "replicaName", "rpcUrl"]
            }
            Self::CollectorUp => &["chainName", "task"],
            Self::BuildInfo => &["version"],
        }
    }

    fn check_labels(self, labels: &[&str]) -> Result<(), SinkError> {
        let expected = self.label_names().len();
        if labels.len() != expected {
            return Err(SinkError::LabelMismatch {
                series: self.name(),
                expected,
                got: labels.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Series {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Destination for sampled values.
///
/// # Thread Safety
/// Implementations must accept concurrent `set` calls from many tasks, on
/// distinct or identical label sets.
pub trait MetricSink: Send + Sync + 'static {
    /// Upsert the sample for `labels` (values in [`Series::label_names`] order).
    fn set(&self, series: Series, labels: &[&str], value: f64) -> Result<(), SinkError>;
}

/// Sink backed by a Prometheus registry with one `GaugeVec` per series.
pub struct PrometheusSink {
    registry: Registry,
    gauges: HashMap<Series, GaugeVec>,
}

impl PrometheusSink {
    /// Create a fresh registry and register every [`Series`], plus the
    /// standard `process_*` metrics of this process on Linux.
    pub fn new() -> Result<Self, SinkError> {
        let registry = Registry::new();
        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;
        let mut gauges = HashMap::with_capacity(Series::ALL.len());
        for series in Series::ALL {
            let gauge = GaugeVec::new(Opts::new(series.name(), series.help()), series.label_names())?;
            registry.register(Box::new(gauge.clone()))?;
            gauges.insert(series, gauge);
        }
        Ok(Self { registry, gauges })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Current value of a sample, if it has ever been written.
    pub fn get(&self, series: Series, labels: &[&str]) -> Option<f64> {
        series.check_labels(labels).ok()?;
        let families = self.registry.gather();
        let family = families.iter().find(|f| f.get_name() == series.name())?;
        family
            .get_metric()
            .iter()
            .find(|m| {
                let pairs = m.get_label();
                series.label_names().iter().zip(labels).all(|(name, value)| {
                    pairs
                        .iter()
                        .any(|p| p.get_name() == *name && p.get_value() == *value)
                })
            })
            .map(|m| m.get_gauge().get_value())
    }

    /// Encode everything in the registry in the Prometheus text format.
    pub fn gather_text(&self) -> Result<String, SinkError> {
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl MetricSink for PrometheusSink {
    fn set(&self, series: Series, labels: &[&str], value: f64) -> Result<(), SinkError> {
        series.check_labels(labels)?;
        // Every series is inserted in `new`.
        if let Some(gauge) = self.gauges.get(&series) {
            gauge.get_metric_with_label_values(labels)?.set(value);
        }
        Ok(())
    }
}

type SampleKey = (Series, Vec<String>);

/// In-process sink holding plain values; used by tests and dry runs.
#[derive(Default)]
pub struct MemorySink {
    samples: RwLock<HashMap<SampleKey, f64>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, series: Series, labels: &[&str]) -> Option<f64> {
        let key = (series, labels.iter().map(|l| l.to_string()).collect());
        self.read().get(&key).copied()
    }

    /// All samples of one series, sorted by label values.
    pub fn series(&self, series: Series) -> Vec<(Vec<String>, f64)> {
        let mut out: Vec<_> = self
            .read()
            .iter()
            .filter(|((s, _), _)| *s == series)
            .map(|((_, labels), value)| (labels.clone(), *value))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Number of live samples across all series.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<SampleKey, f64>> {
        // A poisoned lock still holds consistent f64 values.
        self.samples.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl MetricSink for MemorySink {
    fn set(&self, series: Series, labels: &[&str], value: f64) -> Result<(), SinkError> {
        series.check_labels(labels)?;
        let key = (series, labels.iter().map(|l| l.to_string()).collect());
        self.samples
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, value);
        Ok(())
    }
}
