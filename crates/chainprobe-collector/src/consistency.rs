//! Cross-replica consistency checker.
//!
//! Each check asks the canonical endpoint for the chain head, steps back by
//! the configured offset, fetches that block from every replica concurrently
//! and exports two fingerprints per replica. Replicas that agree on the block
//! export identical values.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chainprobe_core::{BlockFingerprints, BlockTag, DecodeError, MetricSink, Series};
use chainprobe_rpc::ChainRpc;
use futures::future::join_all;

use crate::collector::{label_refs, Collector};
use crate::error::CollectError;

/// Task name of the consistency checker.
pub const CONSISTENCY_TASK: &str = "consistency";

/// A named replica endpoint with its own client.
#[derive(Clone)]
pub struct Replica {
    pub name: String,
    pub client: Arc<dyn ChainRpc>,
}

impl Replica {
    pub fn new(name: impl Into<String>, client: Arc<dyn ChainRpc>) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }

    /// `[chainName, replicaName, rpcUrl]`
    fn labels(&self, chain_name: &str) -> Vec<String> {
        vec![
            chain_name.to_string(),
            self.name.clone(),
            self.client.url().to_string(),
        ]
    }
}

/// Outcome of one replica within one check.
#[derive(Debug)]
pub struct ReplicaOutcome {
    pub name: String,
    pub url: String,
    pub result: Result<BlockFingerprints, CollectError>,
}

/// Result of one consistency check.
#[derive(Debug)]
pub struct ConsistencyReport {
    /// Chain head reported by the canonical endpoint.
    pub head: u64,
    /// Block every replica was asked for.
    pub target: u64,
    /// One entry per replica, in configuration order.
    pub replicas: Vec<ReplicaOutcome>,
}

impl ConsistencyReport {
    pub fn failures(&self) -> impl Iterator<Item = &ReplicaOutcome> {
        self.replicas.iter().filter(|r| r.result.is_err())
    }

    /// True when every replica answered and all fingerprints are equal.
    pub fn is_consistent(&self) -> bool {
        let mut seen = self.replicas.iter().map(|r| r.result.as_ref().ok());
        match seen.next() {
            Some(Some(first)) => seen.all(|fp| fp == Some(first)),
            Some(None) => false,
            None => true,
        }
    }
}

pub struct ConsistencyChecker {
    chain_name: String,
    canonical: Arc<dyn ChainRpc>,
    replicas: Vec<Replica>,
    backward_offset: u64,
    interval: Duration,
    sink: Arc<dyn MetricSink>,
}

impl ConsistencyChecker {
    pub fn new(
        chain_name: impl Into<String>,
        canonical: Arc<dyn ChainRpc>,
        replicas: Vec<Replica>,
        backward_offset: u64,
        interval: Duration,
        sink: Arc<dyn MetricSink>,
    ) -> Self {
        Self {
            chain_name: chain_name.into(),
            canonical,
            replicas,
            backward_offset,
            interval,
            sink,
        }
    }

    /// Run one check and write the fingerprints of every replica that
    /// answered for the target block.
    ///
    /// # Errors
    /// Fails as a whole only if the canonical head cannot be read. Replica
    /// failures are reported per replica in the returned report.
    pub async fn check(&self) -> Result<ConsistencyReport, CollectError> {
        let head = self.canonical.current_block_height().await?;
        let target = head.saturating_sub(self.backward_offset);

        let outcomes = join_all(
            self.replicas
                .iter()
                .map(|replica| self.check_replica(replica, target)),
        )
        .await;

        let replicas = self
            .replicas
            .iter()
            .zip(outcomes)
            .map(|(replica, result)| ReplicaOutcome {
                name: replica.name.clone(),
                url: replica.client.url().to_string(),
                result,
            })
            .collect();

        Ok(ConsistencyReport {
            head,
            target,
            replicas,
        })
    }

    async fn check_replica(
        &self,
        replica: &Replica,
        target: u64,
    ) -> Result<BlockFingerprints, CollectError> {
        let header = replica
            .client
            .block_by_number(BlockTag::Number(target))
            .await?;
        if header.number != target {
            return Err(DecodeError::BlockMismatch {
                requested: target,
                returned: header.number,
            }
            .into());
        }

        let fingerprints = BlockFingerprints::of(&header);
        let labels = replica.labels(&self.chain_name);
        let labels = label_refs(&labels);
        self.sink.set(
            Series::BlockHashFingerprint,
            &labels,
            fingerprints.block_hash as f64,
        )?;
        self.sink.set(
            Series::StateRootFingerprint,
            &labels,
            fingerprints.state_root as f64,
        )?;
        Ok(fingerprints)
    }
}

#[async_trait]
impl Collector for ConsistencyChecker {
    fn name(&self) -> &str {
        CONSISTENCY_TASK
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn owned_series(&self) -> Vec<(Series, Vec<String>)> {
        self.replicas
            .iter()
            .flat_map(|replica| {
                let labels = replica.labels(&self.chain_name);
                [
                    (Series::BlockHashFingerprint, labels.clone()),
                    (Series::StateRootFingerprint, labels),
                ]
            })
            .collect()
    }

    async fn tick(&self) -> Result<(), CollectError> {
        let report = self.check().await?;

        let failures: Vec<(String, String)> = report
            .failures()
            .filter_map(|r| {
                r.result
                    .as_ref()
                    .err()
                    .map(|e| (r.name.clone(), e.to_string()))
            })
            .collect();
        if !failures.is_empty() {
            return Err(CollectError::Replicas {
                total: report.replicas.len(),
                failures,
            });
        }

        if report.is_consistent() {
            tracing::debug!(
                head = report.head,
                block = report.target,
                replicas = report.replicas.len(),
                "replicas agree"
            );
        } else {
            tracing::warn!(
                head = report.head,
                block = report.target,
                "replicas disagree on block contents"
            );
        }
        Ok(())
    }
}
