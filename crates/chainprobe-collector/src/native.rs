//! Native balance and nonce of one account.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;
use chainprobe_core::decode::wei_to_ether;
use chainprobe_core::{MetricSink, Series};
use chainprobe_rpc::ChainRpc;

use crate::collector::{label_refs, parse_address, ChainLabels, Collector};
use crate::error::{CollectError, SetupError};

/// Writes `chain_accountbalance` (ether) and `chain_account_nounce` per tick.
///
/// The two reads are independent: if one fails the other is still written,
/// and the failed series keeps its previous value.
pub struct NativeBalanceCollector {
    name: String,
    address: Address,
    labels: Vec<String>,
    interval: Duration,
    client: Arc<dyn ChainRpc>,
    sink: Arc<dyn MetricSink>,
}

impl NativeBalanceCollector {
    pub fn new(
        chain: &ChainLabels,
        account_name: &str,
        account_address: &str,
        interval: Duration,
        client: Arc<dyn ChainRpc>,
        sink: Arc<dyn MetricSink>,
    ) -> Result<Self, SetupError> {
        let account_address = account_address.trim();
        let address = parse_address(&format!("balance.{account_name}"), account_address)?;
        Ok(Self {
            name: format!("balance/{account_name}"),
            address,
            labels: chain.with(&[account_name, account_address]),
            interval,
            client,
            sink,
        })
    }
}

#[async_trait]
impl Collector for NativeBalanceCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn owned_series(&self) -> Vec<(Series, Vec<String>)> {
        vec![
            (Series::AccountBalance, self.labels.clone()),
            (Series::AccountNonce, self.labels.clone()),
        ]
    }

    async fn tick(&self) -> Result<(), CollectError> {
        let (balance, nonce) = tokio::join!(
            self.client.balance_at(self.address),
            self.client.nonce_at(self.address)
        );
        let labels = label_refs(&self.labels);
        let mut failure = None;

        match balance {
            Ok(wei) => {
                let ether = wei_to_ether(wei);
                self.sink.set(Series::AccountBalance, &labels, ether)?;
                tracing::debug!(task = %self.name, balance = ether, "balance updated");
            }
            Err(e) => failure = Some(e),
        }

        match nonce {
            Ok(n) => {
                self.sink.set(Series::AccountNonce, &labels, n as f64)?;
                tracing::debug!(task = %self.name, nonce = n, "nonce updated");
            }
            Err(e) => failure = failure.or(Some(e)),
        }

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
