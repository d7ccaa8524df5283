//! ERC-20 balance of one (token, account) pair.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;
use chainprobe_core::decode::decode_scaled_word;
use chainprobe_core::{MetricSink, PreparedCall, Series};
use chainprobe_rpc::ChainRpc;

use crate::collector::{label_refs, parse_address, ChainLabels, Collector};
use crate::error::{CollectError, SetupError};

/// Calls `balanceOf(account)` on the token and writes `chain_erc20balance`.
///
/// The calldata is encoded in [`new`](Self::new); a token or account address
/// that does not parse fails construction instead of producing zero samples.
pub struct TokenBalanceCollector {
    name: String,
    token: Address,
    call: PreparedCall,
    decimals: u8,
    labels: Vec<String>,
    interval: Duration,
    client: Arc<dyn ChainRpc>,
    sink: Arc<dyn MetricSink>,
}

/// The (token, account) pair a [`TokenBalanceCollector`] watches.
#[derive(Debug, Clone, Copy)]
pub struct TokenTarget<'a> {
    pub symbol: &'a str,
    pub contract_address: &'a str,
    pub decimals: u8,
    pub account_name: &'a str,
    pub account_address: &'a str,
}

impl TokenBalanceCollector {
    pub fn new(
        chain: &ChainLabels,
        target: TokenTarget<'_>,
        interval: Duration,
        client: Arc<dyn ChainRpc>,
        sink: Arc<dyn MetricSink>,
    ) -> Result<Self, SetupError> {
        let account_address = target.account_address.trim();
        let token = parse_address(
            &format!("erc20balance.{}.contractAddress", target.symbol),
            target.contract_address,
        )?;
        // Validate separately so the error names the account field.
        parse_address(
            &format!("erc20balance.{}.accounts.{}", target.symbol, target.account_name),
            account_address,
        )?;
        let call = PreparedCall::balance_of(account_address)?;

        Ok(Self {
            name: format!("erc20/{}/{}", target.symbol, target.account_name),
            token,
            call,
            decimals: target.decimals,
            labels: chain.with(&[target.symbol, target.account_name, account_address]),
            interval,
            client,
            sink,
        })
    }
}

#[async_trait]
impl Collector for TokenBalanceCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn owned_series(&self) -> Vec<(Series, Vec<String>)> {
        vec![(Series::Erc20Balance, self.labels.clone())]
    }

    async fn tick(&self) -> Result<(), CollectError> {
        let data = self.client.call_contract(self.token, self.call.calldata()).await?;
        let balance = decode_scaled_word(&data, self.decimals)?;
        self.sink
            .set(Series::Erc20Balance, &label_refs(&self.labels), balance)?;
        tracing::debug!(task = %self.name, balance, "token balance updated");
        Ok(())
    }
}
