//! Arbitrary read-only contract call with a configured ABI.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;
use chainprobe_core::decode::decode_scaled_word;
use chainprobe_core::{ContractCallConfig, MetricSink, PreparedCall, Series};
use chainprobe_rpc::ChainRpc;

use crate::collector::{label_refs, parse_address, ChainLabels, Collector};
use crate::error::{CollectError, SetupError};

/// Re-executes one pre-encoded call per tick and writes `chain_contractdata`.
///
/// The ABI is parsed, the sole function selected and the arguments coerced
/// exactly once, in [`new`](Self::new). Only the on-chain result varies
/// between ticks; it is decoded from the last 32-byte word.
pub struct ContractCallCollector {
    name: String,
    contract: Address,
    call: PreparedCall,
    output_decimals: u8,
    labels: Vec<String>,
    interval: Duration,
    client: Arc<dyn ChainRpc>,
    sink: Arc<dyn MetricSink>,
}

impl ContractCallCollector {
    pub fn new(
        chain: &ChainLabels,
        call_name: &str,
        config: &ContractCallConfig,
        interval: Duration,
        client: Arc<dyn ChainRpc>,
        sink: Arc<dyn MetricSink>,
    ) -> Result<Self, SetupError> {
        let contract_address = config.contract_address.trim();
        let contract = parse_address(
            &format!("contractCall.{call_name}.contractAddress"),
            contract_address,
        )?;
        let call = PreparedCall::from_abi_json(&config.abi_definition, &config.args)?;
        let args = config.args.join("_");
        let labels = chain.with(&[
            &config.contract_name,
            contract_address,
            call.method_name(),
            &args,
        ]);

        Ok(Self {
            name: format!("call/{call_name}"),
            contract,
            call,
            output_decimals: config.output_decimals,
            labels,
            interval,
            client,
            sink,
        })
    }

    pub fn method_signature(&self) -> String {
        self.call.signature()
    }
}

#[async_trait]
impl Collector for ContractCallCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn owned_series(&self) -> Vec<(Series, Vec<String>)> {
        vec![(Series::ContractData, self.labels.clone())]
    }

    async fn tick(&self) -> Result<(), CollectError> {
        let data = self
            .client
            .call_contract(self.contract, self.call.calldata())
            .await?;
        let value = decode_scaled_word(&data, self.output_decimals)?;
        self.sink
            .set(Series::ContractData, &label_refs(&self.labels), value)?;
        tracing::debug!(task = %self.name, value, "contract data updated");
        Ok(())
    }
}
