//! Exporter configuration model.
//!
//! The YAML keys are camelCase. `abiDefination` keeps the spelling used by
//! existing deployment files; `abiDefinition` is accepted as an alias.
//!
//! ```yaml
//! scrapeIntervalSeconds: 15
//! balance:
//!   treasury: "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"
//! erc20balance:
//!   USDC:
//!     contractAddress: "0xA0b8..."
//!     decimals: 6
//!     accounts:
//!       treasury: "0xd8dA..."
//! contractCall:
//!   reserve:
//!     contractName: Pool
//!     contractAddress: "0x..."
//!     scrapeIntervalSeconds: 60
//!     abiDefination: '[{"type":"function","name":"getReserve",...}]'
//!     outputDecimals: 2
//!     args: ["0x..."]
//! standardRpcEndpoint: "https://canonical.example"
//! replicaRpcEndpoints:
//!   ankr: "https://rpc.ankr.com/eth"
//! hashCheckBackwardOffset: 2
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::decode::{ETHER_DECIMALS, MAX_DECIMALS};
use crate::error::ConfigError;

fn default_scrape_interval() -> u64 {
    15
}

fn default_rpc_timeout() -> u64 {
    10
}

fn default_token_decimals() -> u8 {
    ETHER_DECIMALS
}

/// Top-level exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExporterConfig {
    /// Default polling interval for every task without its own.
    #[serde(default = "default_scrape_interval")]
    pub scrape_interval_seconds: u64,
    /// Per-RPC-call timeout.
    #[serde(default = "default_rpc_timeout")]
    pub rpc_timeout_seconds: u64,
    /// account name → address
    #[serde(default)]
    pub balance: BTreeMap<String, String>,
    /// token symbol → token config
    #[serde(default, rename = "erc20balance")]
    pub erc20_balance: BTreeMap<String, Erc20Config>,
    /// call name → call config
    #[serde(default)]
    pub contract_call: BTreeMap<String, ContractCallConfig>,
    /// Canonical endpoint for the consistency checker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_rpc_endpoint: Option<String>,
    /// replica name → URL
    #[serde(default)]
    pub replica_rpc_endpoints: BTreeMap<String, String>,
    /// Compare this many blocks behind the canonical tip.
    #[serde(default)]
    pub hash_check_backward_offset: u64,
    /// Keep running when a task fails to build; mark it down instead.
    #[serde(default)]
    pub isolate_failures: bool,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            scrape_interval_seconds: default_scrape_interval(),
            rpc_timeout_seconds: default_rpc_timeout(),
            balance: BTreeMap::new(),
            erc20_balance: BTreeMap::new(),
            contract_call: BTreeMap::new(),
            standard_rpc_endpoint: None,
            replica_rpc_endpoints: BTreeMap::new(),
            hash_check_backward_offset: 0,
            isolate_failures: false,
        }
    }
}

/// One ERC-20 token and the accounts to watch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Erc20Config {
    pub contract_address: String,
    #[serde(default = "default_token_decimals")]
    pub decimals: u8,
    #[serde(default)]
    pub accounts: BTreeMap<String, String>,
}

/// One arbitrary read-only contract call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCallConfig {
    #[serde(default)]
    pub contract_name: String,
    pub contract_address: String,
    /// 0 or absent → the global scrape interval.
    #[serde(default)]
    pub scrape_interval_seconds: u64,
    #[serde(rename = "abiDefination", alias = "abiDefinition")]
    pub abi_definition: String,
    #[serde(default)]
    pub output_decimals: u8,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ExporterConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Structural checks that do not need the network or the ABI encoder.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scrape_interval_seconds == 0 {
            return Err(ConfigError::invalid("scrapeIntervalSeconds", "must be > 0"));
        }
        if self.rpc_timeout_seconds == 0 {
            return Err(ConfigError::invalid("rpcTimeoutSeconds", "must be > 0"));
        }
        for (symbol, token) in &self.erc20_balance {
            if token.decimals > MAX_DECIMALS {
                return Err(ConfigError::invalid(
                    format!("erc20balance.{symbol}.decimals"),
                    format!("must be <= {MAX_DECIMALS}"),
                ));
            }
        }
        for (name, call) in &self.contract_call {
            if call.output_decimals > MAX_DECIMALS {
                return Err(ConfigError::invalid(
                    format!("contractCall.{name}.outputDecimals"),
                    format!("must be <= {MAX_DECIMALS}"),
                ));
            }
        }
        if let Some(url) = &self.standard_rpc_endpoint {
            if url.trim().is_empty() {
                return Err(ConfigError::invalid("standardRpcEndpoint", "must not be empty"));
            }
        }
        for (name, url) in &self.replica_rpc_endpoints {
            if url.trim().is_empty() {
                return Err(ConfigError::invalid(
                    format!("replicaRpcEndpoints.{name}"),
                    "must not be empty",
                ));
            }
        }
        Ok(())
    }

    pub fn scrape_interval(&self) -> Duration {
        Duration::from_secs(self.scrape_interval_seconds)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_seconds)
    }

    /// A call's own interval, falling back to the global one.
    pub fn call_interval(&self, call: &ContractCallConfig) -> Duration {
        match call.scrape_interval_seconds {
            0 => self.scrape_interval(),
            secs => Duration::from_secs(secs),
        }
    }

    /// The canonical endpoint, when a consistency check is configured.
    pub fn consistency_endpoint(&self) -> Option<&str> {
        match &self.standard_rpc_endpoint {
            Some(url) if !self.replica_rpc_endpoints.is_empty() => Some(url.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
scrapeIntervalSeconds: 30
balance:
  treasury: "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"
erc20balance:
  USDC:
    contractAddress: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
    decimals: 6
    accounts:
      treasury: "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"
  WETH:
    contractAddress: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
    accounts: {}
contractCall:
  supply:
    contractName: Token
    contractAddress: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
    scrapeIntervalSeconds: 60
    abiDefination: '[{"type":"function","name":"totalSupply","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"}]'
    outputDecimals: 6
  legacy:
    contractAddress: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
    abiDefinition: '[]'
    args: ["1", "true"]
standardRpcEndpoint: "https://canonical.example"
replicaRpcEndpoints:
  ankr: "https://rpc.ankr.com/eth"
hashCheckBackwardOffset: 3
"#;

    #[test]
    fn parse_full_config() {
        let config = ExporterConfig::from_yaml_str(FULL).unwrap();
        assert_eq!(config.scrape_interval(), Duration::from_secs(30));
        assert_eq!(config.rpc_timeout(), Duration::from_secs(10));
        assert_eq!(config.balance.len(), 1);
        assert_eq!(config.erc20_balance["USDC"].decimals, 6);
        assert_eq!(config.erc20_balance["WETH"].decimals, 18);
        assert_eq!(config.contract_call["supply"].output_decimals, 6);
        assert_eq!(config.contract_call["legacy"].args, vec!["1", "true"]);
        assert_eq!(config.hash_check_backward_offset, 3);
        assert_eq!(config.consistency_endpoint(), Some("https://canonical.example"));
        assert!(!config.isolate_failures);
    }

    #[test]
    fn call_interval_falls_back_to_global() {
        let config = ExporterConfig::from_yaml_str(FULL).unwrap();
        assert_eq!(
            config.call_interval(&config.contract_call["supply"]),
            Duration::from_secs(60)
        );
        assert_eq!(
            config.call_interval(&config.contract_call["legacy"]),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = ExporterConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config.scrape_interval_seconds, 15);
        assert!(config.balance.is_empty());
        assert_eq!(config.consistency_endpoint(), None);
    }

    #[test]
    fn consistency_needs_replicas() {
        let config =
            ExporterConfig::from_yaml_str("standardRpcEndpoint: https://canonical.example").unwrap();
        assert_eq!(config.consistency_endpoint(), None);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = ExporterConfig::from_yaml_str("scrapeIntervalSeconds: 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn oversized_decimals_are_rejected() {
        let yaml = r#"
erc20balance:
  BIG:
    contractAddress: "0x0000000000000000000000000000000000000001"
    decimals: 78
"#;
        assert!(ExporterConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = ExporterConfig::from_yaml_str("balance: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}
