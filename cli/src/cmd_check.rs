//! `chainprobe check` — validate the configuration and build every task.
//!
//! Nothing is started and no RPC request is sent: addresses, ABIs, argument
//! coercion and series ownership are all checked while building.

use std::sync::Arc;

use anyhow::{Context, Result};
use chainprobe_collector::{build_engine, http_connector};
use chainprobe_core::MemorySink;
use chainprobe_rpc::EthClient;

use crate::settings::FileConfig;
use crate::Target;

pub fn run(target: &Target) -> Result<()> {
    let FileConfig { exporter, .. } = FileConfig::load(&target.config)?;
    let timeout = exporter.rpc_timeout();
    let client = Arc::new(
        EthClient::http(&target.rpc_url, timeout)
            .with_context(|| format!("creating client for '{}'", target.rpc_url))?,
    );

    let built = build_engine(
        &exporter,
        &target.chain_name,
        client,
        http_connector(timeout),
        Arc::new(MemorySink::new()),
    )?;

    println!("Configuration '{}' is valid.", target.config.display());
    println!("  Chain:  {}", target.chain_name);
    println!("  RPC:    {}", target.rpc_url);
    println!("  Tasks:  {}", built.engine.len());
    for name in built.engine.task_names() {
        println!("    ✓ {name}");
    }
    for failure in &built.failures {
        println!("    ✗ {failure}");
    }
    Ok(())
}
