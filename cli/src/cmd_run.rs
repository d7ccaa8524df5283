//! `chainprobe run` — collectors plus the /metrics server.

use std::sync::Arc;

use anyhow::{Context, Result};
use chainprobe_collector::{build_engine, http_connector};
use chainprobe_core::{MetricSink, PrometheusSink, Series};
use chainprobe_observability::{bind, init_tracing, serve};
use chainprobe_rpc::{ChainRpc, EthClient};

use crate::settings::FileConfig;
use crate::Target;

pub async fn run(
    target: &Target,
    listen_address: &str,
    log_level: Option<String>,
    json_logs: bool,
) -> Result<()> {
    let FileConfig { exporter, mut log } = FileConfig::load(&target.config)?;
    if let Some(level) = log_level {
        log.level = level;
    }
    log.json |= json_logs;
    init_tracing(&log)?;

    let sink = Arc::new(PrometheusSink::new()?);
    sink.set(Series::BuildInfo, &[env!("CARGO_PKG_VERSION")], 1.0)?;

    let timeout = exporter.rpc_timeout();
    let client = Arc::new(
        EthClient::http(&target.rpc_url, timeout)
            .with_context(|| format!("creating client for '{}'", target.rpc_url))?,
    );
    match client.current_block_height().await {
        Ok(height) => tracing::info!(
            chain = %target.chain_name,
            url = %target.rpc_url,
            height,
            "connected to main endpoint"
        ),
        Err(e) => tracing::warn!(
            url = %target.rpc_url,
            error = %e,
            "main endpoint not answering, collectors will keep retrying"
        ),
    }

    let listener = bind(listen_address).await?;
    let built = build_engine(
        &exporter,
        &target.chain_name,
        client,
        http_connector(timeout),
        sink.clone(),
    )?;
    if !built.failures.is_empty() {
        tracing::warn!(
            failed = built.failures.len(),
            "running without tasks that failed to build"
        );
    }

    let handle = built.engine.start();
    let cancel = handle.cancel_token();
    let mut server = tokio::spawn(serve(listener, sink, cancel.clone()));

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("waiting for ctrl-c")?;
            tracing::info!("interrupt received, shutting down");
        }
        result = &mut server => {
            // The server only returns early on error.
            handle.shutdown().await;
            return result.context("metrics server task")?.map_err(Into::into);
        }
    }

    handle.shutdown().await;
    server.await.context("metrics server task")??;
    Ok(())
}
