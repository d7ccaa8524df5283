//! Turns an [`ExporterConfig`] into a ready-to-start [`Engine`].

use std::sync::Arc;
use std::time::Duration;

use chainprobe_core::{ExporterConfig, MetricSink, Series};
use chainprobe_rpc::{ChainRpc, EthClient, TransportError};

use crate::collector::{ChainLabels, Collector};
use crate::consistency::{ConsistencyChecker, Replica, CONSISTENCY_TASK};
use crate::contract::ContractCallCollector;
use crate::engine::Engine;
use crate::error::{BuildError, SetupError, TaskFailure};
use crate::native::NativeBalanceCollector;
use crate::token::{TokenBalanceCollector, TokenTarget};

/// An engine plus the tasks that were left out of it.
///
/// `failures` is only ever non-empty when `isolateFailures` is set.
pub struct BuiltEngine {
    pub engine: Engine,
    pub failures: Vec<TaskFailure>,
}

/// Opens a client for every endpoint URL the consistency checker needs.
pub fn http_connector(
    timeout: Duration,
) -> impl Fn(&str) -> Result<Arc<dyn ChainRpc>, TransportError> {
    move |url: &str| Ok(Arc::new(EthClient::http(url, timeout)?) as Arc<dyn ChainRpc>)
}

/// Build every configured task.
///
/// `client` serves the balance, token and contract-call collectors;
/// `connect` opens one client per consistency endpoint so that no two
/// endpoints share a handle. Every task's `chain_collector_up` gauge is
/// written here: 1 if it was registered, 0 if it failed to build.
///
/// # Errors
/// Unless `isolate_failures` is set, any failed task aborts the build with
/// [`BuildError::Tasks`] listing all of them.
pub fn build_engine<F>(
    config: &ExporterConfig,
    chain_name: &str,
    client: Arc<dyn ChainRpc>,
    connect: F,
    sink: Arc<dyn MetricSink>,
) -> Result<BuiltEngine, BuildError>
where
    F: Fn(&str) -> Result<Arc<dyn ChainRpc>, TransportError>,
{
    let chain = ChainLabels::new(chain_name, client.url());
    let interval = config.scrape_interval();
    let mut builder = Builder {
        engine: Engine::new(),
        built: Vec::new(),
        failures: Vec::new(),
    };

    for (account, address) in &config.balance {
        builder.add(
            format!("balance/{account}"),
            NativeBalanceCollector::new(
                &chain,
                account,
                address,
                interval,
                client.clone(),
                sink.clone(),
            ),
        );
    }

    for (symbol, token) in &config.erc20_balance {
        for (account, address) in &token.accounts {
            let target = TokenTarget {
                symbol,
                contract_address: &token.contract_address,
                decimals: token.decimals,
                account_name: account,
                account_address: address,
            };
            builder.add(
                format!("erc20/{symbol}/{account}"),
                TokenBalanceCollector::new(&chain, target, interval, client.clone(), sink.clone()),
            );
        }
    }

    for (name, call) in &config.contract_call {
        builder.add(
            format!("call/{name}"),
            ContractCallCollector::new(
                &chain,
                name,
                call,
                config.call_interval(call),
                client.clone(),
                sink.clone(),
            ),
        );
    }

    if let Some(canonical_url) = config.consistency_endpoint() {
        let checker = consistency_checker(config, chain_name, canonical_url, &connect, &sink);
        builder.add(CONSISTENCY_TASK.to_string(), checker);
    }

    builder.finish(config.isolate_failures, chain_name, sink.as_ref())
}

fn consistency_checker<F>(
    config: &ExporterConfig,
    chain_name: &str,
    canonical_url: &str,
    connect: &F,
    sink: &Arc<dyn MetricSink>,
) -> Result<ConsistencyChecker, SetupError>
where
    F: Fn(&str) -> Result<Arc<dyn ChainRpc>, TransportError>,
{
    let open = |url: &str| {
        connect(url).map_err(|source| SetupError::Connect {
            url: url.to_string(),
            source,
        })
    };

    let canonical = open(canonical_url)?;
    let replicas = config
        .replica_rpc_endpoints
        .iter()
        .map(|(name, url)| open(url).map(|client| Replica::new(name.clone(), client)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ConsistencyChecker::new(
        chain_name,
        canonical,
        replicas,
        config.hash_check_backward_offset,
        config.scrape_interval(),
        sink.clone(),
    ))
}

struct Builder {
    engine: Engine,
    built: Vec<String>,
    failures: Vec<TaskFailure>,
}

impl Builder {
    fn add<C: Collector>(&mut self, task: String, collector: Result<C, SetupError>) {
        let registered = collector.and_then(|c| self.engine.register(Arc::new(c)));
        match registered {
            Ok(()) => self.built.push(task),
            Err(error) => {
                tracing::error!(task = %task, error = %error, "task failed to build");
                self.failures.push(TaskFailure { task, error });
            }
        }
    }

    fn finish(
        self,
        isolate_failures: bool,
        chain_name: &str,
        sink: &dyn MetricSink,
    ) -> Result<BuiltEngine, BuildError> {
        if !self.failures.is_empty() && !isolate_failures {
            return Err(BuildError::Tasks(self.failures));
        }

        for task in &self.built {
            sink.set(Series::CollectorUp, &[chain_name, task.as_str()], 1.0)?;
        }
        for failure in &self.failures {
            sink.set(Series::CollectorUp, &[chain_name, failure.task.as_str()], 0.0)?;
            tracing::warn!(task = %failure.task, "task isolated, marked down");
        }

        Ok(BuiltEngine {
            engine: self.engine,
            failures: self.failures,
        })
    }
}
