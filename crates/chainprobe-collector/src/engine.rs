//! Task registry, scheduling loop and shutdown.

use std::collections::HashMap;
use std::sync::Arc;

use chainprobe_core::Series;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::collector::Collector;
use crate::error::SetupError;

/// The set of collectors to run, and who owns which series.
///
/// Registration rejects any collector that would write a (series, labels)
/// pair another registered collector already writes, so every sample in the
/// sink has exactly one writer.
#[derive(Default)]
pub struct Engine {
    tasks: Vec<Arc<dyn Collector>>,
    owners: HashMap<(Series, Vec<String>), String>,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an externally owned token, e.g. one shared with the HTTP server.
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..Self::default()
        }
    }

    /// Add a collector.
    ///
    /// # Errors
    /// [`SetupError::DuplicateSeries`] if any of its series is already owned.
    /// Nothing is registered in that case.
    pub fn register(&mut self, collector: Arc<dyn Collector>) -> Result<(), SetupError> {
        let owned = collector.owned_series();
        for (series, labels) in &owned {
            if let Some(owner) = self.owners.get(&(*series, labels.clone())) {
                return Err(SetupError::DuplicateSeries {
                    series: *series,
                    labels: labels.clone(),
                    owner: owner.clone(),
                });
            }
        }

        let name = collector.name().to_string();
        for key in owned {
            self.owners.insert(key, name.clone());
        }
        self.tasks.push(collector);
        Ok(())
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawn one tokio task per collector. Must be called inside a runtime.
    pub fn start(self) -> EngineHandle {
        tracing::info!(tasks = self.tasks.len(), "starting collectors");
        let tasks = self
            .tasks
            .into_iter()
            .map(|collector| {
                let name = collector.name().to_string();
                let handle = tokio::spawn(run_collector(collector, self.cancel.clone()));
                (name, handle)
            })
            .collect();
        EngineHandle {
            cancel: self.cancel,
            tasks,
        }
    }
}

/// Running collectors. Dropping the handle does not stop them; call
/// [`shutdown`](Self::shutdown) or cancel the token.
pub struct EngineHandle {
    cancel: CancellationToken,
    tasks: Vec<(String, JoinHandle<()>)>,
}

impl EngineHandle {
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Cancel every collector and wait until all of them have returned.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for (name, handle) in self.tasks {
            if let Err(e) = handle.await {
                tracing::error!(task = %name, error = %e, "collector task panicked");
            }
        }
        tracing::info!("all collectors stopped");
    }
}

/// Tick, sleep, repeat until cancelled. Cancellation interrupts both the
/// in-flight tick and the sleep.
async fn run_collector(collector: Arc<dyn Collector>, cancel: CancellationToken) {
    let interval = collector.interval();
    tracing::info!(
        task = collector.name(),
        interval_secs = interval.as_secs(),
        "collector started"
    );

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = collector.tick() => match result {
                Ok(()) => tracing::debug!(task = collector.name(), "tick ok"),
                Err(e) => tracing::warn!(task = collector.name(), error = %e, "tick failed"),
            },
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(interval) => {}
        }
    }

    tracing::info!(task = collector.name(), "collector stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Counting {
        name: String,
        labels: Vec<String>,
        ticks: Arc<AtomicUsize>,
        stall: bool,
    }

    impl Counting {
        fn new(name: &str, label: &str) -> Self {
            Self {
                name: name.to_string(),
                labels: vec!["chain".to_string(), label.to_string()],
                ticks: Arc::new(AtomicUsize::new(0)),
                stall: false,
            }
        }
    }

    #[async_trait]
    impl Collector for Counting {
        fn name(&self) -> &str {
            &self.name
        }

        fn interval(&self) -> Duration {
            Duration::from_secs(5)
        }

        fn owned_series(&self) -> Vec<(Series, Vec<String>)> {
            vec![(Series::CollectorUp, self.labels.clone())]
        }

        async fn tick(&self) -> Result<(), CollectError> {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            if self.stall {
                std::future::pending::<()>().await;
            }
            Ok(())
        }
    }

    #[test]
    fn duplicate_series_is_rejected() {
        let mut engine = Engine::new();
        engine.register(Arc::new(Counting::new("a", "x"))).unwrap();
        let err = engine
            .register(Arc::new(Counting::new("b", "x")))
            .unwrap_err();

        match err {
            SetupError::DuplicateSeries { owner, .. } => assert_eq!(owner, "a"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(engine.task_names(), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_interval() {
        let collector = Counting::new("a", "x");
        let ticks = collector.ticks.clone();
        let mut engine = Engine::new();
        engine.register(Arc::new(collector)).unwrap();

        let handle = engine.start();
        tokio::time::sleep(Duration::from_millis(12_500)).await;
        handle.shutdown().await;

        // t = 0, 5, 10
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn shutdown_interrupts_stalled_tick() {
        let mut collector = Counting::new("a", "x");
        collector.stall = true;
        let ticks = collector.ticks.clone();
        let mut engine = Engine::new();
        engine.register(Arc::new(collector)).unwrap();

        let handle = engine.start();
        while ticks.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
            .await
            .expect("shutdown must not wait for the stalled tick");
    }

    #[tokio::test]
    async fn external_token_stops_engine() {
        let token = CancellationToken::new();
        let mut engine = Engine::with_cancellation(token.clone());
        engine.register(Arc::new(Counting::new("a", "x"))).unwrap();
        let handle = engine.start();
        assert_eq!(handle.task_count(), 1);

        token.cancel();
        assert!(handle.cancel_token().is_cancelled());
        handle.shutdown().await;
    }
}
