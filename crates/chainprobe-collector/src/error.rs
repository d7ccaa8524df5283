//! Error types for collector ticks and engine construction.

use chainprobe_core::{AbiError, DecodeError, Series, SinkError};
use chainprobe_rpc::TransportError;
use thiserror::Error;

/// A failed tick. Always transient: logged, and the next tick retries.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Rpc(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Some replicas could not be checked this tick; the others were written.
    #[error("{} of {total} replicas failed: {}", .failures.len(), format_failures(.failures))]
    Replicas {
        total: usize,
        failures: Vec<(String, String)>,
    },
}

fn format_failures(failures: &[(String, String)]) -> String {
    failures
        .iter()
        .map(|(name, reason)| format!("{name}: {reason}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// A task that cannot be constructed from its configuration.
///
/// Never retried: the configuration has to change.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Invalid address in '{field}': '{value}' ({reason})")]
    Address {
        field: String,
        value: String,
        reason: String,
    },

    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),

    #[error("Cannot connect to '{url}': {source}")]
    Connect {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("Series {series} {labels:?} is already owned by task '{owner}'")]
    DuplicateSeries {
        series: Series,
        labels: Vec<String>,
        owner: String,
    },
}

/// One task that failed to build.
#[derive(Debug)]
pub struct TaskFailure {
    pub task: String,
    pub error: SetupError,
}

impl std::fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.task, self.error)
    }
}

fn format_task_failures(failures: &[TaskFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Engine construction failed.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{} task(s) failed to build: {}", .0.len(), format_task_failures(.0))]
    Tasks(Vec<TaskFailure>),

    #[error(transparent)]
    Sink(#[from] SinkError),
}
