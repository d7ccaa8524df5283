//! # chainprobe-observability
//!
//! Everything ChainProbe exposes about itself.
//!
//! ## Structured logging
//! [`init_tracing`] installs a `tracing-subscriber` with an `EnvFilter`
//! built from [`LogConfig`]: one global level plus per-crate overrides,
//! emitted as human-readable text or JSON lines.
//!
//! ## Metrics endpoint
//! [`serve`] answers `GET /metrics` with the Prometheus text encoding of a
//! [`PrometheusSink`](chainprobe_core::PrometheusSink). Every other path is 404.

pub mod error;
pub mod exporter;
pub mod tracing_setup;

pub use error::ObservabilityError;
pub use exporter::{bind, normalize_listen_address, router, serve};
pub use tracing_setup::{init_tracing, LogConfig};
