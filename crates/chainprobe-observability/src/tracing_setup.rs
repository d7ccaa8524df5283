//! Tracing / logging initialisation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::ObservabilityError;

/// Log level per component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Global default level: "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_level")]
    pub level: String,
    /// Override per component: component_name → level
    #[serde(default)]
    pub components: BTreeMap<String, String>,
    /// Emit JSON structured logs (true) or human-readable text (false)
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            components: BTreeMap::new(),
            json: false,
        }
    }
}

impl LogConfig {
    /// The `EnvFilter` directive string, e.g. `info,chainprobe_rpc=debug`.
    pub fn directives(&self) -> String {
        let mut directives = self.level.clone();
        for (component, level) in &self.components {
            directives.push_str(&format!(",{}={}", component.replace('-', "_"), level));
        }
        directives
    }

    /// Parse the directives without installing anything.
    pub fn filter(&self) -> Result<EnvFilter, ObservabilityError> {
        let directives = self.directives();
        EnvFilter::try_new(&directives).map_err(|e| ObservabilityError::Filter {
            directives,
            reason: e.to_string(),
        })
    }
}

/// Install the global subscriber. Call once at startup.
pub fn init_tracing(config: &LogConfig) -> Result<(), ObservabilityError> {
    let filter = config.filter()?;

    let result = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init()
    };
    result.map_err(|e| ObservabilityError::Init(e.to_string()))
}
