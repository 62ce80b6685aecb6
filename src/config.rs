//! Operator configuration.
//!
//! Settings come from, in increasing precedence: built-in defaults, an
//! optional TOML or JSON file, `LAVINMQ_OPERATOR_*` environment variables and
//! command-line flags.

use std::path::Path;
use std::time::Duration;

use lavinmq_reconciler::ControllerSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_NAMESPACE: &str = "LAVINMQ_OPERATOR_NAMESPACE";
pub const ENV_REQUEUE_SECS: &str = "LAVINMQ_OPERATOR_REQUEUE_SECS";
pub const ENV_ERROR_REQUEUE_SECS: &str = "LAVINMQ_OPERATOR_ERROR_REQUEUE_SECS";
pub const ENV_LOG: &str = "LAVINMQ_OPERATOR_LOG";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Operator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Namespace to watch; all namespaces when unset.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Periodic resync interval after a successful cycle.
    #[serde(default = "default_requeue_secs")]
    pub requeue_secs: u64,

    /// Retry delay after a transient failure.
    #[serde(default = "default_error_requeue_secs")]
    pub error_requeue_secs: u64,

    /// `tracing` filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            requeue_secs: default_requeue_secs(),
            error_requeue_secs: default_error_requeue_secs(),
            log_filter: default_log_filter(),
        }
    }
}

impl OperatorConfig {
    /// Load configuration from a file. `.json` files are read as JSON,
    /// anything else as TOML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Apply overrides from the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(namespace) = lookup(ENV_NAMESPACE) {
            self.namespace = Some(namespace).filter(|ns| !ns.is_empty());
        }
        if let Some(value) = lookup(ENV_REQUEUE_SECS) {
            self.requeue_secs = parse_secs(ENV_REQUEUE_SECS, value)?;
        }
        if let Some(value) = lookup(ENV_ERROR_REQUEUE_SECS) {
            self.error_requeue_secs = parse_secs(ENV_ERROR_REQUEUE_SECS, value)?;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.log_filter = filter;
        }
        Ok(self)
    }

    /// Set the watched namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn settings(&self) -> ControllerSettings {
        ControllerSettings {
            requeue: Duration::from_secs(self.requeue_secs),
            error_requeue: Duration::from_secs(self.error_requeue_secs),
        }
    }
}

fn parse_secs(key: &'static str, value: String) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidValue { key, value }),
    }
}

const fn default_requeue_secs() -> u64 {
    300
}

const fn default_error_requeue_secs() -> u64 {
    15
}

fn default_log_filter() -> String {
    "info".to_string()
}
