//! Configuration for parrot-proxy.
//!
//! Everything has a default, so an absent or empty file is a valid
//! configuration. Command-line flags override file values in `main`.

mod listen;
mod pool;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use listen::{default_listen_port, ListenConfig, MetricsConfig};
pub use pool::ConnectionPoolConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,

    /// Metrics listener; absent means no metrics endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsConfig>,

    #[serde(default)]
    pub connection_pool: ConnectionPoolConfig,

    /// Default filter directive when `RUST_LOG` is not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, anyhow::Error> {
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.listen.port == 0 {
            anyhow::bail!("listen.port must be non-zero");
        }

        if let Some(ref metrics) = self.metrics {
            if metrics.port == 0 {
                anyhow::bail!("metrics.port must be non-zero");
            }
            if metrics.port == self.listen.port {
                anyhow::bail!(
                    "metrics.port ({}) must differ from listen.port",
                    metrics.port
                );
            }
        }

        if self.connection_pool.max_idle_per_host == 0 {
            anyhow::bail!("connection_pool.max_idle_per_host must be at least 1");
        }

        Ok(())
    }
}
