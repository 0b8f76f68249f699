//! Configuration file
//!
//! JSON file with optional `server`, `store` and `log_filter` sections.
//! Missing sections and fields fall back to defaults; command line flags
//! and environment variables override what the file says.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::args::Overrides;
use super::errors::{CliError, CliResult};
use crate::http_server::HttpServerConfig;
use crate::observability::DEFAULT_LOG_FILTER;
use crate::store::StoreConfig;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: HttpServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    /// tracing filter directives used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: HttpServerConfig::default(),
            store: StoreConfig::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from file, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Apply command line / environment overrides
    pub fn with_overrides(mut self, overrides: Overrides) -> CliResult<Self> {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(data_dir) = overrides.data_dir {
            self.store.data_dir = Some(data_dir);
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> CliResult<()> {
        self.server.validate().map_err(CliError::config_error)?;

        for (name, value) in [
            ("store.database", &self.store.database),
            ("store.collection", &self.store.collection),
        ] {
            if value.is_empty() || value.contains(&['/', '\\'][..]) || value == ".." {
                return Err(CliError::config_error(format!(
                    "Invalid {}: '{}'",
                    name, value
                )));
            }
        }

        Ok(())
    }
}
