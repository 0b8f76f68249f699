//! Store Configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the Balade collection lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root data directory. `None` keeps the collection in memory only.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Database name (default: "Paris")
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection name (default: "balades")
    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_database() -> String {
    "Paris".to_string()
}

fn default_collection() -> String {
    "balades".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            database: default_database(),
            collection: default_collection(),
        }
    }
}

impl StoreConfig {
    /// Persistent store rooted at `data_dir`
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Default::default()
        }
    }
}
