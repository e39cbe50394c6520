//! Configuration for building and serving the module graph.
//!
//! Loaded from a TOML file; every field has a default so a partial file (or
//! no file at all) is valid.
//!
//! ```toml
//! root = "src/cf"
//! extension = "bsl"
//! module_name_depth = 2
//!
//! [server]
//! bind = "0.0.0.0:8080"
//!
//! [query]
//! product = "Управление торговлей"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{GraphError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Directory holding the source modules.
    pub root: PathBuf,
    /// File extension of source modules, without the dot.
    pub extension: String,
    /// How many directories above the file the module name sits.
    /// `CommonModules/<Name>/Ext/Module.bsl` needs 2.
    pub module_name_depth: usize,
    /// Drop a leading UTF-8 byte-order mark before parsing.
    pub strip_bom: bool,
    pub server: ServerConfig,
    pub query: QueryConfig,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            extension: "bsl".to_string(),
            module_name_depth: 2,
            strip_bom: true,
            server: ServerConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address for the HTTP server.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Product label returned by `init`.
    pub product: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            product: "Module Graph".to_string(),
        }
    }
}

impl GraphConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| GraphError::Config(e.to_string()))
    }

    /// Load from `path`, falling back to defaults when the file is missing
    /// or invalid.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                if path.exists() {
                    warn!(path = %path.display(), error = %e, "cannot read config, using defaults");
                } else {
                    debug!(path = %path.display(), "no config file, using defaults");
                }
                return Self::default();
            }
        };

        match Self::from_toml_str(&text) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Self::default()
            }
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }
}
