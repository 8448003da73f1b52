//! CLI configuration loading from `urbangraph.toml`.
//!
//! Configuration is optional: with no file present the CLI talks to the
//! local development backend with default paging. Flags and the
//! `URBANGRAPH_API_URL` environment variable override the file.
//!
//! # Example Configuration
//!
//! ```toml
//! [api]
//! base_url = "https://topology.example.org/api"
//! timeout_secs = 60
//! page_size = 9
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use urbangraph_client::{ClientConfig, DEFAULT_BASE_URL};

/// Config file name looked up in the working directory.
pub const CONFIG_FILE: &str = "urbangraph.toml";

/// Root configuration structure loaded from `urbangraph.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct CliConfig {
    /// Backend connection settings.
    #[serde(default)]
    pub api: ApiSection,
}

/// The `[api]` section.
#[derive(Debug, Deserialize)]
pub struct ApiSection {
    /// Backend base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Cities listed per page by default.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    9
}

impl CliConfig {
    /// Load configuration from a directory.
    ///
    /// Returns defaults if the file doesn't exist or doesn't parse; a broken
    /// config file should never keep the CLI from running.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            tracing::debug!("no config file at {:?}, using defaults", path);
            return Self::default();
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<CliConfig>(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("failed to parse {}: {}", CONFIG_FILE, e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("failed to read {}: {}", CONFIG_FILE, e);
                Self::default()
            }
        }
    }

    /// Resolve the effective client configuration, applying an optional
    /// base-URL override from flag or environment.
    pub fn client_config(&self, base_url_override: Option<&str>) -> ClientConfig {
        ClientConfig {
            base_url: base_url_override
                .map(str::to_string)
                .unwrap_or_else(|| self.api.base_url.clone()),
            timeout: Duration::from_secs(self.api.timeout_secs),
        }
    }
}
