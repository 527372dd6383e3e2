//! Configuration types for cnpj-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the download pipeline
///
/// Every knob has a documented default; a config is loadable from a TOML
/// file or built in code via `Config { base_url: ..., ..Default::default() }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Root URL of the portal's directory listing
    /// (default: the CNPJ open-data portal root)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Destination directory for downloaded archives
    /// (default: "./Downloads_CNPJ")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Timeout for each HTTP request, connect through body read (default: 300)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum download attempts per file (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff base in seconds; the delay before attempt n is
    /// `backoff_secs * n` (default: 10, so 20s before attempt 2, 30s before
    /// attempt 3)
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,

    /// Escalate a completed-but-size-mismatched transfer to a failed attempt
    /// (default: false)
    ///
    /// When off, a transfer whose byte count differs from `Content-Length`
    /// is logged as a warning, reported unverified, and still counts as
    /// success.
    #[serde(default)]
    pub strict_size_check: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            download_dir: default_download_dir(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_secs: default_backoff_secs(),
            strict_size_check: false,
        }
    }
}

impl Config {
    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Backoff base as a [`Duration`]
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }
}

fn default_base_url() -> String {
    "https://arquivos.receitafederal.gov.br/dados/cnpj/dados_abertos_cnpj/".to_string()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./Downloads_CNPJ")
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_secs() -> u64 {
    10
}
