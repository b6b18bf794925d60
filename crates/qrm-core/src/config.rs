//! Configuration management for QR Mini.
//!
//! Loads configuration from ${QRM_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Which set of paths the API client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    /// Remote paths (`/api/1/validate`, `/api/1/list`).
    #[default]
    Direct,
    /// Local paths (`/api/`, `/api/list/`) served by `qrm proxy`.
    Proxy,
}

impl ApiMode {
    pub fn display_name(self) -> &'static str {
        match self {
            ApiMode::Direct => "direct",
            ApiMode::Proxy => "proxy",
        }
    }
}

/// API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the QR-code API (or of a local proxy in `proxy` mode).
    pub base_url: String,
    /// Path set used for requests.
    pub mode: ApiMode,
    /// Request timeout in seconds (0 disables).
    pub timeout_secs: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Config::DEFAULT_BASE_URL.to_string(),
            mode: ApiMode::Direct,
            timeout_secs: Config::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.timeout_secs)))
        }
    }
}

/// Session storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the host-provided key-value store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_path: Option<String>,
}

/// Session bootstrap configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Revalidate a stored key on startup instead of trusting it.
    pub revalidate_on_startup: bool,
}

/// Development proxy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub listen: String,
    pub target: String,
    pub allowed_hosts: Vec<String>,
    pub timeout_secs: u32,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen: Config::DEFAULT_PROXY_LISTEN.to_string(),
            target: Config::DEFAULT_BASE_URL.to_string(),
            allowed_hosts: Vec::new(),
            timeout_secs: Config::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub proxy: ProxyConfig,
}

pub mod paths {
    //! Path resolution for QR Mini configuration and data directories.
    //!
    //! QRM_HOME resolution order:
    //! 1. QRM_HOME environment variable (if set)
    //! 2. ~/.config/qrm (default)

    use std::path::PathBuf;

    /// Returns the QR Mini home directory.
    pub fn qrm_home() -> PathBuf {
        if let Ok(home) = std::env::var("QRM_HOME")
            && !home.is_empty()
        {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map_or_else(|| PathBuf::from(".qrm"), |h| h.join(".config").join("qrm"))
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        qrm_home().join("config.toml")
    }

    /// Returns the path of the local fallback key-value store.
    pub fn local_storage_path() -> PathBuf {
        qrm_home().join("storage.json")
    }

    /// Returns the directory for log files.
    pub fn logs_dir() -> PathBuf {
        qrm_home().join("logs")
    }

    /// Host store path from `QRM_HOST_STORAGE`, if set.
    pub fn host_storage_override() -> Option<PathBuf> {
        std::env::var("QRM_HOST_STORAGE")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    }
}

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

impl Config {
    pub const DEFAULT_BASE_URL: &str = "https://g-qr.ru";
    const DEFAULT_TIMEOUT_SECS: u32 = 30;
    const DEFAULT_PROXY_LISTEN: &str = "127.0.0.1:5173";

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Host store path: `QRM_HOST_STORAGE` first, then `storage.host_path`.
    pub fn host_storage_path(&self) -> Option<PathBuf> {
        paths::host_storage_override().or_else(|| {
            self.storage
                .host_path
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
        })
    }

    /// Base URL for QR images. In proxy mode the API base is the local
    /// proxy, which only forwards `/api` paths, so images come from the
    /// proxy's remote target instead.
    pub fn image_base_url(&self, api_base_url: &str) -> String {
        let base = match self.api.mode {
            ApiMode::Direct => api_base_url,
            ApiMode::Proxy => self.proxy.target.trim(),
        };
        base.trim_end_matches('/').to_string()
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Generates a fresh config TOML from Rust defaults.
    ///
    /// Uses the embedded template for structure/comments and merges
    /// generated values from `Config::default()` into it.
    pub fn generate() -> Result<String> {
        use toml_edit::DocumentMut;

        let config = Config::default();
        let generated_toml =
            toml::to_string(&config).context("Failed to serialize default config to TOML")?;

        let mut doc: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;

        let generated_doc: DocumentMut = generated_toml
            .parse()
            .context("Failed to parse generated config")?;

        merge_items(doc.as_table_mut(), generated_doc.as_table());

        Ok(doc.to_string())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to move {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;
        Ok(())
    }
}
