//! Node configuration.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// API configuration.
    pub api: ApiConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Notary directory watching.
    pub notary: NotaryConfig,
    /// Map rebuild and update scheduling.
    pub map: MapConfig,
    /// Admin credentials.
    pub admin: AdminConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Web port.
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// State directory.
    pub db_dir: PathBuf,
    /// Storage backend: `embed` (RocksDB) or `memory`.
    pub backend: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_dir: PathBuf::from(".db"),
            backend: "embed".to_string(),
        }
    }
}

/// Notary certificate directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotaryConfig {
    /// Watched directory of notary entry files.
    pub watch_dir: PathBuf,
    /// Poll cadence in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for NotaryConfig {
    fn default() -> Self {
        Self {
            watch_dir: PathBuf::from("notary-certificates"),
            poll_interval_ms: 2_000,
        }
    }
}

/// Map scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// HTTP cache max-age for the served map, in seconds.
    pub cache_timeout_secs: u64,
    /// Default activation delay for parameter updates, in seconds.
    pub param_update_delay_secs: u64,
    /// Rebuild debounce, in milliseconds; zero rebuilds inline.
    pub rebuild_delay_ms: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            cache_timeout_secs: 2,
            param_update_delay_secs: 10,
            rebuild_delay_ms: 1_000,
        }
    }
}

/// Admin credentials; both fields must be set to enable the admin surface
/// guard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log format (json, pretty).
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl NodeConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves configuration to a TOML file.
    pub fn to_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Merges `NETMAP_*` environment variables over the loaded values.
    pub fn merge_env(&mut self) -> Result<()> {
        if let Ok(port) = std::env::var("NETMAP_PORT") {
            self.api.port = port.parse()?;
        }
        if let Ok(dir) = std::env::var("NETMAP_DB_DIR") {
            self.storage.db_dir = PathBuf::from(dir);
        }
        if let Ok(backend) = std::env::var("NETMAP_STORAGE_BACKEND") {
            self.storage.backend = backend;
        }
        if let Ok(dir) = std::env::var("NETMAP_NOTARY_DIR") {
            self.notary.watch_dir = PathBuf::from(dir);
        }
        if let Ok(ms) = std::env::var("NETMAP_NOTARY_POLL_INTERVAL_MS") {
            self.notary.poll_interval_ms = ms.parse()?;
        }
        if let Ok(secs) = std::env::var("NETMAP_CACHE_TIMEOUT_SECS") {
            self.map.cache_timeout_secs = secs.parse()?;
        }
        if let Ok(secs) = std::env::var("NETMAP_PARAM_UPDATE_DELAY_SECS") {
            self.map.param_update_delay_secs = secs.parse()?;
        }
        if let Ok(ms) = std::env::var("NETMAP_REBUILD_DELAY_MS") {
            self.map.rebuild_delay_ms = ms.parse()?;
        }
        if let Ok(username) = std::env::var("NETMAP_ADMIN_USERNAME") {
            self.admin.username = Some(username);
        }
        if let Ok(password) = std::env::var("NETMAP_ADMIN_PASSWORD") {
            self.admin.password = Some(password);
        }
        if let Ok(level) = std::env::var("NETMAP_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("NETMAP_LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }

    /// Rejects configurations the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        match self.storage.backend.as_str() {
            "embed" | "memory" => {}
            other => bail!("unknown storage backend {other:?} (expected \"embed\" or \"memory\")"),
        }
        match self.logging.format.as_str() {
            "json" | "pretty" => {}
            other => bail!("unknown log format {other:?} (expected \"json\" or \"pretty\")"),
        }
        if self.admin.username.is_some() != self.admin.password.is_some() {
            bail!("admin.username and admin.password must be set together");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn config_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("netmap.toml");

        let config = NodeConfig::default();
        config.to_file(&path).unwrap();

        let loaded = NodeConfig::from_file(&path).unwrap();
        assert_eq!(config.api.port, loaded.api.port);
        assert_eq!(config.map.rebuild_delay_ms, loaded.map.rebuild_delay_ms);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("netmap.toml");
        std::fs::write(&path, "[api]\nport = 9000\n").unwrap();

        let config = NodeConfig::from_file(&path).unwrap();
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.storage.backend, "embed");
        assert_eq!(config.map.param_update_delay_secs, 10);
    }

    #[test]
    fn validate_rejects_lone_admin_username() {
        let mut config = NodeConfig::default();
        config.admin.username = Some("sa".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_backend() {
        let mut config = NodeConfig::default();
        config.storage.backend = "postgres".to_string();
        assert!(config.validate().is_err());
    }
}
