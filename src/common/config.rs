//! Configuration for minifs components

use crate::common::Result;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the TOML config file
pub const CONFIG_ENV: &str = "MINIFS_CONFIG";

/// Config file used when `MINIFS_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "minifs.toml";

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Node ID (storage nodes only, exactly 4 characters)
    #[serde(default = "default_node_id")]
    pub node_id: String,

    /// Coordinator-specific config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinator: Option<CoordinatorConfig>,

    /// Volume-specific config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<VolumeConfig>,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_node_id() -> String {
    "0000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Bind address for HTTP API
    #[serde(default = "default_coord_bind")]
    pub bind_addr: SocketAddr,

    /// Per-attempt timeout for a single shard transfer
    #[serde(default = "default_node_timeout")]
    pub node_timeout_ms: u64,

    /// Largest file body accepted on PUT
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_coord_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8888))
}
fn default_node_timeout() -> u64 {
    5_000
}
fn default_max_file_size() -> u64 {
    1024 * 1024 * 1024
}

impl CoordinatorConfig {
    pub fn node_timeout(&self) -> Duration {
        Duration::from_millis(self.node_timeout_ms)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_coord_bind(),
            node_timeout_ms: default_node_timeout(),
            max_file_size: default_max_file_size(),
        }
    }
}

/// Volume (storage node) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeConfig {
    /// Bind address for HTTP API
    #[serde(default = "default_volume_bind")]
    pub bind_addr: SocketAddr,

    /// Directory where shards are stored
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Coordinator base URL; empty disables registration
    #[serde(default = "default_coordinator_url")]
    pub coordinator_url: String,

    /// Largest shard body accepted on PUT
    #[serde(default = "default_max_file_size")]
    pub max_shard_size: u64,
}

fn default_volume_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8100))
}
fn default_data_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
fn default_coordinator_url() -> String {
    "http://127.0.0.1:8888".to_string()
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_volume_bind(),
            data_path: default_data_path(),
            coordinator_url: default_coordinator_url(),
            max_shard_size: default_max_file_size(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            coordinator: None,
            volume: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load from the optional TOML file named by `MINIFS_CONFIG`, then apply
    /// `MINIFS_*` environment overrides (`MINIFS_VOLUME__BIND_ADDR=...`).
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("MINIFS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        let cfg: Config = settings.try_deserialize()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let coord = CoordinatorConfig::default();
        assert_eq!(coord.bind_addr.port(), 8888);
        assert_eq!(coord.node_timeout(), Duration::from_secs(5));

        let vol = VolumeConfig::default();
        assert_eq!(vol.bind_addr.port(), 8100);
        assert_eq!(vol.coordinator_url, "http://127.0.0.1:8888");
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "node_id = 'ab12'\n\n[volume]\nbind_addr = '127.0.0.1:9100'\ncoordinator_url = ''\n"
        )
        .unwrap();

        let cfg = Config::load_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.node_id, "ab12");
        let vol = cfg.volume.unwrap();
        assert_eq!(vol.bind_addr.port(), 9100);
        assert!(vol.coordinator_url.is_empty());
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let cfg = Config::load_from("/nonexistent/minifs-config").unwrap();
        assert!(cfg.coordinator.is_none());
        assert!(cfg.volume.is_none());
    }
}
