//! Configuration module for Treesync.
//!
//! Provides typed configuration structs that map to the JSON configuration
//! file, with loading, saving, validation, and defaults. The control plane
//! rewrites this file whenever the operator submits new settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for Treesync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub sync: SyncConfig,
    pub remote: RemoteConfig,
    pub server: ServerConfig,
}

/// Synchronization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Root of the local tree being mirrored to the remote peer.
    pub target_dir: PathBuf,
    /// Ignore rules excluding paths from watching and syncing.
    ///
    /// A rule ending in `/` ignores any base name containing the text; a
    /// rule containing `*` ignores base names starting or ending with the
    /// literal remainder. Anything else never matches (see
    /// [`validate`](Config::validate)).
    pub ignored: Vec<String>,
}

/// Remote peer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Hostname or IP of the peer receiving pushed changes.
    pub host: String,
    /// Port of the peer's `/sync` endpoint.
    pub port: u16,
}

/// Local HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the local receive/control-plane server listens on.
    pub listen: u16,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            target_dir: PathBuf::from("./target"),
            ignored: Vec::new(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8081,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen: 6789 }
    }
}

// ---------------------------------------------------------------------------
// Loading / saving
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&content)?;
        config.normalize();
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Persist the configuration as pretty-printed JSON at `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default path for the configuration file: `config.json` in the
    /// working directory.
    pub fn default_path() -> PathBuf {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("config.json")
    }

    /// Strip trailing separators from `sync.target_dir` so path
    /// relativization behaves consistently.
    pub fn normalize(&mut self) {
        let s = self.sync.target_dir.to_string_lossy();
        let trimmed = s.trim_end_matches(['/', '\\']);
        if !trimmed.is_empty() && trimmed.len() != s.len() {
            self.sync.target_dir = PathBuf::from(trimmed);
        }
    }

    /// Base URL of the remote peer, e.g. `http://127.0.0.1:8081`.
    pub fn remote_base_url(&self) -> String {
        format!("http://{}:{}", self.remote.host, self.remote.port)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"remote.port"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. Degenerate ignore
    /// rules (no trailing `/`, no `*`) are reported here because they can
    /// never match anything.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.sync.target_dir.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "sync.target_dir".into(),
                message: "must not be empty".into(),
            });
        }
        if self.remote.host.is_empty() {
            errors.push(ValidationError {
                field: "remote.host".into(),
                message: "must not be empty".into(),
            });
        }
        if self.remote.port == 0 {
            errors.push(ValidationError {
                field: "remote.port".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.server.listen == 0 {
            errors.push(ValidationError {
                field: "server.listen".into(),
                message: "must be greater than 0".into(),
            });
        }

        for rule in &self.sync.ignored {
            if !rule.is_empty() && !rule.ends_with('/') && !rule.contains('*') {
                errors.push(ValidationError {
                    field: "sync.ignored".into(),
                    message: format!(
                        "rule '{rule}' has no trailing '/' and no '*' and will never match"
                    ),
                });
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sync.target_dir, PathBuf::from("./target"));
        assert_eq!(config.remote.host, "127.0.0.1");
        assert_eq!(config.remote.port, 8081);
        assert_eq!(config.server.listen, 6789);
        assert!(config.sync.ignored.is_empty());
    }

    #[test]
    fn test_validate_default_is_clean() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn test_validate_zero_ports() {
        let mut config = Config::default();
        config.remote.port = 0;
        config.server.listen = 0;
        let errors = config.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.field == "remote.port"));
        assert!(errors.iter().any(|e| e.field == "server.listen"));
    }

    #[test]
    fn test_validate_flags_degenerate_ignore_rule() {
        let mut config = Config::default();
        config.sync.ignored = vec![
            "node_modules/".to_string(),
            "*.tmp".to_string(),
            "plainname".to_string(),
        ];
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("plainname"));
    }

    #[test]
    fn test_normalize_strips_trailing_separator() {
        let mut config = Config::default();
        config.sync.target_dir = PathBuf::from("/data/mirror/");
        config.normalize();
        assert_eq!(config.sync.target_dir, PathBuf::from("/data/mirror"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.remote.host = "10.0.0.2".to_string();
        config.sync.ignored = vec!["*.log".to_string()];
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/config.json"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_remote_base_url() {
        let config = Config::default();
        assert_eq!(config.remote_base_url(), "http://127.0.0.1:8081");
    }
}
