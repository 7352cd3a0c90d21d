//! Client configuration types and on-disk locations.
//!
//! The TUI reads `harvest.toml` from the platform config directory; every
//! section is optional and falls back to defaults. The persisted session file
//! lives in the platform data directory unless `session.store_path` says
//! otherwise.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "harvest.toml";

/// File holding the persisted session entries.
pub const SESSION_FILE_NAME: &str = "session.json";

/// Log file written by the TUI (the terminal itself is busy).
pub const LOG_FILE_NAME: &str = "harvest-tui.log";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine a home directory for config/data files")]
    NoHomeDir,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level client configuration (persisted as `harvest.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_server_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ServerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SessionSettings {
    /// Override for the persisted session file. Empty means the default
    /// location in the data directory.
    #[serde(default)]
    pub store_path: String,
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_server_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}

impl ClientConfig {
    /// Repair values that would make the client unusable.
    /// Returns true when any field was updated.
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;

        let trimmed = self.server.url.trim().trim_end_matches('/').to_string();
        if trimmed.is_empty() {
            self.server.url = default_server_url();
            changed = true;
        } else if trimmed != self.server.url {
            self.server.url = trimmed;
            changed = true;
        }

        if self.server.timeout_secs == 0 {
            self.server.timeout_secs = default_timeout_secs();
            changed = true;
        }

        let store_path = self.session.store_path.trim();
        if store_path.len() != self.session.store_path.len() {
            self.session.store_path = store_path.to_string();
            changed = true;
        }

        changed
    }

    /// Where the session entries are persisted.
    pub fn session_store_path(&self) -> Result<PathBuf, ConfigError> {
        if self.session.store_path.is_empty() {
            Ok(data_dir()?.join(SESSION_FILE_NAME))
        } else {
            Ok(PathBuf::from(&self.session.store_path))
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────────

fn project_dirs() -> Result<directories::ProjectDirs, ConfigError> {
    directories::ProjectDirs::from("org", "luli-parish", "harvest").ok_or(ConfigError::NoHomeDir)
}

pub fn config_dir() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

pub fn data_dir() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

pub fn log_file_path() -> Result<PathBuf, ConfigError> {
    Ok(data_dir()?.join(LOG_FILE_NAME))
}

// ── File I/O ────────────────────────────────────────────────────────────

/// Load config from `path`. A missing file yields the defaults.
pub fn load_from(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ClientConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let mut config: ClientConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.normalize();
    Ok(config)
}

/// Render config the way it is written to disk.
pub fn to_toml(config: &ClientConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

/// Write config to `path`, creating parent directories as needed.
pub fn save_to(config: &ClientConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let content = to_toml(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg: ClientConfig = toml::from_str("").expect("parse toml");
        assert_eq!(cfg, ClientConfig::default());
        assert_eq!(cfg.server.url, "http://localhost:8000");
        assert_eq!(cfg.server.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg: ClientConfig = toml::from_str(
            r#"
[server]
url = "https://harvest.example.org"
"#,
        )
        .expect("parse toml");

        assert_eq!(cfg.server.url, "https://harvest.example.org");
        assert_eq!(cfg.server.timeout_secs, 15);
        assert!(cfg.session.store_path.is_empty());
    }

    #[test]
    fn normalize_repairs_unusable_values() {
        let mut cfg = ClientConfig::default();
        cfg.server.url = "https://harvest.example.org///".to_string();
        cfg.server.timeout_secs = 0;

        assert!(cfg.normalize());
        assert_eq!(cfg.server.url, "https://harvest.example.org");
        assert_eq!(cfg.server.timeout_secs, 15);
        assert!(!cfg.normalize());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let mut cfg = ClientConfig::default();
        cfg.server.url = "https://harvest.example.org".to_string();
        cfg.session.store_path = "/tmp/harvest-session.json".to_string();

        save_to(&cfg, &path).unwrap();
        let loaded = load_from(&path).unwrap();

        assert_eq!(loaded, cfg);
        assert_eq!(
            loaded.session_store_path().unwrap(),
            PathBuf::from("/tmp/harvest-session.json")
        );
    }

    #[test]
    fn invalid_toml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[server\nurl = 1").unwrap();

        let err = load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }
}
