use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(serde_saphyr::from_str(&contents)?)
    }
}

/// Resolve a path relative to the config file directory.
///
/// If the path is absolute, it is returned as-is.
/// If the path is relative, it is joined with the config file's parent
/// directory, so behavior does not depend on the working directory.
pub fn resolve_path(config_path: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    config_dir.join(path)
}

// ============================================================================
// Default Paths
// ============================================================================

/// Default data directory (relative to the config file).
pub const DEFAULT_DATA_DIR: &str = ".focusd/data";

// ============================================================================
// Private Helpers (Serde Defaults)
// ============================================================================

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_connections() -> usize {
    256
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            max_connections: default_max_connections(),
        }
    }
}

// ============================================================================
// StoreConfig
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StoreConfig {
    /// Data directory for the document store. Defaults to
    /// `DEFAULT_DATA_DIR` next to the config file.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// ============================================================================
// AuthConfig
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AuthConfig {
    /// Shared secret for verifying identity tokens minted by the login
    /// service. When unset, an insecure development secret is used and a
    /// warning is logged at startup.
    #[serde(default)]
    pub token_secret: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_seconds, 30);
        assert_eq!(config.server.max_connections, 256);
        assert!(config.store.path.is_none());
        assert!(config.auth.token_secret.is_none());
    }

    #[tokio::test]
    async fn test_load_missing_file_returns_defaults() {
        let tmp_dir = TempDir::new().unwrap();
        let missing_path = tmp_dir.path().join("missing-config.yaml");
        let config = Config::load(missing_path.to_str().unwrap()).await.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
    }

    #[tokio::test]
    async fn test_load_valid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
server:
  host: "127.0.0.1"
  port: 3000
  request_timeout_seconds: 60
store:
  path: "/var/lib/focusd"
auth:
  token_secret: "sekrit"
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout_seconds, 60);
        assert_eq!(config.store.path, Some(PathBuf::from("/var/lib/focusd")));
        assert_eq!(config.auth.token_secret.as_deref(), Some("sekrit"));
    }

    #[tokio::test]
    async fn test_load_partial_yaml_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
server:
  port: 9000
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(config.server.host, "0.0.0.0"); // default
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.request_timeout_seconds, 30); // default
        assert!(config.store.path.is_none()); // default
    }

    #[tokio::test]
    async fn test_load_invalid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(file.path().to_str().unwrap()).await;
        assert!(result.is_err());
    }

    // ========================================================================
    // resolve_path Tests
    // ========================================================================

    #[test]
    fn test_resolve_path_absolute() {
        let config_path = Path::new("/etc/focusd/focusd.yaml");
        let absolute_path = Path::new("/var/lib/focusd");
        let result = resolve_path(config_path, absolute_path);
        assert_eq!(result, PathBuf::from("/var/lib/focusd"));
    }

    #[test]
    fn test_resolve_path_relative() {
        let config_path = Path::new("/etc/focusd/focusd.yaml");
        let relative_path = Path::new(".focusd/data");
        let result = resolve_path(config_path, relative_path);
        assert_eq!(result, PathBuf::from("/etc/focusd/.focusd/data"));
    }

    #[test]
    fn test_resolve_path_config_in_current_dir() {
        let config_path = Path::new("focusd.yaml");
        let relative_path = Path::new(".focusd/data");
        let result = resolve_path(config_path, relative_path);
        assert_eq!(result, PathBuf::from(".focusd/data"));
    }
}
