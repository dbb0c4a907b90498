//! Fragment store configuration with environment variable and file-based loading.
//!
//! Environment variables:
//! - `FRAGMENTS_BACKEND`: `file` (default) or `memory`
//! - `FRAGMENTS_PATH`: Base path for the file backend
//! - `API_URL`: Public base URL used to build fragment locations
//! - `FRAGMENTS_LOG_LEVEL`: Default log level when `RUST_LOG` is unset
//!
//! Default path: `~/.fragments/store`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::gateway::{FileGateway, MemoryGateway, StorageGateway};

/// Configuration errors that callers may want to match on.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown storage backend: {0} (expected \"file\" or \"memory\")")]
    UnknownBackend(String),
}

/// Which gateway implementation to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    File,
    Memory,
}

impl std::str::FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(Backend::File),
            "memory" => Ok(Backend::Memory),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Configuration for the fragment store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentsConfig {
    /// Storage backend.
    #[serde(default)]
    pub backend: Backend,

    /// Base path for the file backend.
    /// Metadata lives in `{base_path}/metadata/`, payloads in `{base_path}/objects/`.
    #[serde(default = "default_store_path")]
    pub base_path: PathBuf,

    /// Public base URL, used for fragment locations.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Log level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_api_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Get the default store path (~/.fragments/store).
fn default_store_path() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".fragments").join("store"))
        .unwrap_or_else(|| PathBuf::from(".fragments/store"))
}

impl Default for FragmentsConfig {
    fn default() -> Self {
        Self {
            backend: Backend::File,
            base_path: default_store_path(),
            api_url: default_api_url(),
            log_level: default_log_level(),
        }
    }
}

impl FragmentsConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let backend = match env::var("FRAGMENTS_BACKEND") {
            Ok(value) => value.parse().context("invalid FRAGMENTS_BACKEND")?,
            Err(_) => Backend::File,
        };

        let base_path = env::var("FRAGMENTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_store_path());

        let api_url = env::var("API_URL").unwrap_or_else(|_| default_api_url());

        let log_level = env::var("FRAGMENTS_LOG_LEVEL").unwrap_or_else(|_| default_log_level());

        Ok(Self {
            backend,
            base_path,
            api_url,
            log_level,
        })
    }

    /// Load configuration from a TOML file, falling back to environment.
    ///
    /// The file should contain a `[fragments]` section:
    /// ```toml
    /// [fragments]
    /// backend = "file"
    /// base_path = "/srv/fragments"
    /// api_url = "https://fragments.example.com"
    /// ```
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let table: toml::Table = contents
            .parse()
            .with_context(|| format!("failed to parse TOML: {}", path.display()))?;

        if let Some(section) = table.get("fragments") {
            let config: FragmentsConfig = section
                .clone()
                .try_into()
                .context("failed to parse [fragments] section")?;
            Ok(config)
        } else {
            Self::from_env()
        }
    }

    /// Create a file-backed config with a specific base path.
    pub fn with_base_path(path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: path.into(),
            ..Self::default()
        }
    }

    /// Create an in-memory config.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory,
            ..Self::default()
        }
    }

    /// Open the configured gateway.
    pub fn open_gateway(&self) -> Arc<dyn StorageGateway> {
        match self.backend {
            Backend::File => Arc::new(FileGateway::at_path(&self.base_path)),
            Backend::Memory => Arc::new(MemoryGateway::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = FragmentsConfig::default();
        assert!(config.base_path.to_string_lossy().contains(".fragments"));
        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_with_base_path() {
        let config = FragmentsConfig::with_base_path("/custom/path");
        assert_eq!(config.base_path, PathBuf::from("/custom/path"));
        assert_eq!(config.backend, Backend::File);
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("file".parse::<Backend>().unwrap(), Backend::File);
        assert_eq!("MEMORY".parse::<Backend>().unwrap(), Backend::Memory);
        assert!(matches!(
            "s3".parse::<Backend>(),
            Err(ConfigError::UnknownBackend(name)) if name == "s3"
        ));
    }

    #[test]
    fn test_from_file_section() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("fragments.toml");
        std::fs::write(
            &path,
            "[fragments]\nbackend = \"memory\"\nbase_path = \"/srv/fragments\"\n",
        )?;

        let config = FragmentsConfig::from_file(&path)?;
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.base_path, PathBuf::from("/srv/fragments"));
        assert_eq!(config.api_url, "http://localhost:8080");
        Ok(())
    }

    #[test]
    fn test_from_file_rejects_unknown_backend() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("fragments.toml");
        std::fs::write(&path, "[fragments]\nbackend = \"s3\"\n")?;

        assert!(FragmentsConfig::from_file(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_from_file_missing() {
        let result = FragmentsConfig::from_file(Path::new("/nonexistent/fragments.toml"));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_open_gateway() -> Result<()> {
        let temp = TempDir::new()?;
        let gateway = FragmentsConfig::with_base_path(temp.path()).open_gateway();
        gateway.write_data("owner", "id", b"bytes").await?;
        assert!(temp.path().join("objects").exists());

        let memory = FragmentsConfig::in_memory().open_gateway();
        memory.write_data("owner", "id", b"bytes").await?;
        assert_eq!(memory.read_data("owner", "id").await?, b"bytes");
        Ok(())
    }
}
