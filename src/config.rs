//! Configuration file parser for ~/.config/newsdesk/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos. The `NEWSDESK_API_URL` environment variable
//! overrides `api_url`.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::util::{validate_api_url, UrlValidationError};

/// Environment variable that overrides `api_url`.
pub const API_URL_ENV: &str = "NEWSDESK_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid api_url: {0}")]
    ApiUrl(#[from] UrlValidationError),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the news backend; `/news` is appended.
    pub api_url: String,

    /// SQLite file for the cache and bookmarks. Defaults to
    /// `newsdesk.db` next to the config file.
    pub database_path: Option<PathBuf>,

    /// Transport-level timeout for backend requests. 0 disables it.
    pub request_timeout_secs: u64,

    /// Quiet period before a typed search query is applied.
    pub search_debounce_ms: u64,

    /// User-Agent header sent to the backend.
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            database_path: None,
            request_timeout_secs: 30,
            search_debounce_ms: 300,
            user_agent: concat!("newsdesk/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 5] = [
        "api_url",
        "database_path",
        "request_timeout_secs",
        "search_debounce_ms",
        "user_agent",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content)
    }

    /// Parse TOML text; blank input yields defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(api_url = %config.api_url, "Loaded configuration");
        Ok(config)
    }

    /// Apply the environment override for `api_url` and validate it.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_api_url_override(std::env::var(API_URL_ENV).ok())
    }

    fn with_api_url_override(mut self, api_url: Option<String>) -> Result<Self, ConfigError> {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            tracing::debug!(env = API_URL_ENV, "api_url overridden from environment");
            self.api_url = url;
        }
        validate_api_url(&self.api_url)?;
        Ok(self)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert!(config.database_path.is_none());
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.search_debounce(), Duration::from_millis(300));
        assert!(config.user_agent.starts_with("newsdesk/"));
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/newsdesk_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_whitespace_only_returns_default() {
        let config = Config::parse("   \n  \n").unwrap();
        assert_eq!(config.search_debounce_ms, 300);
    }

    #[test]
    fn test_full_config_file() {
        let dir = std::env::temp_dir().join("newsdesk_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
api_url = "https://news.example.com"
database_path = "/var/lib/newsdesk/cache.db"
request_timeout_secs = 0
search_debounce_ms = 150
user_agent = "custom/1.0"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_url, "https://news.example.com");
        assert_eq!(
            config.database_path.as_deref(),
            Some(Path::new("/var/lib/newsdesk/cache.db"))
        );
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.search_debounce(), Duration::from_millis(150));
        assert_eq!(config.user_agent, "custom/1.0");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let config = Config::parse("search_debounce_ms = 500\n").unwrap();
        assert_eq!(config.search_debounce_ms, 500);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let err = Config::parse("this is not [valid toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let config = Config::parse("theme = \"dark\"\napi_url = \"http://a.b\"\n").unwrap();
        assert_eq!(config.api_url, "http://a.b");
    }

    #[test]
    fn test_wrong_type_returns_error() {
        assert!(Config::parse("search_debounce_ms = \"fast\"\n").is_err());
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("newsdesk_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "a".repeat(1_048_577)).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_api_url_override() {
        let config = Config::default()
            .with_api_url_override(Some("https://override.example".into()))
            .unwrap();
        assert_eq!(config.api_url, "https://override.example");

        let config = Config::default()
            .with_api_url_override(Some("   ".into()))
            .unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_invalid_api_url_rejected() {
        let err = Config::default()
            .with_api_url_override(Some("ftp://news.example".into()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ApiUrl(_)));
    }
}
