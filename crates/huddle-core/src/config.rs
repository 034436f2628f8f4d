use crate::error::HuddleError;
use crate::manager::ManagerOptions;
use huddle_client::{
    ChatBackend, HttpBackend, HttpBackendConfig, LocalBackend, LocalBackendConfig,
    DEFAULT_BASE_URL,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable overriding the HTTP backend base URL.
pub const BASE_URL_ENV: &str = "HUDDLE_API_BASE_URL";

/// Which chat backend to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process backend with canned replies
    #[default]
    Local,
    /// Remote chat API over HTTP
    Http,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => write!(f, "local"),
            BackendKind::Http => write!(f, "http"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = HuddleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "http" => Ok(BackendKind::Http),
            other => Err(HuddleError::Config(format!("unknown backend '{other}'"))),
        }
    }
}

/// Serialized settings from ~/.huddle/config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendKind,
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub agent_cache_ttl_secs: u64,
    pub local_reply_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            agent_cache_ttl_secs: 300,
            local_reply_delay_ms: 0,
        }
    }
}

impl Config {
    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`, which stands in for the environment.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(BASE_URL_ENV).filter(|url| !url.trim().is_empty()) {
            tracing::debug!(base_url = %url, "base URL from environment");
            self.base_url = url;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn agent_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.agent_cache_ttl_secs)
    }

    pub fn local_reply_delay(&self) -> Duration {
        Duration::from_millis(self.local_reply_delay_ms)
    }

    pub fn http_config(&self) -> HttpBackendConfig {
        HttpBackendConfig {
            base_url: self.base_url.clone(),
            timeout: self.request_timeout(),
        }
    }

    pub fn local_config(&self) -> LocalBackendConfig {
        LocalBackendConfig {
            reply_delay: self.local_reply_delay(),
        }
    }

    pub fn manager_options(&self) -> ManagerOptions {
        ManagerOptions {
            agent_ttl: self.agent_cache_ttl(),
        }
    }

    /// Construct the configured backend.
    pub fn build_backend(&self) -> Result<Arc<dyn ChatBackend>, HuddleError> {
        let backend: Arc<dyn ChatBackend> = match self.backend {
            BackendKind::Local => Arc::new(LocalBackend::new(self.local_config())),
            BackendKind::Http => Arc::new(HttpBackend::new(self.http_config())?),
        };
        Ok(backend)
    }
}

/// Helper struct for storing the location to read/write global settings
pub struct ConfigStore {
    path: PathBuf,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".huddle");
        path.push("config.json");
        Self { path }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the user's saved config, or fallback to Default
    pub fn load(&self) -> Config {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return Config::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    /// Save the user's config back to disk
    pub fn save(&self, config: &Config) -> Result<(), HuddleError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.backend, BackendKind::Local);
        assert_eq!(config.base_url, "http://localhost:5000/api");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.agent_cache_ttl(), Duration::from_secs(300));
        assert!(config.local_reply_delay().is_zero());
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let parsed: Config = serde_json::from_str(r#"{"backend":"http"}"#).unwrap();
        assert_eq!(parsed.backend, BackendKind::Http);
        assert_eq!(parsed.request_timeout_secs, 30);
        assert_eq!(parsed.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("HTTP".parse::<BackendKind>().unwrap(), BackendKind::Http);
        assert_eq!("local".parse::<BackendKind>().unwrap(), BackendKind::Local);
        assert!(matches!(
            "grpc".parse::<BackendKind>(),
            Err(HuddleError::Config(_))
        ));
        assert_eq!(BackendKind::Http.to_string(), "http");
    }

    #[test]
    fn test_env_overrides_base_url() {
        let mut config = Config::default();
        config.apply_env_from(|key| {
            (key == BASE_URL_ENV).then(|| "https://chat.example.com/api".to_string())
        });
        assert_eq!(config.base_url, "https://chat.example.com/api");

        config.apply_env_from(|_| Some("  ".to_string()));
        assert_eq!(config.base_url, "https://chat.example.com/api");
    }

    #[test]
    fn test_build_backend() {
        let mut config = Config::default();
        assert_eq!(config.build_backend().unwrap().name(), "local");

        config.backend = BackendKind::Http;
        assert_eq!(config.build_backend().unwrap().name(), "http");

        config.base_url = "ftp://nope".to_string();
        assert!(matches!(
            config.build_backend(),
            Err(HuddleError::Client(huddle_client::ClientError::InvalidUrl(_)))
        ));
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::with_path(dir.path().join("nested").join("config.json"));
        assert_eq!(store.load(), Config::default());

        let config = Config {
            backend: BackendKind::Http,
            base_url: "http://10.0.0.2:5000/api".to_string(),
            request_timeout_secs: 5,
            agent_cache_ttl_secs: 60,
            local_reply_delay_ms: 250,
        };
        store.save(&config).unwrap();
        assert_eq!(store.load(), config);
    }

    #[test]
    fn test_store_save_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let store = ConfigStore::with_path(blocker.join("config.json"));
        let err = store.save(&Config::default()).unwrap_err();
        assert!(matches!(err, HuddleError::Io(_)));
    }

    #[test]
    fn test_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(ConfigStore::with_path(&path).load(), Config::default());
    }
}
