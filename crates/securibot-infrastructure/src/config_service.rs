//! Configuration service implementation.
//!
//! Loads [`ClientConfig`] from config.toml (~/.config/securibot/config.toml) and
//! applies environment overrides on top.

use crate::paths::SecuribotPaths;
use securibot_core::config::ClientConfig;
use securibot_core::{Result, SecuribotError};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

pub const ENV_API_URL: &str = "SECURIBOT_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "SECURIBOT_TIMEOUT_SECS";

/// Configuration service that loads and caches the client configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<ClientConfig>>>,
}

impl ConfigService {
    /// Creates a ConfigService reading the default config.toml.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(SecuribotPaths::config_file()?))
    }

    /// Creates a ConfigService reading a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<ClientConfig> {
        if let Some(cached) = self
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(cached.clone());
        }

        let mut loaded = self.load_file()?;
        apply_overrides(&mut loaded, |key| std::env::var(key).ok())?;

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Missing or empty file yields the defaults.
    fn load_file(&self) -> Result<ClientConfig> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "Config file not found, using defaults");
            return Ok(ClientConfig::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ClientConfig::default());
        }

        Ok(toml::from_str(&content)?)
    }
}

/// Applies environment overrides using `lookup` to read variables.
pub fn apply_overrides<F>(config: &mut ClientConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
        config.api_base_url = url.trim_end_matches('/').to_string();
    }

    if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
        config.request_timeout_secs = raw.trim().parse().map_err(|_| {
            SecuribotError::config(format!("{ENV_TIMEOUT_SECS} must be a number of seconds, got '{raw}'"))
        })?;
    }

    if config.request_timeout_secs == 0 {
        return Err(SecuribotError::config("request_timeout_secs must be greater than zero"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(temp_dir.path().join("config.toml"));
        assert_eq!(service.load_file().unwrap(), ClientConfig::default());
    }

    #[test]
    fn test_loads_values_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api_base_url = \"https://securibot.example/api\"\nrequest_timeout_secs = 15\n",
        )
        .unwrap();

        let config = ConfigService::with_path(path).load_file().unwrap();
        assert_eq!(config.api_base_url, "https://securibot.example/api");
        assert_eq!(config.request_timeout_secs, 15);
    }

    #[test]
    fn test_invalid_toml_is_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "api_base_url = [").unwrap();

        let err = ConfigService::with_path(path).load_file().unwrap_err();
        assert!(matches!(err, SecuribotError::Serialization { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "http://localhost:9000/api/"),
            (ENV_TIMEOUT_SECS, "5"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        apply_overrides(&mut config, |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.api_base_url, "http://localhost:9000/api");
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn test_bad_timeout_override_is_config_error() {
        let mut config = ClientConfig::default();
        let err = apply_overrides(&mut config, |k| {
            (k == ENV_TIMEOUT_SECS).then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, SecuribotError::Config(_)));
    }
}
