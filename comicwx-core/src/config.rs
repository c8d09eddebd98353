use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{model::Dimensions, weather::ProviderId};

/// Per-provider settings (API key and optional base URL override).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where comics come from and which numbers exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComicConfig {
    pub base_url: String,
    pub first: u32,
    pub last: u32,
    pub default_width: u32,
    pub default_height: u32,
}

impl Default for ComicConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.asofterworld.com".to_string(),
            first: 1,
            last: 1242,
            default_width: 600,
            default_height: 448,
        }
    }
}

impl ComicConfig {
    pub fn default_dimensions(&self) -> Result<Dimensions> {
        Dimensions::new(self.default_width, self.default_height)
            .map_err(|e| anyhow!("Invalid default comic size: {e}"))
    }
}

/// Top-level configuration, loaded once at startup.
///
/// Example TOML:
/// ```toml
/// default_provider = "wttr"
/// request_timeout_secs = 5
///
/// [server]
/// port = 8080
///
/// [providers.openweather]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Optional default weather provider id, e.g. "wttr" or "openweather".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,

    /// Timeout applied to every outbound request.
    pub request_timeout_secs: u64,

    pub server: ServerConfig,
    pub comic: ComicConfig,
    pub providers: HashMap<String, ProviderConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: None,
            request_timeout_secs: 5,
            server: ServerConfig::default(),
            comic: ComicConfig::default(),
            providers: HashMap::new(),
        }
    }
}

impl Config {
    /// wttr.in needs no credentials, so it is used when nothing is configured.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        match self.default_provider.as_deref() {
            Some(s) => s.parse(),
            None => Ok(ProviderId::Wttr),
        }
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Load config from an explicit path, or return defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the given path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "comicwx", "comicwx")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply `COMICWX_*` and `OPENWEATHERMAP_API_KEY` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("COMICWX_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("COMICWX_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("COMICWX_PORT is not a valid port: {port}"))?;
        }
        if let Some(provider) = lookup("COMICWX_WEATHER_PROVIDER") {
            let id: ProviderId = provider.parse()?;
            self.set_default_provider(id);
        }
        if let Some(key) = lookup("OPENWEATHERMAP_API_KEY") {
            self.upsert_provider_api_key(ProviderId::OpenWeather, key);
        }
        Ok(())
    }

    /// Stores `api_key`; the provider also becomes the default if none is set.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers
            .entry(provider_id.as_str().to_string())
            .or_default()
            .api_key = Some(api_key);

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id)
            .and_then(|cfg| cfg.api_key.as_deref())
    }

    /// Returns the configured base URL override for a provider, if any.
    pub fn provider_base_url(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id)
            .and_then(|cfg| cfg.base_url.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::ProviderId;

    #[test]
    fn default_provider_falls_back_to_wttr() {
        let cfg = Config::default();
        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::Wttr);
    }

    #[test]
    fn default_provider_rejects_unknown_name() {
        let cfg = Config {
            default_provider: Some("darksky".into()),
            ..Config::default()
        };
        let err = cfg.default_provider_id().unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn first_stored_key_becomes_default() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());

        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenWeather);
        assert_eq!(cfg.provider_api_key(ProviderId::OpenWeather), Some("OPEN_KEY"));
    }

    #[test]
    fn storing_a_key_keeps_an_explicit_default() {
        let mut cfg = Config::default();
        cfg.set_default_provider(ProviderId::Wttr);
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());

        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::Wttr);
    }

    #[test]
    fn upsert_keeps_base_url_override() {
        let mut cfg = Config::default();
        cfg.providers.insert(
            "openweather".into(),
            ProviderConfig {
                api_key: None,
                base_url: Some("http://localhost:9000".into()),
            },
        );

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "KEY".into());

        assert_eq!(cfg.provider_base_url(ProviderId::OpenWeather), Some("http://localhost:9000"));
        assert_eq!(cfg.provider_api_key(ProviderId::OpenWeather), Some("KEY"));
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let mut cfg: Config = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 3000
            "#,
        )
        .unwrap();

        cfg.apply_env_from(|key| match key {
            "COMICWX_PORT" => Some("9999".into()),
            "OPENWEATHERMAP_API_KEY" => Some("ENV_KEY".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 9999);
        assert_eq!(cfg.provider_api_key(ProviderId::OpenWeather), Some("ENV_KEY"));
    }

    #[test]
    fn env_rejects_bad_port() {
        let mut cfg = Config::default();
        let err = cfg
            .apply_env_from(|key| (key == "COMICWX_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("COMICWX_PORT"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: Config = toml::from_str("[comic]\nlast = 1300\n").unwrap();
        assert_eq!(cfg.comic.last, 1300);
        assert_eq!(cfg.comic.first, 1);
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn save_and_load_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "KEY".into());
        cfg.server.port = 4242;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.server.port, 4242);
        assert_eq!(loaded.provider_api_key(ProviderId::OpenWeather), Some("KEY"));
        assert_eq!(loaded.default_provider_id().unwrap(), ProviderId::OpenWeather);
    }

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.comic.last, 1242);
    }
}
