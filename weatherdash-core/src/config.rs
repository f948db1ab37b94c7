use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{provider::visualcrossing::DEFAULT_BASE_URL, session::CachePolicy, units::TemperatureUnit};

/// Environment variable that takes precedence over the stored API key.
pub const API_KEY_ENV: &str = "WEATHERDASH_API_KEY";

/// Cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Entries older than this are refetched. Absent means they never expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_secs: Option<u64>,

    /// Overrides the platform cache directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_unit = "fahrenheit"
/// default_location = "Philippines"
///
/// [cache]
/// max_age_secs = 3600
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider endpoint; defaults to the Visual Crossing timeline API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default)]
    pub default_unit: TemperatureUnit,

    /// Loaded when the interactive dashboard starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_location: Option<String>,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    ///
    /// `WEATHERDASH_API_KEY` overrides the stored key.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };

        cfg.apply_env(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
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

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weatherdash", "weatherdash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding the location cache.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        match &self.cache.dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.cache_dir().to_path_buf()),
        }
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `weatherdash configure` or set {API_KEY_ENV}."
            )
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy { max_age: self.cache.max_age_secs.map(Duration::from_secs) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.api_key().unwrap_err();

        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn env_overrides_stored_key() {
        let mut cfg = Config::default();
        cfg.set_api_key("STORED".into());

        cfg.apply_env(|name| (name == API_KEY_ENV).then(|| "FROM_ENV".to_string()));

        assert_eq!(cfg.api_key().unwrap(), "FROM_ENV");
    }

    #[test]
    fn blank_env_is_ignored() {
        let mut cfg = Config::default();
        cfg.set_api_key("STORED".into());

        cfg.apply_env(|_| Some("  ".to_string()));

        assert_eq!(cfg.api_key().unwrap(), "STORED");
    }

    #[test]
    fn defaults_to_infinite_cache_and_celsius() {
        let cfg: Config = toml::from_str("api_key = \"K\"").unwrap();

        assert_eq!(cfg.cache_policy(), CachePolicy::default());
        assert_eq!(cfg.default_unit, TemperatureUnit::Celsius);
        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
        assert_eq!(cfg.default_location, None);
    }

    #[test]
    fn parses_full_file() {
        let cfg: Config = toml::from_str(
            r#"
            api_key = "K"
            base_url = "http://localhost:9000/timeline"
            default_unit = "fahrenheit"
            default_location = "Philippines"

            [cache]
            max_age_secs = 3600
            dir = "/tmp/weatherdash"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.default_unit, TemperatureUnit::Fahrenheit);
        assert_eq!(cfg.default_location.as_deref(), Some("Philippines"));
        assert_eq!(cfg.base_url(), "http://localhost:9000/timeline");
        assert_eq!(cfg.cache_policy().max_age, Some(Duration::from_secs(3600)));
        assert_eq!(cfg.cache_dir().unwrap(), PathBuf::from("/tmp/weatherdash"));
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.default_unit = TemperatureUnit::Fahrenheit;
        cfg.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }
}
