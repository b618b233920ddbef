//! Application configuration management.
//!
//! Configuration is stored at `~/.config/parishcache/config.json` and can
//! be overridden per-setting through the environment (`PARISHCACHE_API_URL`,
//! `PARISHCACHE_API_TOKEN`, `PARISHCACHE_CACHE_DIR`); a `.env` file is
//! honored when present.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "parishcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from disk, then apply environment overrides.
    pub fn load() -> Result<Self> {
        // Load .env file if present (silently ignore if not found)
        let _ = dotenvy::dotenv();

        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("PARISHCACHE_API_URL") {
            self.api_base_url = Some(url);
        }
        if let Ok(token) = std::env::var("PARISHCACHE_API_TOKEN") {
            self.api_token = Some(token);
        }
        if let Ok(dir) = std::env::var("PARISHCACHE_CACHE_DIR") {
            self.cache_dir = Some(PathBuf::from(dir));
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the record store and the legacy key-value cache.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_cache_dir_wins() {
        let config = Config {
            cache_dir: Some(PathBuf::from("/tmp/parish-test-cache")),
            ..Default::default()
        };
        assert_eq!(
            config.cache_dir().expect("cache dir"),
            PathBuf::from("/tmp/parish-test-cache")
        );
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = Config {
            api_base_url: Some("https://api.example.com".to_string()),
            api_token: Some("secret".to_string()),
            cache_dir: None,
        };
        let json = serde_json::to_string(&config).expect("serialize");
        let back: Config = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.api_base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(back.api_token.as_deref(), Some("secret"));
        assert!(back.cache_dir.is_none());
    }
}
