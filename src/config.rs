use std::path::PathBuf;
use std::time::Duration;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_TTL;
use crate::chapterize::DEFAULT_CHUNK_SIZE;

pub const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub chunk_size: Option<usize>,
    pub cache_ttl_secs: Option<u64>,
    pub audit_dir: Option<PathBuf>,
}

impl Config {
    /// Load config from ~/.config/ytchap/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE)
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl_secs.map(Duration::from_secs).unwrap_or(DEFAULT_TTL)
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytchap")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
model = "claude-sonnet-4-6"
api_base = "http://localhost:8080/v1"
chunk_size = 8000
cache_ttl_secs = 3600
audit_dir = "/tmp/completions"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model(), "claude-sonnet-4-6");
        assert_eq!(config.api_base.as_deref(), Some("http://localhost:8080/v1"));
        assert_eq!(config.chunk_size(), 8000);
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.audit_dir, Some(PathBuf::from("/tmp/completions")));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.chunk_size(), 10_000);
        assert_eq!(config.cache_ttl(), Duration::from_secs(604_800));
        assert!(config.audit_dir.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str(r#"model = "gpt-4o-mini""#).unwrap();
        assert_eq!(config.model(), "gpt-4o-mini");
        assert!(config.api_base.is_none());
    }
}
