//! YAML configuration.
//!
//! Every field has a default, so running without a config file works out of
//! the box:
//!
//! ```yaml
//! llm:
//!   base_url: https://api.deepseek.com
//!   model: deepseek-chat
//!   temperature: 0.7
//! sources:
//!   proxy: "https://api.allorigins.win/raw?url="
//!   primary:
//!     url: https://www.douyin.com/aweme/v1/web/hot/search/list/
//!     list_path: data.word_list
//!   backup:
//!     url: https://www.iesdouyin.com/web/api/v2/hotsearch/billboard/word/
//!     list_path: word_list
//! refresh_secs: 300
//! analysis_limit: 50
//! ```

use crate::analysis::DEFAULT_ANALYSIS_LIMIT;
use crate::error::{Error, Result};
use crate::sources::SourceEndpoint;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub sources: SourcesConfig,
    /// Interval of the background refresh in `watch`.
    pub refresh_secs: u64,
    /// How many items aggregate analyses look at.
    pub analysis_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// CORS relay prefix; the URL-encoded target is appended. Empty disables it.
    pub proxy: String,
    pub primary: SourceEndpoint,
    pub backup: SourceEndpoint,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            sources: SourcesConfig::default(),
            refresh_secs: 300,
            analysis_limit: DEFAULT_ANALYSIS_LIMIT,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            temperature: 0.7,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            proxy: "https://api.allorigins.win/raw?url=".to_string(),
            primary: SourceEndpoint {
                url: "https://www.douyin.com/aweme/v1/web/hot/search/list/".to_string(),
                list_path: "data.word_list".to_string(),
            },
            backup: SourceEndpoint {
                url: "https://www.iesdouyin.com/web/api/v2/hotsearch/billboard/word/".to_string(),
                list_path: "word_list".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load from `path`, or defaults when no path is given.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when the file cannot be read or parsed, or when a
    /// value is out of range.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .map_err(|e| Error::Config(format!("reading {}: {e}", p.display())))?;
                let parsed = Self::from_yaml(&raw)?;
                info!(path = %p.display(), "Loaded configuration");
                parsed
            }
            None => {
                info!("No config file given; using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.refresh_secs == 0 {
            return Err(Error::Config("refresh_secs must be positive".into()));
        }
        if self.analysis_limit == 0 {
            return Err(Error::Config("analysis_limit must be positive".into()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::Config(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.analysis_limit, 50);
        assert_eq!(config.sources.primary.list_path, "data.word_list");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml("llm:\n  model: gpt-4o-mini\nrefresh_secs: 60\n").unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.base_url, "https://api.deepseek.com");
        assert_eq!(config.refresh_secs, 60);
        assert_eq!(config.sources, SourcesConfig::default());
    }

    #[test]
    fn test_load_from_file_and_validate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "refresh_secs: 0\n").unwrap();
        assert!(matches!(AppConfig::load(Some(&path)), Err(Error::Config(_))));

        std::fs::write(&path, "sources:\n  proxy: \"\"\n").unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert!(config.sources.proxy.is_empty());
    }

    #[test]
    fn test_bad_yaml_is_config_error() {
        assert!(matches!(AppConfig::from_yaml("llm: [1, 2"), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/config.yaml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
