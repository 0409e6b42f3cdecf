use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::scoring::{HeuristicTable, MAX_JITTER};

pub const DEFAULT_CLAUDE_MODEL: &str = "claude-3-5-haiku-20241022";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub claude_api_key: Option<String>,
    pub nyt_api_key: Option<String>,

    #[serde(default = "default_claude_model")]
    pub claude_model: String,

    /// How many recent reads feed the dashboard widgets.
    #[serde(default = "default_dashboard_history_limit")]
    pub dashboard_history_limit: usize,

    #[serde(default = "default_map_limit")]
    pub map_limit: usize,

    #[serde(default)]
    pub heuristics: HeuristicTable,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("democracy-lens");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("lens.db").to_string_lossy().to_string()
}

fn default_claude_model() -> String {
    DEFAULT_CLAUDE_MODEL.to_string()
}

fn default_dashboard_history_limit() -> usize {
    100
}

fn default_map_limit() -> usize {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            claude_api_key: None,
            nyt_api_key: None,
            claude_model: default_claude_model(),
            dashboard_history_limit: default_dashboard_history_limit(),
            map_limit: default_map_limit(),
            heuristics: HeuristicTable::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        let jitter = config.heuristics.jitter;
        if !jitter.is_finite() || jitter < 0.0 {
            return Err(AppError::Config(
                "heuristics.jitter must be a finite, non-negative number".to_string(),
            ));
        }
        if jitter > MAX_JITTER {
            return Err(AppError::Config(format!(
                "heuristics.jitter must not exceed {}",
                MAX_JITTER
            )));
        }
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("democracy-lens")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = Config::from_toml(r#"db_path = "/tmp/lens.db""#).unwrap();

        assert_eq!(config.db_path, "/tmp/lens.db");
        assert_eq!(config.claude_model, DEFAULT_CLAUDE_MODEL);
        assert_eq!(config.dashboard_history_limit, 100);
        assert_eq!(config.map_limit, 50);
        assert!(config.claude_api_key.is_none());
        assert_eq!(config.heuristics.source_bias.get("Fox News"), Some(&7.2));
    }

    #[test]
    fn heuristics_section_overrides_table() {
        let config = Config::from_toml(
            r#"
db_path = "lens.db"

[heuristics]
jitter = 0.0
left_keywords = ["welfare"]
right_keywords = []

[heuristics.source_bias]
"The Guardian" = -4.0
"#,
        )
        .unwrap();

        assert_eq!(config.heuristics.jitter, 0.0);
        assert_eq!(config.heuristics.left_keywords, vec!["welfare".to_string()]);
        assert!(config.heuristics.right_keywords.is_empty());
        assert_eq!(config.heuristics.source_bias.len(), 1);
    }

    #[rstest]
    #[case("-1.0")]
    #[case("inf")]
    #[case("nan")]
    #[case("1e308")]
    #[case("20.5")]
    fn out_of_range_jitter_is_rejected(#[case] jitter: &str) {
        let toml = format!("[heuristics]\njitter = {}\n", jitter);
        let err = Config::from_toml(&toml).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn jitter_may_span_whole_range() {
        let config = Config::from_toml("[heuristics]\njitter = 20.0\n").unwrap();
        assert_eq!(config.heuristics.jitter, 20.0);
    }

    #[test]
    fn round_trips_through_pretty_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed.heuristics.source_bias.len(), config.heuristics.source_bias.len());
    }
}
