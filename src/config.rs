use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FlowError, Result};
use crate::income::IncomeThresholds;
use crate::parser::KeyScheme;

pub const CONFIG_PATH_ENV: &str = "SURVEY_FLOW_CONFIG";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub income: IncomeThresholds,
    pub text: TextConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TextConfig {
    /// Key scheme for `text/plain` uploads routed through the dispatcher
    pub upload_scheme: KeyScheme,
    /// Key scheme for direct text parsing
    pub parse_scheme: KeyScheme,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            upload_scheme: KeyScheme::Sequential,
            parse_scheme: KeyScheme::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for daily-rolling JSON logs; console only when unset
    pub dir: Option<PathBuf>,
}

impl EngineConfig {
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            FlowError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.income.validate()?;
        Ok(config)
    }

    /// Load from `SURVEY_FLOW_CONFIG` when set, defaults otherwise.
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim()),
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.text.upload_scheme, KeyScheme::Sequential);
        assert_eq!(config.income.b40_upper, 4850);
    }

    #[test]
    fn test_full_config() {
        let config = EngineConfig::from_toml(
            r#"
            [income]
            b40_upper = 5249
            m40_upper = 11819

            [text]
            parse_scheme = { scheme = "qualified", node_offset = 1 }
            upload_scheme = { scheme = "sequential" }

            [logging]
            dir = "logs"
            "#,
        )
        .unwrap();

        assert_eq!(config.income.m40_upper, 11819);
        assert_eq!(config.text.parse_scheme, KeyScheme::ivr());
        assert_eq!(config.logging.dir, Some(PathBuf::from("logs")));
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let err = EngineConfig::from_toml("[income]\nb40_upper = 9000\nm40_upper = 100\n").unwrap_err();
        assert!(matches!(err, FlowError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, FlowError::Config(_)));
    }
}
