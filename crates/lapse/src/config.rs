//! Lapse configuration file handling

use anyhow::{Context, Result};
use lapse_animation::TickerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level Lapse configuration (lapse.toml)
///
/// ```toml
/// default_ease = "ease_out_cubic"
///
/// [ticker]
/// speed = 1.0
/// max_elapsed_ms = 100.0
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LapseConfig {
    /// Frame clock tuning
    pub ticker: TickerConfig,
    /// Registered ease used when a tween does not name one (linear if unset)
    pub default_ease: Option<String>,
}

impl LapseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticker(mut self, ticker: TickerConfig) -> Self {
        self.ticker = ticker;
        self
    }

    pub fn with_default_ease(mut self, name: impl Into<String>) -> Self {
        self.default_ease = Some(name.into());
        self
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse Lapse config")
    }

    /// Load configuration from a file, or from `lapse.toml` inside a directory
    pub fn load(path: &Path) -> Result<Self> {
        let config_path = if path.is_dir() {
            path.join("lapse.toml")
        } else {
            path.to_path_buf()
        };

        if !config_path.exists() {
            anyhow::bail!("No Lapse config found at {}", config_path.display());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: LapseConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        tracing::debug!(path = %config_path.display(), "Lapse config loaded");
        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = LapseConfig::from_toml_str("").unwrap();
        assert_eq!(config, LapseConfig::default());
        assert_eq!(config.ticker.speed, 1.0);
        assert_eq!(config.default_ease, None);
    }

    #[test]
    fn test_parse_full_config() {
        let config = LapseConfig::from_toml_str(
            r#"
            default_ease = "ease_in_out"

            [ticker]
            speed = 0.5
            max_elapsed_ms = 100.0
            "#,
        )
        .unwrap();

        assert_eq!(
            config,
            LapseConfig::new()
                .with_default_ease("ease_in_out")
                .with_ticker(
                    TickerConfig::default()
                        .with_speed(0.5)
                        .with_max_elapsed_ms(100.0)
                )
        );
    }

    #[test]
    fn test_partial_ticker_section() {
        let config = LapseConfig::from_toml_str("[ticker]\nspeed = 2.0\n").unwrap();
        assert_eq!(config.ticker.speed, 2.0);
        assert_eq!(config.ticker.max_elapsed_ms, None);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let err = LapseConfig::from_toml_str("default_ease = ").unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = LapseConfig::new()
            .with_default_ease("linear")
            .with_ticker(TickerConfig::default().with_speed(3.0));
        let text = config.to_toml().unwrap();
        assert_eq!(LapseConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("lapse-config-that-does-not-exist.toml");
        let err = LapseConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("No Lapse config found"));
    }
}
