//! Engine configuration, loaded from TOML.
//!
//! ```toml
//! [synth]
//! sample_rate = "medium"
//! timbre = "harmonic_reduced_overtone"
//!
//! [sample]
//! movement = "delta_sample_range"
//! degenerate_policy = "neutral"
//!
//! [session]
//! sample_size = 20
//! sample_count = 10
//! ```
//!
//! Every field has a default, so an empty file is a valid configuration.

use crate::domain::{BarWidth, SecurityId};
use crate::sample::SampleOptions;
use crate::session::{SessionError, SessionParams};
use crate::synth::{SynthConfig, SynthError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Synth(#[from] SynthError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Session defaults; security and start time are chosen per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub width: BarWidth,
    pub sample_size: usize,
    pub sample_count: usize,
    pub max_lookback_months: u32,
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: BarWidth::Day1,
            sample_size: 20,
            sample_count: 10,
            max_lookback_months: 12,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSenseConfig {
    pub synth: SynthConfig,
    pub sample: SampleOptions,
    pub session: SessionConfig,
}

impl MarketSenseConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.synth.validate()?;
        self.session_params(SecurityId::new("VALIDATE", "NONE")).validate()?;
        Ok(())
    }

    /// Session parameters for `security` from the configured defaults.
    pub fn session_params(&self, security: SecurityId) -> SessionParams {
        SessionParams::new(
            security,
            self.session.width,
            self.session.sample_size,
            self.session.sample_count,
            self.session.max_lookback_months,
        )
        .with_options(self.sample)
        .with_seed(self.session.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{DegeneratePolicy, MovementFormula, Rgb};
    use crate::synth::{SampleRate, TimbreFormula};

    #[test]
    fn empty_toml_is_default() {
        let config = MarketSenseConfig::from_toml("").unwrap();
        assert_eq!(config, MarketSenseConfig::default());
        assert_eq!(config.synth.duration_secs, 2);
        assert_eq!(config.sample.low_color, Rgb::RED);
    }

    #[test]
    fn sections_override_defaults() {
        let config = MarketSenseConfig::from_toml(
            r#"
            [synth]
            sample_rate = "highest"
            timbre = "sine"
            amplitude = 0.5

            [sample]
            movement = "percent_of_last_price"
            degenerate_policy = "reject"

            [session]
            width = "hour1"
            sample_size = 8
            seed = 99
            "#,
        )
        .unwrap();

        assert_eq!(config.synth.sample_rate, SampleRate::Highest);
        assert_eq!(config.synth.timbre, TimbreFormula::Sine);
        assert_eq!(config.sample.movement, MovementFormula::PercentOfLastPrice);
        assert_eq!(config.sample.degenerate_policy, DegeneratePolicy::Reject);
        assert_eq!(config.session.width, BarWidth::Hour1);
        assert_eq!(config.session.sample_count, 10);

        let params = config.session_params(SecurityId::new("SPY", "NYSE"));
        assert_eq!(params.sample_size, 8);
        assert_eq!(params.seed, 99);
        assert_eq!(params.options.movement, MovementFormula::PercentOfLastPrice);
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(matches!(
            MarketSenseConfig::from_toml("[synth]\namplitude = 2.0"),
            Err(ConfigError::Synth(_))
        ));
        assert!(matches!(
            MarketSenseConfig::from_toml("[session]\nsample_count = 0"),
            Err(ConfigError::Session(_))
        ));
        assert!(matches!(
            MarketSenseConfig::from_toml("[synth]\ntimbre = \"square\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = MarketSenseConfig::default();
        config.synth.timbre = TimbreFormula::Multiplicative;
        config.session.sample_size = 12;
        let text = config.to_toml().unwrap();
        assert_eq!(MarketSenseConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let err = MarketSenseConfig::from_file(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));

        let path = dir.path().join("marketsense.toml");
        std::fs::write(&path, "[session]\nsample_size = 4\n").unwrap();
        assert_eq!(MarketSenseConfig::from_file(&path).unwrap().session.sample_size, 4);
    }
}
