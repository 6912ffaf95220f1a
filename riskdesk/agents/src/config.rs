use std::{
    fs,
    path::{Path, PathBuf},
};

use riskdesk_scoring::ScoringPolicy;
use serde::Deserialize;
use shared_logging::LogLevel;
use thiserror::Error;

use crate::{alerts::DEFAULT_ALERT_THRESHOLD, market::DEFAULT_SIGNAL_FLOOR};

/// Errors loading `riskdesk.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("reading config {path}: {source}")]
    Io {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// File is not valid TOML for this schema.
    #[error("parsing config {path}: {source}")]
    Parse {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },
    /// Values parsed but are out of bounds.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// `[alerts]` section.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlertSettings {
    /// Overall score at which alerts fire.
    pub threshold: f64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ALERT_THRESHOLD,
        }
    }
}

/// `[market]` section.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketSettings {
    /// Signals at or above this value become market factors.
    pub signal_floor: f64,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            signal_floor: DEFAULT_SIGNAL_FLOOR,
        }
    }
}

/// `[telemetry]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetrySettings {
    /// JSON-lines log file.
    pub log_path: Option<PathBuf>,
    /// JSON-lines event file.
    pub event_log: Option<PathBuf>,
    /// Records below this level are dropped.
    pub min_level: LogLevel,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_path: None,
            event_log: None,
            min_level: LogLevel::Info,
        }
    }
}

/// Full configuration document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskDeskConfig {
    /// Scoring model knobs.
    pub scoring: ScoringPolicy,
    /// Alerting.
    pub alerts: AlertSettings,
    /// Market analysis.
    pub market: MarketSettings,
    /// Logging and events.
    pub telemetry: TelemetrySettings,
}

impl RiskDeskConfig {
    /// Loads and validates a TOML file. Relative telemetry paths resolve
    /// against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        for slot in [
            &mut config.telemetry.log_path,
            &mut config.telemetry.event_log,
        ] {
            if let Some(candidate) = slot.as_mut() {
                if candidate.is_relative() {
                    *candidate = base.join(&*candidate);
                }
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise returns validated defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring
            .weights
            .validate()
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        if !(0.0..=10.0).contains(&self.alerts.threshold) {
            return Err(ConfigError::Invalid(format!(
                "alerts.threshold {} is outside [0, 10]",
                self.alerts.threshold
            )));
        }
        if !(0.0..=10.0).contains(&self.market.signal_floor) {
            return Err(ConfigError::Invalid(format!(
                "market.signal_floor {} is outside [0, 10]",
                self.market.signal_floor
            )));
        }
        Ok(())
    }
}
