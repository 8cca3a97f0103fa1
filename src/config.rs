//! Application configuration: forecast strategy settings and logging
//! preferences, persisted as TOML under the platform config directory.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, GoalrsError, Result};
use crate::forecast::DEFAULT_LOOKBACK_DAYS;
use crate::logging::LogConfig;
use crate::models::ForecastMode;
use crate::progress::default_blend_weight;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file metadata
    pub metadata: ConfigMetadata,

    /// Forecast strategy settings
    pub forecast: ForecastSettings,

    /// Logging preferences
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Forecast strategy settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSettings {
    /// Weekly-rate strategy for the progress engine
    pub mode: ForecastMode,

    /// Rolling share in the blend strategy, 0 to 1
    pub blend_weight_rolling: Decimal,

    /// Trend window for the day-granular forecast, in days
    pub lookback_days: u32,

    /// Count commute rides toward totals
    pub include_commute: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            forecast: ForecastSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for ForecastSettings {
    fn default() -> Self {
        ForecastSettings {
            mode: ForecastMode::default(),
            blend_weight_rolling: default_blend_weight(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            include_commute: true,
        }
    }
}

impl ForecastSettings {
    /// Check settings against their valid ranges.
    pub fn validate(&self) -> Result<()> {
        if self.blend_weight_rolling < Decimal::ZERO || self.blend_weight_rolling > Decimal::ONE {
            return Err(ConfigError::InvalidValue {
                field: "forecast.blend_weight_rolling".to_string(),
                reason: format!("{} is not between 0 and 1", self.blend_weight_rolling),
            }
            .into());
        }

        if self.lookback_days < 7 {
            return Err(ConfigError::InvalidValue {
                field: "forecast.lookback_days".to_string(),
                reason: format!("{} is shorter than one week", self.lookback_days),
            }
            .into());
        }

        Ok(())
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Validate all settings
    pub fn validate(&self) -> Result<()> {
        self.forecast.validate()
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            reason: e.to_string(),
        })?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a TOML file, refreshing the modification
    /// timestamp
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.validate()?;
        self.metadata.updated_at = Utc::now();

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::WriteFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        fs::write(path, toml_content)?;

        Ok(())
    }

    /// Default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("goalrs")
            .join("config.toml")
    }

    /// Load from an explicit path (hard error) or from the default location
    /// (falling back to defaults when absent).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::load_or_default()),
        }
    }

    /// Load configuration from the default location, falling back to
    /// defaults when it is missing or unreadable
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(GoalrsError::Config(ConfigError::NotFound { .. })) => Self::default(),
            Err(err) => {
                tracing::warn!(
                    path = %config_path.display(),
                    error = %err,
                    "Ignoring unreadable config file"
                );
                Self::default()
            }
        }
    }

    /// Save configuration to the default location
    pub fn save_default(&mut self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to_file(config_path)
    }

    /// Save configuration (alias for save_default)
    pub fn save(&mut self) -> Result<()> {
        self.save_default()
    }
}
