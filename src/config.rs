//! Configuration module
//!
//! Reads the poller configuration from ~/.config/pisense/config.toml (or a path
//! given on the command line). Every key has a default, but the file itself
//! must exist and parse.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sensors::registers::hts221::av_conf;
use crate::sensors::{Averaging, Compensation, SenseHatOptions};

/// Template written by `pisense config` when no file exists yet
pub const TEMPLATE: &str = include_str!("../config.toml.example");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub app: AppConfig,
    pub bus: BusConfig,
    pub hts221: Hts221Config,
    pub logger: LoggerConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Time between samples
    pub polling_interval_ms: u64,
    /// How often the main loop looks for a shutdown request
    pub exit_check_interval_ms: u64,
    /// Consecutive failed samples tolerated before polling gives up
    pub max_consecutive_failures: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            polling_interval_ms: 1000,
            exit_check_interval_ms: 500,
            max_consecutive_failures: 5,
        }
    }
}

impl AppConfig {
    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }

    pub fn exit_check_interval(&self) -> Duration {
        Duration::from_millis(self.exit_check_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusConfig {
    pub path: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            path: "/dev/i2c-1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompensationMode {
    #[default]
    None,
    Simple,
    Linear,
    Cpu,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Hts221Config {
    pub temperature_compensation: CompensationMode,
    pub simple_offset: f64,
    pub linear_scale: f64,
    pub linear_offset: f64,
    pub cpu_coefficient: f64,
    /// Samples averaged per temperature reading (2..=256, powers of two)
    pub temperature_averaging: Option<u16>,
    /// Samples averaged per humidity reading (4..=512, powers of two)
    pub humidity_averaging: Option<u16>,
}

impl Default for Hts221Config {
    fn default() -> Self {
        Self {
            temperature_compensation: CompensationMode::None,
            simple_offset: 0.0,
            linear_scale: 1.0,
            linear_offset: 0.0,
            cpu_coefficient: 0.0,
            temperature_averaging: None,
            humidity_averaging: None,
        }
    }
}

impl Hts221Config {
    /// Resolve the configured mode into its compensation variant
    pub fn compensation(&self) -> Compensation {
        match self.temperature_compensation {
            CompensationMode::None => Compensation::None,
            CompensationMode::Simple => Compensation::Simple {
                offset: self.simple_offset,
            },
            CompensationMode::Linear => Compensation::Linear {
                scale: self.linear_scale,
                offset: self.linear_offset,
            },
            CompensationMode::Cpu => Compensation::Proportional {
                coefficient: self.cpu_coefficient,
            },
        }
    }

    /// `Ok(None)` leaves AV_CONF at the chip default
    pub fn averaging(&self) -> Result<Option<Averaging>, ConfigError> {
        if self.temperature_averaging.is_none() && self.humidity_averaging.is_none() {
            return Ok(None);
        }

        let temperature = self
            .temperature_averaging
            .unwrap_or(av_conf::DEFAULT_TEMPERATURE_SAMPLES);
        let humidity = self
            .humidity_averaging
            .unwrap_or(av_conf::DEFAULT_HUMIDITY_SAMPLES);

        Averaging::new(temperature, humidity).map(Some).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "hts221 averaging {}/{} not supported (temperature: {:?}, humidity: {:?})",
                temperature,
                humidity,
                av_conf::TEMPERATURE_SAMPLES,
                av_conf::HUMIDITY_SAMPLES
            ))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    /// trace, debug, info, warn, error or off
    pub level: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct DebugConfig {
    pub print_config_on_startup: bool,
    pub run_health_check_on_startup: bool,
}

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

impl Config {
    /// Default config file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pisense").join("config.toml"))
    }

    /// `explicit` if given, the default location otherwise
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
        match explicit {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::default_path().ok_or(ConfigError::NoConfigDir),
        }
    }

    /// Load and validate config from `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&contents).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.app.polling_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "app.polling_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.app.exit_check_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "app.exit_check_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.app.max_consecutive_failures == 0 {
            return Err(ConfigError::Invalid(
                "app.max_consecutive_failures must be at least 1".to_string(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logger.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "logger.level '{}' is not one of {}",
                self.logger.level,
                LOG_LEVELS.join(", ")
            )));
        }
        self.hts221.averaging()?;
        Ok(())
    }

    /// Board settings derived from the `[hts221]` section
    pub fn sense_hat_options(&self) -> Result<SenseHatOptions, ConfigError> {
        Ok(SenseHatOptions {
            compensation: self.hts221.compensation(),
            averaging: self.hts221.averaging()?,
        })
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
