#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::batcher::DEFAULT_CHUNK_SIZE;
use crate::core::client::DEFAULT_ENDPOINT;
use crate::core::etl::RunPaths;
use crate::core::retry::{
    DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_FACTOR, MAX_RETRIES_LIMIT,
};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use std::path::PathBuf;
use std::time::Duration;
use toml_config::TomlConfig;

pub const DEFAULT_INPUT: &str = "VIN_List.csv";
pub const DEFAULT_SUMMARY: &str = "EV_Counts.txt";
pub const DEFAULT_DETAILS: &str = "EV_Details.csv";
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_secs(4);

/// vPIC refuses batches larger than this.
pub const MAX_CHUNK_SIZE: usize = 50;

/// Fully resolved run settings: defaults, then the TOML file, then flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub endpoint: String,
    pub chunk_size: usize,
    pub base_delay: Duration,
    pub timeout_factor: u32,
    pub max_retries: u32,
    pub batch_pause: Duration,
    pub paths: RunPaths,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            base_delay: DEFAULT_BASE_DELAY,
            timeout_factor: DEFAULT_TIMEOUT_FACTOR,
            max_retries: DEFAULT_MAX_RETRIES,
            batch_pause: DEFAULT_BATCH_PAUSE,
            paths: RunPaths {
                input: PathBuf::from(DEFAULT_INPUT),
                summary: PathBuf::from(DEFAULT_SUMMARY),
                details: PathBuf::from(DEFAULT_DETAILS),
            },
        }
    }
}

pub(crate) fn seconds(field: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|e| EtlError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

impl Settings {
    pub fn apply_toml(&mut self, config: &TomlConfig) -> Result<()> {
        config.validate()?;

        if let Some(endpoint) = &config.source.endpoint {
            self.endpoint = endpoint.clone();
        }
        if let Some(delay) = config.source.base_delay_seconds {
            self.base_delay = seconds("source.base_delay_seconds", delay)?;
        }
        if let Some(factor) = config.source.timeout_factor {
            self.timeout_factor = factor;
        }
        if let Some(retries) = config.source.retry_attempts {
            self.max_retries = retries;
        }
        if let Some(chunk_size) = config.batch.chunk_size {
            self.chunk_size = chunk_size;
        }
        if let Some(pause) = config.batch.pause_seconds {
            self.batch_pause = seconds("batch.pause_seconds", pause)?;
        }
        Ok(())
    }
}

impl ConfigProvider for Settings {
    fn api_endpoint(&self) -> &str {
        &self.endpoint
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn base_delay(&self) -> Duration {
        self.base_delay
    }

    fn timeout_factor(&self) -> u32 {
        self.timeout_factor
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn batch_pause(&self) -> Duration {
        self.batch_pause
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_url("endpoint", &self.endpoint)?;
        validation::validate_range("chunk_size", self.chunk_size, 1, MAX_CHUNK_SIZE)?;
        validation::validate_positive_number("timeout_factor", self.timeout_factor as usize, 1)?;
        validation::validate_range("max_retries", self.max_retries, 0, MAX_RETRIES_LIMIT)?;
        // 逾時是延遲的倍數，延遲為 0 會讓每個請求立即逾時
        if self.base_delay.is_zero() {
            return Err(EtlError::InvalidConfigValueError {
                field: "base_delay".to_string(),
                value: format!("{:?}", self.base_delay),
                reason: "Base delay must be greater than zero".to_string(),
            });
        }
        validation::validate_path("input", &self.paths.input.to_string_lossy())?;
        validation::validate_path("summary", &self.paths.summary.to_string_lossy())?;
        validation::validate_path("details", &self.paths.details.to_string_lossy())?;

        if self.paths.summary == self.paths.details {
            return Err(EtlError::ConfigValidationError {
                field: "details".to_string(),
                message: "summary and details must be different files".to_string(),
            });
        }
        Ok(())
    }
}
