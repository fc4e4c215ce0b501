use crate::config::toml_config::TomlConfig;
use crate::config::{seconds, Settings};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "vin-etl")]
#[command(about = "Count electrified vehicles in a VIN list using the NHTSA vPIC batch decoder")]
pub struct CliConfig {
    #[arg(default_value = "VIN_List.csv", help = "CSV file with a VIN column")]
    pub input: PathBuf,

    #[arg(default_value = "EV_Counts.txt", help = "Summary output file")]
    pub summary: PathBuf,

    #[arg(default_value = "EV_Details.csv", help = "EV detail output file")]
    pub details: PathBuf,

    #[arg(long, help = "TOML file with [source] and [batch] settings")]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub endpoint: Option<String>,

    #[arg(long, help = "VINs per decode request (1-50)")]
    pub chunk_size: Option<usize>,

    #[arg(long, help = "Initial retry delay in seconds; request timeout is 5x the current delay")]
    pub base_delay_secs: Option<f64>,

    #[arg(long)]
    pub max_retries: Option<u32>,

    #[arg(long, help = "Pause between batches in seconds")]
    pub batch_pause_secs: Option<f64>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliConfig {
    /// Layers flags over the optional TOML file over the defaults.
    pub fn resolve(&self) -> Result<Settings> {
        let mut settings = Settings::default();

        if let Some(path) = &self.config {
            tracing::debug!("Loading config file {}", path.display());
            settings.apply_toml(&TomlConfig::from_file(path)?)?;
        }

        if let Some(endpoint) = &self.endpoint {
            settings.endpoint = endpoint.clone();
        }
        if let Some(chunk_size) = self.chunk_size {
            settings.chunk_size = chunk_size;
        }
        if let Some(delay) = self.base_delay_secs {
            settings.base_delay = seconds("base_delay_secs", delay)?;
        }
        if let Some(retries) = self.max_retries {
            settings.max_retries = retries;
        }
        if let Some(pause) = self.batch_pause_secs {
            settings.batch_pause = seconds("batch_pause_secs", pause)?;
        }

        settings.paths.input = self.input.clone();
        settings.paths.summary = self.summary.clone();
        settings.paths.details = self.details.clone();

        settings.validate()?;
        Ok(settings)
    }
}
