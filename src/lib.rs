pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliConfig;

pub use crate::config::Settings;
pub use crate::core::{
    classifier::RunReport,
    client::NhtsaClient,
    etl::{EtlEngine, RunPaths},
    pipeline::VinPipeline,
    retry::{BatchOutcome, RetryPolicy, RetryingDecoder},
};
pub use utils::error::{EtlError, Result};
