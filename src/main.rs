use clap::Parser;
use vin_etl::domain::ports::ConfigProvider;
use vin_etl::utils::error::ErrorSeverity;
use vin_etl::utils::logger;
use vin_etl::{CliConfig, EtlEngine, NhtsaClient, VinPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting vin-etl");
    tracing::debug!("CLI config: {:?}", config);

    let settings = match config.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let client = NhtsaClient::new(settings.api_endpoint());
    let pipeline = VinPipeline::new(client, &settings);
    let engine = EtlEngine::new_with_monitoring(pipeline, settings.paths.clone(), config.monitor);

    match engine.run().await {
        Ok(report) => {
            tracing::info!(
                "✅ Processed {} lines, {} EVs found",
                report.totals.lines_processed,
                report.totals.evs_found
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }
    }
}
