use clap::Parser;
use tabularizer::domain::ports::Storage;
use tabularizer::utils::error::{ErrorSeverity, TabularizeError};
use tabularizer::utils::logger;
use tabularizer::{CliConfig, HttpSource, LocalStorage, Tabularizer, TomlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting tabularize CLI");
    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    match run(&config, cli.monitor).await {
        Ok(output_path) => {
            tracing::info!("📁 Output saved to: {}", output_path);
            println!("✅ Export completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Export failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // An empty dataset is a warning, not a failure.
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run(config: &TomlConfig, monitor: bool) -> Result<String, TabularizeError> {
    let mut source = HttpSource::new();
    if let Some(timeout) = config.timeout() {
        source = source.with_timeout(timeout);
    }
    if let Some(headers) = &config.source.headers {
        source = source.with_headers(headers.clone());
    }

    let request = config.to_request()?;
    let tabularizer =
        Tabularizer::with_loader_options(source, config.loader.clone()).with_monitoring(monitor);
    let blob = tabularizer.export(&request).await?;

    let storage = LocalStorage::new(config.output.path.clone());
    storage
        .write_file(&config.output.filename(), blob.as_bytes())
        .await
}
