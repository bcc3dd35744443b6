use anyhow::Result;
use clap::Parser;
use tokio::io::BufReader;

use tapflow_core::config::TapflowConfig;
use tapflow_daemon::cli::DaemonCli;
use tapflow_daemon::logging;
use tapflow_daemon::orchestrator::{self, Orchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let mut config = TapflowConfig::load(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", cli.config.display(), e))?;

    // CLI flags take precedence over the config file and environment variables
    if let Some(level) = cli.log_level {
        config.general.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.general.log_format = format;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if cli.validate {
        println!("configuration OK: {}", cli.config.display());
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(config = %cli.config.display(), "tapflow-daemon starting");

    let orchestrator = Orchestrator::build_from_config(config)?;
    let shutdown = orchestrator.shutdown_handle();
    tokio::spawn(async move {
        match orchestrator::wait_for_shutdown_signal().await {
            Ok(signal) => {
                tracing::info!(signal, "shutdown signal received");
                let _ = shutdown.send(());
            }
            Err(e) => tracing::error!(error = %e, "signal handler failed"),
        }
    });

    let stdout = tokio::io::stdout();
    let summary = match &cli.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|e| anyhow::anyhow!("failed to open input {}: {}", path.display(), e))?;
            orchestrator.run(BufReader::new(file), stdout).await?.0
        }
        None => orchestrator.run(BufReader::new(tokio::io::stdin()), stdout).await?.0,
    };

    tracing::info!(
        processed = summary.processed,
        outputs = summary.outputs,
        malformed = summary.ingest.malformed,
        "tapflow-daemon shut down"
    );
    Ok(())
}
