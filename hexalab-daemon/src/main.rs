use anyhow::Result;
use clap::Parser;

use hexalab_core::config::HexalabConfig;
use hexalab_daemon::cli::DaemonCli;
use hexalab_daemon::logging;
use hexalab_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // file + env, then CLI flags on top
    let mut config = HexalabConfig::load(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", cli.config.display(), e))?;
    if let Some(level) = &cli.log_level {
        config.general.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.general.log_format = format;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if cli.validate {
        println!("configuration is valid: {}", cli.config.display());
        return Ok(());
    }

    let log_settings = logging::LogSettings::resolve(
        &config.general,
        cli.log_level.as_deref(),
        std::env::var("RUST_LOG").ok(),
    )?;
    logging::init_tracing(&log_settings)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "hexalab-daemon starting"
    );

    let mut orchestrator = Orchestrator::build_from_config(config).await?;
    orchestrator.run().await?;

    tracing::info!("hexalab-daemon shut down");
    Ok(())
}
