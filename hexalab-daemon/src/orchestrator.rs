//! Service assembly and lifecycle management.
//!
//! The [`Orchestrator`] is the central coordinator of `hexalab-daemon`.
//! It validates configuration, builds the scan pipeline, the job queue and
//! its worker pool, and serves the HTTP API until a shutdown signal arrives.
//!
//! # Startup Order
//!
//! 1. Worker pool (consumes queued jobs)
//! 2. HTTP listener (produces jobs)
//!
//! # Shutdown Order (producers first)
//!
//! 1. HTTP listener (stop accepting submissions, finish in-flight requests)
//! 2. Worker pool (finish running jobs up to `queue.shutdown_timeout_secs`)

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;

use hexalab_core::config::HexalabConfig;
use hexalab_core::pipeline::Pipeline;
use hexalab_job_queue::{JobQueue, JobQueueBuilder, QueueConfig, WorkerPool};
use hexalab_sbom_scanner::{SbomScannerConfig, ScanPipeline};

use crate::api::{self, AppState};
use crate::health::DaemonHealth;
use crate::metrics_server;

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: HexalabConfig,
    /// Submission handle shared with the HTTP layer.
    queue: JobQueue,
    /// Worker pool (shared with the health endpoint).
    pool: Arc<RwLock<WorkerPool>>,
    /// Handler state.
    state: AppState,
}

impl Orchestrator {
    /// Load configuration and build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read, parsed or
    /// validated, or if any component fails to build.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = HexalabConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config).await
    }

    /// Build from an already-loaded configuration.
    pub async fn build_from_config(config: HexalabConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
            record_daemon_metrics();
        }

        tracing::info!("initializing scan pipeline");
        let scanner_config = SbomScannerConfig::from_core(&config.scanner);
        let pipeline = ScanPipeline::from_config(scanner_config)
            .map_err(|e| anyhow::anyhow!("failed to build scan pipeline: {}", e))?;

        tracing::info!("initializing job queue");
        let queue_config = QueueConfig::from_core(&config.queue, &config.general);
        let (queue, pool) = JobQueueBuilder::new()
            .config(queue_config)
            .executor(Arc::new(pipeline))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build job queue: {}", e))?;

        let pool = Arc::new(RwLock::new(pool));
        let state = AppState::new(queue.clone(), Arc::clone(&pool), &config.server.upload_dir);

        tracing::info!(
            workers = config.queue.workers,
            capacity = config.queue.capacity,
            "orchestrator initialized"
        );

        Ok(Self {
            config,
            queue,
            pool,
            state,
        })
    }

    /// Start the worker pool, serve the API, and block until a shutdown signal.
    ///
    /// # Shutdown Triggers
    ///
    /// - `SIGTERM` (from systemd, Docker, or `kill`)
    /// - `SIGINT` (Ctrl+C)
    pub async fn run(&mut self) -> Result<()> {
        let addr: SocketAddr = format!(
            "{}:{}",
            self.config.server.listen_addr, self.config.server.port
        )
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server listen address: {}", e))?;

        tokio::fs::create_dir_all(&self.config.server.upload_dir)
            .await
            .map_err(|e| {
                anyhow::anyhow!(
                    "failed to create upload directory {}: {}",
                    self.config.server.upload_dir,
                    e
                )
            })?;

        self.pool.write().await.start().await?;

        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                // Rollback: the pool was already started
                if let Err(stop_err) = self.pool.write().await.stop().await {
                    tracing::error!(error = %stop_err, "failed to stop worker pool after bind failure");
                }
                return Err(anyhow::anyhow!("failed to bind {}: {}", addr, e));
            }
        };

        tracing::info!(listen_addr = %addr, "scan API listening");

        let app = self.router();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                match wait_for_shutdown_signal().await {
                    Ok(signal) => tracing::info!(signal, "shutdown signal received"),
                    Err(e) => tracing::error!(error = %e, "signal handler failed, shutting down"),
                }
            })
            .await;

        if let Err(e) = &served {
            tracing::error!(error = %e, "HTTP server terminated with error");
        }

        self.shutdown().await?;
        served.map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))
    }

    /// Stop the worker pool.
    async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("stopping worker pool");
        self.pool.write().await.stop().await.map_err(|e| e.into())
    }

    /// Build the API router for this daemon.
    pub fn router(&self) -> axum::Router {
        api::router(self.state.clone(), &self.config.server)
    }

    /// Get the current aggregated health status.
    pub async fn health(&self) -> DaemonHealth {
        self.state.health().await
    }

    /// Submission handle.
    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &HexalabConfig {
        &self.config
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}

/// Record daemon-level metrics (build info).
fn record_daemon_metrics() {
    use hexalab_core::metrics as m;

    metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "daemon metrics recorded");
}
