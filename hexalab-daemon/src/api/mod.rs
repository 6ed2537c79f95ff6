//! Scan HTTP API.
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | POST | `/scan` | [`handlers::submit_scan`] |
//! | POST | `/scan/upload` | [`handlers::upload_scan`] |
//! | GET | `/scan/{job_id}/status` | [`handlers::get_status`] |
//! | GET | `/scan/{job_id}/report` | [`handlers::get_report`] |
//! | GET | `/health` | [`handlers::health`] |

pub mod error;
pub mod handlers;
pub mod models;
pub mod upload;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use hexalab_core::config::ServerConfig;
use hexalab_core::pipeline::{HealthStatus, Pipeline};
use hexalab_job_queue::{JobQueue, WorkerPool};

use crate::health::{ComponentHealth, DaemonHealth, aggregate_status};

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Submission and lookup handle.
    pub queue: JobQueue,
    /// Worker pool, shared with the orchestrator for start/stop.
    pub pool: Arc<RwLock<WorkerPool>>,
    /// Root directory for uploaded files.
    pub upload_dir: PathBuf,
    /// Daemon start time.
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        queue: JobQueue,
        pool: Arc<RwLock<WorkerPool>>,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            queue,
            pool,
            upload_dir: upload_dir.into(),
            started_at: Instant::now(),
        }
    }

    /// Collect component health without waiting on a pool that is starting or stopping.
    pub async fn health(&self) -> DaemonHealth {
        let pool_status = match self.pool.try_read() {
            Ok(pool) => pool.health_check().await,
            Err(_) => HealthStatus::Degraded("worker pool is changing state".to_owned()),
        };

        let queue_status = if self.queue.is_closed() {
            HealthStatus::Unhealthy("queue closed".to_owned())
        } else if self.queue.available_slots() == 0 {
            HealthStatus::Degraded(format!(
                "queue full (capacity {})",
                self.queue.config().capacity
            ))
        } else {
            HealthStatus::Healthy
        };

        let components = vec![
            ComponentHealth::new("worker-pool", pool_status),
            ComponentHealth::new("job-queue", queue_status),
        ];

        DaemonHealth {
            status: aggregate_status(&components),
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs: self.started_at.elapsed().as_secs(),
            components,
            jobs: self.queue.stats().await,
        }
    }
}

/// Build the API router with CORS, body limit and request tracing layers.
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/scan", post(handlers::submit_scan))
        .route("/scan/upload", post(handlers::upload_scan))
        .route("/scan/{job_id}/status", get(handlers::get_status))
        .route("/scan/{job_id}/report", get(handlers::get_report))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(cors_layer(&server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600));

    if origins.len() == 1 && origins[0] == "*" {
        return base
            .allow_origin(AllowOrigin::mirror_request())
            .allow_credentials(false);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "invalid CORS origin in config; skipping");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
}
