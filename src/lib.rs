//! platewatch library interface
//!
//! Exposes public APIs for integration testing

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod similarity;
pub mod source_time;
pub mod tracking;

pub use crate::error::{ApiError, ApiResult, Error, Result};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Global write lock serializing ingestion against batch scans
    pub write_lock: Arc<Mutex<()>>,
    /// Cancellation token for the running similar-plate analysis, if any
    pub correlation_cancel: Arc<RwLock<Option<CancellationToken>>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            write_lock: Arc::new(Mutex::new(())),
            correlation_cancel: Arc::new(RwLock::new(None)),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Ingestion gateway bound to this state's pool and write lock.
    pub fn ingest_gateway(&self) -> services::IngestGateway {
        services::IngestGateway::new(self.db.clone(), self.write_lock.clone())
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::plate_routes())
        .merge(api::blacklist_routes())
        .merge(api::alert_routes())
        .merge(api::profile_routes())
        .merge(api::analysis_routes())
        .merge(api::settings_routes())
        .merge(api::ingest_routes())
        .merge(api::maintenance_routes())
        .merge(api::health_routes())
        .with_state(state)
}
