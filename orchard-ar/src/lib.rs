//! orchard-ar library - Analysis & Reports service
//!
//! Accepts observations over HTTP, stores them in SQLite and serves the
//! analysis views: aggregate findings, paginated report documents, CSV export
//! and summary-code decoding.

use std::collections::HashSet;
use std::sync::Arc;

use axum::Router;
use orchard_common::analysis::{AnalysisConfig, PageGeometry};
use orchard_common::config::AuthConfig;
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub mod api;
pub mod error;
pub mod pagination;

/// Largest accepted request body (10 MB)
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Catalog and unknown-category policy, fixed at startup
    pub analysis: Arc<AnalysisConfig>,
    /// Report page geometry
    pub geometry: PageGeometry,
    pub auth: Arc<AuthConfig>,
    /// Live session tokens issued by `/api/login`
    pub sessions: Arc<RwLock<HashSet<Uuid>>>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        analysis: AnalysisConfig,
        geometry: PageGeometry,
        auth: AuthConfig,
    ) -> Self {
        Self {
            db,
            analysis: Arc::new(analysis),
            geometry,
            auth: Arc::new(auth),
            sessions: Arc::new(RwLock::new(HashSet::new())),
        }
    }
}

/// Build application router
///
/// `/health`, `/api/login` and `/api/logout` are public; everything else
/// goes through the session gate.
pub fn build_router(state: AppState) -> Router {
    use axum::extract::DefaultBodyLimit;
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require a session when auth is enabled)
    let protected = Router::new()
        .route(
            "/api/observations",
            get(api::list_observations).post(api::create_observation),
        )
        .route("/api/analysis", get(api::get_analysis))
        .route("/api/reports/records", get(api::download_records_report))
        .route("/api/reports/records/:id", get(api::download_record_report))
        .route("/api/reports/aggregate", get(api::download_aggregate_report))
        .route("/api/export/csv", get(api::download_csv))
        .route("/api/summary/decode", post(api::decode_summary))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/api/login", post(api::login))
        .route("/api/logout", post(api::logout))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
