//! Read-only REST API over a finished planning report.
//!
//! Endpoints:
//! - `/report` full report
//! - `/sites?limit=N` ranked site recommendations
//! - `/clusters` k-means and DBSCAN station groupings
//! - `/schedule` original versus optimized load

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::config::PlannerConfig;
use crate::report::PlanningReport;

pub use types::{
    ClustersResponse, DensityResponse, ErrorResponse, ScheduleResponse, SiteRecord, SitesQuery,
};

/// Immutable application state shared across all request handlers.
///
/// Built once after the planning run and wrapped in `Arc`; nothing is
/// mutated afterwards.
pub struct AppState {
    /// Configuration the report was produced with.
    pub config: PlannerConfig,
    pub report: PlanningReport,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/report", get(handlers::get_report))
        .route("/sites", get(handlers::get_sites))
        .route("/clusters", get(handlers::get_clusters))
        .route("/schedule", get(handlers::get_schedule))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
