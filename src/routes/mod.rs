//! API Routes
//!
//! - `/api/files` - Upload, current file view, analysis of the current file
//! - `/api/status` - Processing status of the workspace
//! - `/api/analyze` - Stateless AI analysis with caller-supplied credentials
//! - `/api/settings` - Provider configuration
//! - `/api/health` - Health checks
//! - `/` - Browser page

pub mod analyze;
pub mod files;
pub mod health;
pub mod ui;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::cors_layer;
use crate::models::AppState;
use crate::settings;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let cors = cors_layer(&state.config.server);

    Router::new()
        .merge(files::router(state.clone()))
        .merge(settings::router(state))
        .merge(analyze::router())
        .merge(health::router())
        .merge(ui::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
