// Sheet Insight - spreadsheet ingestion, field extraction and AI-assisted analysis

pub mod analysis;
pub mod config;
pub mod extract;   // Name/date/time recognition over cell text
pub mod ingest;    // XLSX/CSV parsing into a grid
pub mod llm;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod settings;  // Provider configuration and API key storage
pub mod store;     // Shared workspace state for the current file
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
