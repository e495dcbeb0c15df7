use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::analysis::{analyze, AnalysisInput};
use crate::ingest::process_file_blocking;
use crate::models::{AiAnalysis, AnalyzeCurrentRequest, AppState, FileDataView};
use crate::settings::Provider;
use crate::store::StoreSnapshot;
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    let max_upload = state.config.upload.max_upload_bytes;

    Router::new()
        .route("/api/files", post(upload_file))
        .route("/api/files/current", get(current_file).delete(reset_file))
        .route("/api/files/current/analyze", post(analyze_current))
        .route("/api/status", get(status))
        .layer(DefaultBodyLimit::max(max_upload))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ViewQuery {
    rows: Option<usize>,
}

/// POST /api/files - multipart upload, field `file`
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<FileDataView>> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidRequest(format!("Failed to read upload: {}", e)))?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, content) =
        upload.ok_or_else(|| AppError::InvalidRequest("No file provided".to_string()))?;
    info!(%file_name, size = content.len(), "File upload received");

    let store = &state.store;
    store.begin_processing(&file_name).await;
    store.set_progress(20).await;

    match process_file_blocking(file_name.clone(), content).await {
        Ok(file_data) => {
            store.set_progress(90).await;
            let view = FileDataView::from_file_data(&file_data, state.config.upload.display_rows);
            store.complete(file_data).await;
            Ok(Json(view))
        }
        Err(e) => {
            warn!(%file_name, error = %e, "File processing failed");
            store.fail(e.to_string()).await;
            Err(e)
        }
    }
}

/// GET /api/files/current
async fn current_file(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> AppResult<Json<FileDataView>> {
    let data = state
        .store
        .file_data()
        .await
        .ok_or_else(|| AppError::NotFound("No file loaded".to_string()))?;

    let rows = query.rows.unwrap_or(state.config.upload.display_rows);
    Ok(Json(FileDataView::from_file_data(&data, rows)))
}

/// DELETE /api/files/current
async fn reset_file(State(state): State<AppState>) -> StatusCode {
    state.store.reset().await;
    info!("Workspace reset");
    StatusCode::NO_CONTENT
}

/// POST /api/files/current/analyze - analysis with the stored provider settings
async fn analyze_current(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<FileDataView>> {
    let request: AnalyzeCurrentRequest = if body.is_empty() {
        AnalyzeCurrentRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::InvalidRequest(format!("Invalid request body: {}", e)))?
    };
    let store = &state.store;

    if let Some(id) = request.provider.as_deref() {
        let provider = Provider::from_id(id)
            .ok_or_else(|| AppError::InvalidRequest(format!("Unknown provider: {}", id)))?;
        store.set_selected_provider(provider).await;
    }
    let provider = store.selected_provider().await;

    let ticket = store.begin_analysis().await?;

    let config = match state.settings.provider_config(provider).await {
        Ok(config) if config.is_usable() => config,
        Ok(_) => {
            let err = AppError::NotConfigured(provider.to_string());
            store.fail_analysis(err.to_string()).await;
            return Err(err);
        }
        Err(e) => {
            let err = AppError::from(e);
            store.fail_analysis(err.to_string()).await;
            return Err(err);
        }
    };

    let result = analyze(&AnalysisInput {
        data: &ticket.rows,
        provider: provider.id(),
        api_key: &config.api_key,
        model: &config.model,
        base_url: config.base_url_override(),
    })
    .await;

    match result {
        Ok(result) => {
            let data = store
                .finish_analysis(
                    ticket,
                    AiAnalysis {
                        insights: result.insights,
                        summary: result.summary,
                        provider: provider.to_string(),
                    },
                )
                .await?;
            Ok(Json(FileDataView::from_file_data(&data, state.config.upload.display_rows)))
        }
        Err(e) => {
            store.fail_analysis(e.to_string()).await;
            Err(e)
        }
    }
}

/// GET /api/status
async fn status(State(state): State<AppState>) -> Json<StoreSnapshot> {
    Json(state.store.snapshot().await)
}
