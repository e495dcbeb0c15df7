use axum::{extract::rejection::JsonRejection, routing::post, Json, Router};
use tracing::info;
use validator::Validate;

use crate::analysis::{analyze, AnalysisInput};
use crate::models::{AnalysisResult, AnalyzeRequest};
use crate::types::{AppError, AppResult};

pub fn router() -> Router {
    Router::new().route("/api/analyze", post(analyze_handler))
}

const MISSING_PARAMETERS: &str = "Missing required parameters";

/// POST /api/analyze - stateless analysis with caller-supplied credentials
async fn analyze_handler(
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> AppResult<Json<AnalysisResult>> {
    let Json(request) =
        payload.map_err(|_| AppError::InvalidRequest(MISSING_PARAMETERS.to_string()))?;
    request
        .validate()
        .map_err(|_| AppError::InvalidRequest(MISSING_PARAMETERS.to_string()))?;

    let data = request.data.unwrap_or_default();
    info!(provider = %request.provider, rows = data.len(), "Analysis request received");

    let result = analyze(&AnalysisInput {
        data: &data,
        provider: &request.provider,
        api_key: &request.api_key,
        model: &request.model,
        base_url: request.base_url.as_deref(),
    })
    .await?;

    Ok(Json(result))
}
