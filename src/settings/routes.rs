//! Settings API Routes
//!
//! - GET /api/settings - Current configuration (API keys masked)
//! - PUT /api/settings - Replace the whole configuration
//! - PATCH /api/settings/{provider} - Update fields of one provider
//! - GET /api/settings/providers - Provider and model catalogue
//! - POST /api/settings/test/{provider} - Test provider connection

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{info, warn};

use super::{ApiConfig, Provider, ProviderConfig, ProviderConfigUpdate, SettingsResponse};
use crate::llm::{zai::ZaiAdapter, LLMAdapter, LLMMessage, LLMRequest};
use crate::models::AppState;
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/settings", get(get_settings).put(save_settings))
        .route("/api/settings/providers", get(list_providers))
        .route("/api/settings/test/{provider}", post(test_provider))
        .route("/api/settings/{provider}", patch(update_provider))
        .with_state(state)
}

fn parse_provider(id: &str) -> AppResult<Provider> {
    Provider::from_id(id).ok_or_else(|| AppError::NotFound(format!("Unknown provider: {}", id)))
}

/// GET /api/settings
async fn get_settings(State(state): State<AppState>) -> AppResult<Json<SettingsResponse>> {
    let config = state.settings.load().await?;
    Ok(Json(SettingsResponse::from(&config)))
}

/// PUT /api/settings
async fn save_settings(
    State(state): State<AppState>,
    Json(config): Json<ApiConfig>,
) -> AppResult<impl IntoResponse> {
    state.settings.save(&config).await?;
    info!("Settings saved");

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Configuration saved successfully",
        "settings": SettingsResponse::from(&config)
    })))
}

/// PATCH /api/settings/{provider}
async fn update_provider(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(update): Json<ProviderConfigUpdate>,
) -> AppResult<Json<SettingsResponse>> {
    let provider = parse_provider(&provider)?;

    let mut config = state.settings.load().await?;
    config.apply_update(provider, update);
    state.settings.save(&config).await?;
    info!(%provider, "Provider settings updated");

    Ok(Json(SettingsResponse::from(&config)))
}

#[derive(Serialize)]
struct ProviderInfo {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    default_base_url: &'static str,
    /// Whether analysis requests actually reach this provider
    integrated: bool,
    models: Vec<ModelInfo>,
}

#[derive(Serialize)]
struct ModelInfo {
    id: &'static str,
    name: &'static str,
}

fn model_catalogue(provider: Provider) -> Vec<ModelInfo> {
    let models: &[(&'static str, &'static str)] = match provider {
        Provider::Gemini => &[
            ("gemini-pro", "Gemini Pro"),
            ("gemini-pro-vision", "Gemini Pro Vision"),
            ("gemini-1.5-pro", "Gemini 1.5 Pro"),
            ("gemini-1.5-flash", "Gemini 1.5 Flash"),
        ],
        Provider::DeepSeek => &[
            ("deepseek-chat", "DeepSeek Chat"),
            ("deepseek-coder", "DeepSeek Coder"),
            ("deepseek-vl", "DeepSeek VL"),
        ],
        Provider::Zai => &[
            (crate::llm::zai::models::GLM_4_5, "GLM-4.5"),
            (crate::llm::zai::models::GLM_4_5_AIR, "GLM-4.5 Air"),
            (crate::llm::zai::models::GLM_4_6, "GLM-4.6"),
        ],
    };

    models
        .iter()
        .map(|&(id, name)| ModelInfo { id, name })
        .collect()
}

/// GET /api/settings/providers
async fn list_providers() -> impl IntoResponse {
    let providers: Vec<ProviderInfo> = Provider::ALL
        .iter()
        .map(|provider| ProviderInfo {
            id: provider.id(),
            name: provider.display_name(),
            description: match provider {
                Provider::Gemini => "Google Gemini models for advanced data analysis",
                Provider::DeepSeek => "DeepSeek chat and coder models",
                Provider::Zai => "GLM models through the Z.AI platform",
            },
            default_base_url: provider.default_base_url(),
            integrated: matches!(provider, Provider::Zai),
            models: model_catalogue(*provider),
        })
        .collect();

    Json(providers)
}

/// POST /api/settings/test/{provider}
async fn test_provider(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> AppResult<impl IntoResponse> {
    let provider = parse_provider(&provider)?;
    let config = state.settings.provider_config(provider).await?;

    if !config.is_usable() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "error": "API key required"
            })),
        ));
    }

    let result = match provider {
        Provider::Zai => test_zai(&config).await,
        Provider::Gemini => test_gemini(&config).await,
        Provider::DeepSeek => test_deepseek(&config).await,
    };

    Ok(match result {
        Ok(message) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": message
            })),
        ),
        Err(error) => {
            warn!(%provider, %error, "Provider connection test failed");
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "success": false,
                    "error": error
                })),
            )
        }
    })
}

fn base_url(config: &ProviderConfig, provider: Provider) -> String {
    config
        .base_url_override()
        .unwrap_or(provider.default_base_url())
        .trim_end_matches('/')
        .to_string()
}

async fn test_zai(config: &ProviderConfig) -> Result<String, String> {
    let adapter = ZaiAdapter::with_base_url(&config.api_key, config.base_url_override());
    let mut request = LLMRequest::new(&config.model, vec![LLMMessage::user("Hi")]);
    request.max_tokens = Some(1);

    adapter
        .create_chat_completion(&request)
        .await
        .map(|_| "Connection successful".to_string())
        .map_err(|e| e.to_string())
}

async fn test_gemini(config: &ProviderConfig) -> Result<String, String> {
    let url = format!("{}/models", base_url(config, Provider::Gemini));
    let response = reqwest::Client::new()
        .get(&url)
        .query(&[("key", config.api_key.as_str())])
        .send()
        .await
        .map_err(|e| format!("Connection failed: {}", e))?;

    if response.status().is_success() {
        Ok("Connection successful".to_string())
    } else {
        Err(format!("API returned error: {}", response.status()))
    }
}

async fn test_deepseek(config: &ProviderConfig) -> Result<String, String> {
    let url = format!("{}/models", base_url(config, Provider::DeepSeek));
    let response = reqwest::Client::new()
        .get(&url)
        .bearer_auth(&config.api_key)
        .send()
        .await
        .map_err(|e| format!("Connection failed: {}", e))?;

    if response.status().is_success() {
        Ok("Connection successful".to_string())
    } else if response.status().as_u16() == 401 {
        Err("Invalid API key".to_string())
    } else {
        Err(format!("API returned error: {}", response.status()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_contains_default_models() {
        for provider in Provider::ALL {
            let models = model_catalogue(provider);
            assert!(models.iter().any(|m| m.id == provider.default_model()));
        }
    }

    #[tokio::test]
    async fn test_deepseek_connection_against_mock() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/models")
            .match_header("authorization", "Bearer sk-good")
            .with_status(200)
            .with_body(r#"{"data": []}"#)
            .create_async()
            .await;

        let config = ProviderConfig {
            enabled: true,
            api_key: "sk-good".to_string(),
            model: "deepseek-chat".to_string(),
            base_url: server.url(),
        };
        assert_eq!(test_deepseek(&config).await.unwrap(), "Connection successful");
    }

    #[tokio::test]
    async fn test_gemini_key_is_url_encoded() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/models")
            .match_query(mockito::Matcher::UrlEncoded(
                "key".to_string(),
                "AIza+key/with&odd=chars".to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"models": []}"#)
            .create_async()
            .await;

        let config = ProviderConfig {
            enabled: true,
            api_key: "AIza+key/with&odd=chars".to_string(),
            model: "gemini-pro".to_string(),
            base_url: server.url(),
        };
        assert_eq!(test_gemini(&config).await.unwrap(), "Connection successful");
    }
}
