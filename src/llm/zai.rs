// Z.AI (GLM) adapter
// OpenAI-compatible chat completions on the general endpoint:
// https://api.z.ai/api/paas/v4/chat/completions

use crate::llm::provider::LLMAdapter;
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest, LLMResponse, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const ZAI_API_BASE: &str = "https://api.z.ai/api/paas/v4";

pub struct ZaiAdapter {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
struct ZaiChatRequest<'a> {
    model: &'a str,
    messages: &'a [LLMMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Deserialize)]
struct ZaiChatResponse {
    choices: Vec<ZaiChoice>,
    #[serde(default)]
    usage: Option<ZaiUsage>,
}

#[derive(Deserialize)]
struct ZaiChoice {
    message: ZaiResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ZaiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ZaiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
struct ZaiErrorResponse {
    error: ZaiError,
}

#[derive(Deserialize)]
struct ZaiError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

impl ZaiAdapter {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, None)
    }

    /// An empty or missing base URL falls back to the public endpoint.
    pub fn with_base_url(api_key: &str, base_url: Option<&str>) -> Self {
        let base_url = base_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(ZAI_API_BASE)
            .trim_end_matches('/')
            .to_string();

        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LLMAdapter for ZaiAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(%url, model = %request.model, "Sending chat completion");

        let body = ZaiChatRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLMApi(format!("Z.AI request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(error_response) = serde_json::from_str::<ZaiErrorResponse>(&error_text) {
                return Err(AppError::LLMApi(format!(
                    "Z.AI API error ({}): {} (code: {})",
                    status,
                    error_response.error.message,
                    error_response.error.code.as_deref().unwrap_or("none")
                )));
            }

            return Err(AppError::LLMApi(format!(
                "Z.AI API error ({}): {}",
                status, error_text
            )));
        }

        let zai_response: ZaiChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLMApi(format!("Failed to parse Z.AI response: {}", e)))?;

        let usage = zai_response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        // An empty choice list is not an error; the caller decides what an empty answer means
        let (content, finish_reason) = match zai_response.choices.into_iter().next() {
            Some(choice) => (
                choice.message.content.unwrap_or_default(),
                choice.finish_reason.unwrap_or_default(),
            ),
            None => (String::new(), String::new()),
        };

        Ok(LLMResponse {
            content,
            finish_reason,
            usage,
        })
    }
}

/// Models offered in the configuration panel.
pub mod models {
    pub const GLM_4_5: &str = "glm-4.5";
    pub const GLM_4_5_AIR: &str = "glm-4.5-air";
    pub const GLM_4_6: &str = "glm-4.6";

    pub const DEFAULT: &str = GLM_4_5;
}
