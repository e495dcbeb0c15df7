use async_trait::async_trait;

use crate::settings::Provider;
use crate::types::{AppResult, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Credentials for a single call, taken from the request or from stored settings.
#[derive(Debug, Clone)]
pub struct LLMProviderConfig {
    pub provider: Provider,
    pub api_key: String,
    pub base_url: Option<String>,
}

pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
    provider: Provider,
}

impl LLM {
    /// Build a client for the provider, or `None` when the provider has no
    /// chat-completion integration yet.
    pub fn for_provider(config: &LLMProviderConfig) -> Option<Self> {
        let adapter: Box<dyn LLMAdapter> = match config.provider {
            Provider::Zai => Box::new(crate::llm::zai::ZaiAdapter::with_base_url(
                &config.api_key,
                config.base_url.as_deref(),
            )),
            Provider::Gemini | Provider::DeepSeek => return None,
        };

        Some(Self {
            adapter,
            provider: config.provider,
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }
}
