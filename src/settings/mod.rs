//! Settings Module
//!
//! Per-provider AI configuration (`enabled`, `apiKey`, `model`, `baseUrl`),
//! persisted as one JSON object keyed by provider name.
//! API keys are encrypted at rest using AES-256-GCM.

pub mod routes;
pub mod storage;

pub use routes::router;
pub use storage::*;

use serde::{Deserialize, Serialize};

/// Supported AI providers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    DeepSeek,
    #[default]
    Zai,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Gemini, Provider::DeepSeek, Provider::Zai];

    pub fn id(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::DeepSeek => "deepseek",
            Provider::Zai => "zai",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "gemini" => Some(Provider::Gemini),
            "deepseek" => Some(Provider::DeepSeek),
            "zai" => Some(Provider::Zai),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Gemini => "Google Gemini",
            Provider::DeepSeek => "DeepSeek",
            Provider::Zai => "Z.AI",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-pro",
            Provider::DeepSeek => "deepseek-chat",
            Provider::Zai => crate::llm::zai::models::DEFAULT,
        }
    }

    /// Endpoint used when the configuration leaves `baseUrl` empty.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Provider::DeepSeek => "https://api.deepseek.com/v1",
            Provider::Zai => crate::llm::zai::ZAI_API_BASE,
        }
    }
}

/// Configuration for a single provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    pub enabled: bool,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl ProviderConfig {
    pub fn defaults_for(provider: Provider) -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            model: provider.default_model().to_string(),
            base_url: String::new(),
        }
    }

    /// Enabled and holding a key: the precondition for any AI call.
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.api_key.trim().is_empty()
    }

    pub fn base_url_override(&self) -> Option<&str> {
        let url = self.base_url.trim();
        (!url.is_empty()).then_some(url)
    }
}

fn default_gemini() -> ProviderConfig {
    ProviderConfig::defaults_for(Provider::Gemini)
}

fn default_deepseek() -> ProviderConfig {
    ProviderConfig::defaults_for(Provider::DeepSeek)
}

fn default_zai() -> ProviderConfig {
    ProviderConfig::defaults_for(Provider::Zai)
}

/// All provider configurations. A provider absent from the stored file
/// keeps its default record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_gemini")]
    pub gemini: ProviderConfig,
    #[serde(default = "default_deepseek")]
    pub deepseek: ProviderConfig,
    #[serde(default = "default_zai")]
    pub zai: ProviderConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            gemini: default_gemini(),
            deepseek: default_deepseek(),
            zai: default_zai(),
        }
    }
}

impl ApiConfig {
    pub fn get(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::Gemini => &self.gemini,
            Provider::DeepSeek => &self.deepseek,
            Provider::Zai => &self.zai,
        }
    }

    pub fn get_mut(&mut self, provider: Provider) -> &mut ProviderConfig {
        match provider {
            Provider::Gemini => &mut self.gemini,
            Provider::DeepSeek => &mut self.deepseek,
            Provider::Zai => &mut self.zai,
        }
    }

    pub fn apply_update(&mut self, provider: Provider, update: ProviderConfigUpdate) {
        let config = self.get_mut(provider);
        if let Some(enabled) = update.enabled {
            config.enabled = enabled;
        }
        if let Some(api_key) = update.api_key {
            config.api_key = api_key;
        }
        if let Some(model) = update.model {
            config.model = model;
        }
        if let Some(base_url) = update.base_url {
            config.base_url = base_url;
        }
    }
}

/// Partial update for one provider
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigUpdate {
    pub enabled: Option<bool>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// Settings response for the frontend (masks API keys)
#[derive(Debug, Clone, Serialize)]
pub struct SettingsResponse {
    pub gemini: ProviderStatus,
    pub deepseek: ProviderStatus,
    pub zai: ProviderStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub enabled: bool,
    pub has_key: bool,
    /// Last four characters of the key only
    pub key_hint: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl From<&ProviderConfig> for ProviderStatus {
    fn from(config: &ProviderConfig) -> Self {
        let key = config.api_key.as_str();
        let key_hint = match key.chars().count() {
            0 => None,
            n if n > 4 => {
                let tail: String = key.chars().skip(n - 4).collect();
                Some(format!("••••{}", tail))
            }
            _ => Some("••••".to_string()),
        };

        Self {
            enabled: config.enabled,
            has_key: key_hint.is_some(),
            key_hint,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
        }
    }
}

impl From<&ApiConfig> for SettingsResponse {
    fn from(config: &ApiConfig) -> Self {
        Self {
            gemini: ProviderStatus::from(&config.gemini),
            deepseek: ProviderStatus::from(&config.deepseek),
            zai: ProviderStatus::from(&config.zai),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_ids() {
        for provider in Provider::ALL {
            assert_eq!(Provider::from_id(provider.id()), Some(provider));
        }
        assert_eq!(Provider::from_id("ZAI"), Some(Provider::Zai));
        assert_eq!(Provider::from_id("openai"), None);
        assert_eq!(Provider::default(), Provider::Zai);
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.gemini.model, "gemini-pro");
        assert_eq!(config.deepseek.model, "deepseek-chat");
        assert_eq!(config.zai.model, "glm-4.5");
        assert!(Provider::ALL.iter().all(|p| !config.get(*p).enabled));
    }

    #[test]
    fn test_partial_document_merges_over_defaults() {
        let config: ApiConfig = serde_json::from_str(
            r#"{"zai": {"enabled": true, "apiKey": "abc", "model": "glm-4.6", "baseUrl": ""}}"#,
        )
        .unwrap();

        assert!(config.zai.is_usable());
        assert_eq!(config.zai.model, "glm-4.6");
        assert_eq!(config.gemini, ProviderConfig::defaults_for(Provider::Gemini));
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = serde_json::to_value(ApiConfig::default()).unwrap();
        assert!(json["zai"].get("apiKey").is_some());
        assert!(json["zai"].get("baseUrl").is_some());
    }

    #[test]
    fn test_apply_update() {
        let mut config = ApiConfig::default();
        config.apply_update(
            Provider::DeepSeek,
            ProviderConfigUpdate {
                enabled: Some(true),
                api_key: Some("sk-1234567".to_string()),
                ..Default::default()
            },
        );
        assert!(config.deepseek.is_usable());
        assert_eq!(config.deepseek.model, "deepseek-chat");
    }

    #[test]
    fn test_usable_requires_enabled_and_key() {
        let mut config = ProviderConfig::defaults_for(Provider::Zai);
        config.api_key = "key".into();
        assert!(!config.is_usable());
        config.enabled = true;
        assert!(config.is_usable());
        config.api_key = "   ".into();
        assert!(!config.is_usable());
    }

    #[test]
    fn test_masked_status() {
        let mut config = ProviderConfig::defaults_for(Provider::Zai);
        assert_eq!(ProviderStatus::from(&config).key_hint, None);

        config.api_key = "sk-abcdef1234".into();
        let status = ProviderStatus::from(&config);
        assert!(status.has_key);
        assert_eq!(status.key_hint.as_deref(), Some("••••1234"));

        config.api_key = "abc".into();
        assert_eq!(ProviderStatus::from(&config).key_hint.as_deref(), Some("••••"));
    }
}
