//! Secure Settings Storage
//!
//! File-based storage for the provider configuration.
//! API keys are encrypted with AES-256-GCM before they touch the disk.

use super::{ApiConfig, Provider, ProviderConfig};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

const SETTINGS_FILE: &str = "api_config.json";
const ENCRYPTION_KEY_FILE: &str = ".settings_key";
const NONCE_SIZE: usize = 12;

/// Settings storage manager
pub struct SettingsStorage {
    settings_path: PathBuf,
    key_path: PathBuf,
}

impl SettingsStorage {
    pub fn with_path(base_dir: PathBuf) -> Self {
        Self {
            settings_path: base_dir.join(SETTINGS_FILE),
            key_path: base_dir.join(ENCRYPTION_KEY_FILE),
        }
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    async fn ensure_dir(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Get or create the encryption key
    async fn get_or_create_key(&self) -> anyhow::Result<[u8; 32]> {
        self.ensure_dir().await?;

        if fs::try_exists(&self.key_path).await? {
            let key_data = fs::read(&self.key_path).await?;
            let key_bytes = BASE64.decode(&key_data)?;
            if key_bytes.len() == 32 {
                let mut key = [0u8; 32];
                key.copy_from_slice(&key_bytes);
                return Ok(key);
            }
            warn!(path = ?self.key_path, "Settings key has the wrong length, regenerating");
        }

        let key: [u8; 32] = rand::random();
        fs::write(&self.key_path, BASE64.encode(key)).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            fs::set_permissions(&self.key_path, perms).await?;
        }

        info!("Generated new encryption key for settings");
        Ok(key)
    }

    fn encrypt(&self, plaintext: &str, key: &[u8; 32]) -> anyhow::Result<String> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| anyhow::anyhow!("Invalid settings key: {}", e))?;
        let nonce_bytes: [u8; NONCE_SIZE] = rand::random();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| anyhow::anyhow!("Encryption failed: {}", e))?;

        // nonce || ciphertext, base64 encoded
        let mut combined = nonce_bytes.to_vec();
        combined.extend(ciphertext);
        Ok(BASE64.encode(&combined))
    }

    fn decrypt(&self, encrypted: &str, key: &[u8; 32]) -> anyhow::Result<String> {
        let combined = BASE64.decode(encrypted)?;
        if combined.len() < NONCE_SIZE {
            return Err(anyhow::anyhow!("Invalid encrypted data"));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| anyhow::anyhow!("Invalid settings key: {}", e))?;
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| anyhow::anyhow!("Decryption failed: {}", e))?;

        String::from_utf8(plaintext).map_err(Into::into)
    }

    /// Load the configuration, falling back to defaults when nothing was saved.
    pub async fn load(&self) -> anyhow::Result<ApiConfig> {
        if !fs::try_exists(&self.settings_path).await? {
            info!("No settings file found, using defaults");
            return Ok(ApiConfig::default());
        }

        let key = self.get_or_create_key().await?;
        let content = fs::read_to_string(&self.settings_path).await?;
        let mut config: ApiConfig = serde_json::from_str(&content)?;

        for provider in Provider::ALL {
            self.decrypt_provider_key(provider, config.get_mut(provider), &key);
        }

        info!("Loaded settings from {:?}", self.settings_path);
        Ok(config)
    }

    /// Overwrite the stored configuration.
    pub async fn save(&self, config: &ApiConfig) -> anyhow::Result<()> {
        let key = self.get_or_create_key().await?;

        let mut encrypted = config.clone();
        for provider in Provider::ALL {
            self.encrypt_provider_key(encrypted.get_mut(provider), &key)?;
        }

        let content = serde_json::to_string_pretty(&encrypted)?;
        fs::write(&self.settings_path, content).await?;

        info!("Saved settings to {:?}", self.settings_path);
        Ok(())
    }

    fn encrypt_provider_key(&self, config: &mut ProviderConfig, key: &[u8; 32]) -> anyhow::Result<()> {
        if !config.api_key.is_empty() {
            config.api_key = self.encrypt(&config.api_key, key)?;
        }
        Ok(())
    }

    fn decrypt_provider_key(&self, provider: Provider, config: &mut ProviderConfig, key: &[u8; 32]) {
        if config.api_key.is_empty() {
            return;
        }
        match self.decrypt(&config.api_key, key) {
            Ok(decrypted) => config.api_key = decrypted,
            Err(e) => {
                warn!(%provider, "Failed to decrypt API key, it may be corrupted: {}", e);
                config.api_key.clear();
            }
        }
    }

    /// Configuration for a single provider
    pub async fn provider_config(&self, provider: Provider) -> anyhow::Result<ProviderConfig> {
        let config = self.load().await?;
        Ok(config.get(provider).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_loads_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SettingsStorage::with_path(temp_dir.path().to_path_buf());

        assert_eq!(storage.load().await.unwrap(), ApiConfig::default());
    }

    #[tokio::test]
    async fn test_settings_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SettingsStorage::with_path(temp_dir.path().join("nested"));

        let mut config = ApiConfig::default();
        config.zai.enabled = true;
        config.zai.api_key = "zai-test-key-12345".to_string();
        config.zai.base_url = "https://example.test/v4".to_string();
        config.gemini.api_key = "gm-key-67890".to_string();

        storage.save(&config).await.unwrap();
        let loaded = storage.load().await.unwrap();

        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_keys_are_not_stored_in_plain_text() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SettingsStorage::with_path(temp_dir.path().to_path_buf());

        let mut config = ApiConfig::default();
        config.deepseek.api_key = "sk-plaintext-secret".to_string();
        storage.save(&config).await.unwrap();

        let raw = std::fs::read_to_string(storage.settings_path()).unwrap();
        assert!(!raw.contains("sk-plaintext-secret"));
        assert!(raw.contains("deepseek-chat"));
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SettingsStorage::with_path(temp_dir.path().to_path_buf());

        let mut config = ApiConfig::default();
        config.zai.api_key = "first".to_string();
        storage.save(&config).await.unwrap();

        config.zai.api_key.clear();
        config.zai.model = "glm-4.6".to_string();
        storage.save(&config).await.unwrap();

        let zai = storage.provider_config(Provider::Zai).await.unwrap();
        assert!(zai.api_key.is_empty());
        assert_eq!(zai.model, "glm-4.6");
    }

    #[tokio::test]
    async fn test_encryption() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SettingsStorage::with_path(temp_dir.path().to_path_buf());

        let key = storage.get_or_create_key().await.unwrap();
        let plaintext = "secret-api-key-12345";

        let encrypted = storage.encrypt(plaintext, &key).unwrap();
        assert_ne!(encrypted, plaintext);

        let decrypted = storage.decrypt(&encrypted, &key).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[tokio::test]
    async fn test_corrupted_key_loads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SettingsStorage::with_path(temp_dir.path().to_path_buf());
        storage.get_or_create_key().await.unwrap();

        std::fs::write(
            storage.settings_path(),
            r#"{"zai": {"enabled": true, "apiKey": "bm90LWVuY3J5cHRlZA==", "model": "glm-4.5", "baseUrl": ""}}"#,
        )
        .unwrap();

        let loaded = storage.load().await.unwrap();
        assert!(loaded.zai.enabled);
        assert!(loaded.zai.api_key.is_empty());
    }
}
