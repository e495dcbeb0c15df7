use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the persisted provider configuration and its key
    pub settings_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub max_upload_bytes: usize,
    /// Raw rows returned by the data view unless the caller asks otherwise
    pub display_rows: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            server: ServerConfig {
                port: var("PORT", "3000")
                    .parse()
                    .context("PORT must be a valid port number")?,
                host: var("HOST", "0.0.0.0"),
                cors_allowed_origins: var(
                    "ALLOWED_ORIGINS",
                    "http://localhost:3000,http://localhost:5173",
                )
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            },
            storage: StorageConfig {
                settings_dir: lookup("SETTINGS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_settings_dir),
            },
            upload: UploadConfig {
                max_upload_bytes: var("MAX_UPLOAD_BYTES", "10485760")
                    .parse()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
                display_rows: var("DISPLAY_ROWS", "100")
                    .parse()
                    .context("DISPLAY_ROWS must be a row count")?,
            },
            logging: LoggingConfig {
                log_dir: lookup("LOG_DIR").filter(|s| !s.is_empty()).map(PathBuf::from),
            },
        })
    }
}

fn default_settings_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sheet-insight")
}
