use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::settings::SettingsStorage;
use crate::store::AppStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub settings: Arc<SettingsStorage>,
    pub store: AppStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let settings = SettingsStorage::with_path(config.storage.settings_dir.clone());
        Self {
            config,
            settings: Arc::new(settings),
            store: AppStore::default(),
        }
    }
}

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    /// Text content, only for text cells. Numbers are never classified.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            // f64's Display already drops the trailing ".0" on whole numbers
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Empty => Ok(()),
        }
    }
}

/// Largest integer an f64 represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Whole numbers go out as JSON integers (`3`, not `3.0`).
impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            Cell::Number(n) => serializer.serialize_f64(*n),
            Cell::Bool(b) => serializer.serialize_bool(*b),
            Cell::Empty => serializer.serialize_unit(),
        }
    }
}

/// Row-major grid of cells; rows may differ in length.
pub type Grid = Vec<Vec<Cell>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub insights: Vec<String>,
    pub summary: String,
    pub provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub names: Vec<String>,
    pub dates: Vec<String>,
    pub times: Vec<String>,
    pub raw_data: Grid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<AiAnalysis>,
}

/// FileData as returned to the browser, with the raw rows cut to a display window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDataView {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub names: Vec<String>,
    pub dates: Vec<String>,
    pub times: Vec<String>,
    pub total_rows: usize,
    pub raw_data: Grid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<AiAnalysis>,
}

impl FileDataView {
    pub fn from_file_data(data: &FileData, max_rows: usize) -> Self {
        Self {
            id: data.id,
            file_name: data.file_name.clone(),
            content_type: data.content_type.clone(),
            uploaded_at: data.uploaded_at,
            names: data.names.clone(),
            dates: data.dates.clone(),
            times: data.times.clone(),
            total_rows: data.raw_data.len(),
            raw_data: data.raw_data.iter().take(max_rows).cloned().collect(),
            ai_analysis: data.ai_analysis.clone(),
        }
    }
}

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeRequest {
    #[validate(required)]
    pub data: Option<Grid>,
    #[validate(length(min = 1))]
    pub provider: String,
    #[validate(length(min = 1))]
    pub api_key: String,
    #[validate(length(min = 1))]
    pub model: String,
    pub base_url: Option<String>,
}

/// Structured answer expected from the AI provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResult {
    pub names: Vec<String>,
    pub dates: Vec<String>,
    pub times: Vec<String>,
    pub insights: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AnalyzeCurrentRequest {
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
}
