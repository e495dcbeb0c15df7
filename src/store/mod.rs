//! In-memory workspace state shared by the HTTP handlers.
//!
//! Holds the current file, the processing status and the provider picked for
//! AI analysis. Every update replaces whole values; nothing is persisted.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::ingest::build_file_data;
use crate::models::{AiAnalysis, FileData, Grid};
use crate::settings::Provider;
use crate::types::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    #[default]
    Idle,
    Processing,
    Success,
    Error,
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    file_data: Option<FileData>,
    current_raw_data: Grid,
    is_processing: bool,
    is_analyzing: bool,
    progress: u8,
    status: ProcessStatus,
    file_name: String,
    error: String,
    selected_provider: Provider,
}

/// Status view returned by `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub status: ProcessStatus,
    pub progress: u8,
    pub file_name: String,
    pub error: String,
    pub is_processing: bool,
    pub is_analyzing: bool,
    pub selected_provider: Provider,
    pub has_data: bool,
}

/// The file an in-flight analysis was started for.
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    pub file_id: Uuid,
    pub file_name: String,
    pub rows: Grid,
}

#[derive(Clone, Default)]
pub struct AppStore {
    inner: Arc<RwLock<StoreState>>,
}

impl AppStore {
    pub async fn snapshot(&self) -> StoreSnapshot {
        let guard = self.inner.read().await;
        StoreSnapshot {
            status: guard.status,
            progress: guard.progress,
            file_name: guard.file_name.clone(),
            error: guard.error.clone(),
            is_processing: guard.is_processing,
            is_analyzing: guard.is_analyzing,
            selected_provider: guard.selected_provider,
            has_data: guard.file_data.is_some(),
        }
    }

    pub async fn file_data(&self) -> Option<FileData> {
        self.inner.read().await.file_data.clone()
    }

    pub async fn selected_provider(&self) -> Provider {
        self.inner.read().await.selected_provider
    }

    pub async fn set_selected_provider(&self, provider: Provider) {
        self.inner.write().await.selected_provider = provider;
    }

    pub async fn begin_processing(&self, file_name: &str) {
        let mut guard = self.inner.write().await;
        guard.is_processing = true;
        guard.progress = 0;
        guard.status = ProcessStatus::Processing;
        guard.file_name = file_name.to_string();
        guard.error.clear();
    }

    pub async fn set_progress(&self, progress: u8) {
        self.inner.write().await.progress = progress.min(100);
    }

    /// Replace the current file wholesale with a freshly parsed one.
    pub async fn complete(&self, file_data: FileData) {
        let mut guard = self.inner.write().await;
        debug!(file_name = %file_data.file_name, "Storing processed file");
        guard.file_name = file_data.file_name.clone();
        guard.current_raw_data = file_data.raw_data.clone();
        guard.file_data = Some(file_data);
        guard.progress = 100;
        guard.status = ProcessStatus::Success;
        guard.is_processing = false;
    }

    pub async fn fail(&self, message: impl Into<String>) {
        let mut guard = self.inner.write().await;
        guard.error = message.into();
        guard.status = ProcessStatus::Error;
        guard.is_processing = false;
    }

    /// Mark an analysis as running and hand back the file it applies to.
    pub async fn begin_analysis(&self) -> AppResult<AnalysisTicket> {
        let mut guard = self.inner.write().await;
        let file_id = match guard.file_data.as_ref() {
            Some(data) if !guard.current_raw_data.is_empty() => data.id,
            _ => {
                let message = "No data to analyze. Please upload a file first.";
                guard.error = message.to_string();
                return Err(AppError::InvalidRequest(message.to_string()));
            }
        };
        guard.is_analyzing = true;
        guard.error.clear();
        Ok(AnalysisTicket {
            file_id,
            file_name: guard.file_name.clone(),
            rows: guard.current_raw_data.clone(),
        })
    }

    /// Rebuild the analysed file from the rows that were sent, with the AI
    /// analysis attached. The result is discarded if another file was
    /// uploaded (or the workspace reset) in the meantime.
    pub async fn finish_analysis(
        &self,
        ticket: AnalysisTicket,
        analysis: AiAnalysis,
    ) -> AppResult<FileData> {
        let mut guard = self.inner.write().await;
        guard.is_analyzing = false;

        let uploaded_at = match guard.file_data.as_ref() {
            Some(current) if current.id == ticket.file_id => current.uploaded_at,
            _ => {
                warn!(file_name = %ticket.file_name, "File replaced during analysis, discarding result");
                let err = AppError::Conflict(
                    "The file changed while it was being analyzed. Please run the analysis again."
                        .to_string(),
                );
                guard.error = err.to_string();
                return Err(err);
            }
        };

        let mut file_data = build_file_data(&ticket.file_name, ticket.rows);
        file_data.id = ticket.file_id;
        file_data.uploaded_at = uploaded_at;
        file_data.ai_analysis = Some(analysis);
        guard.file_data = Some(file_data.clone());
        Ok(file_data)
    }

    pub async fn fail_analysis(&self, message: impl Into<String>) {
        let mut guard = self.inner.write().await;
        guard.error = message.into();
        guard.is_analyzing = false;
    }

    /// Back to the idle state. The provider choice survives.
    pub async fn reset(&self) {
        let mut guard = self.inner.write().await;
        let selected_provider = guard.selected_provider;
        *guard = StoreState {
            selected_provider,
            ..StoreState::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::process_file;

    fn analysis() -> AiAnalysis {
        AiAnalysis {
            insights: vec!["Two people".to_string()],
            summary: "Small roster".to_string(),
            provider: "zai".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upload_lifecycle() {
        let store = AppStore::default();
        assert_eq!(store.snapshot().await.status, ProcessStatus::Idle);

        store.begin_processing("people.csv").await;
        store.set_progress(60).await;
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.status, ProcessStatus::Processing);
        assert_eq!(snapshot.progress, 60);
        assert!(snapshot.is_processing);

        store
            .complete(process_file("people.csv", b"Maria Lopez,09:30\n").unwrap())
            .await;
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.status, ProcessStatus::Success);
        assert_eq!(snapshot.progress, 100);
        assert!(!snapshot.is_processing);
        assert!(snapshot.has_data);
    }

    #[tokio::test]
    async fn test_reupload_replaces_derived_state() {
        let store = AppStore::default();
        store
            .complete(process_file("a.csv", b"Maria Lopez,2024-01-01\n").unwrap())
            .await;
        let ticket = store.begin_analysis().await.unwrap();
        store.finish_analysis(ticket, analysis()).await.unwrap();
        assert!(store.file_data().await.unwrap().ai_analysis.is_some());

        store
            .complete(process_file("b.csv", b"Juan Perez,11:00\n").unwrap())
            .await;
        let data = store.file_data().await.unwrap();

        assert_eq!(data.file_name, "b.csv");
        assert_eq!(data.names, vec!["Juan Perez"]);
        assert!(data.dates.is_empty());
        assert_eq!(data.times, vec!["11:00"]);
        assert!(data.ai_analysis.is_none());
    }

    #[tokio::test]
    async fn test_analysis_requires_data() {
        let store = AppStore::default();
        let err = store.begin_analysis().await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert_eq!(
            store.snapshot().await.error,
            "No data to analyze. Please upload a file first."
        );
    }

    #[tokio::test]
    async fn test_finish_analysis_rederives_fields() {
        let store = AppStore::default();
        store.begin_processing("a.csv").await;
        store
            .complete(process_file("a.csv", b"Ana Ruiz,3/4/2024\n").unwrap())
            .await;

        let uploaded = store.file_data().await.unwrap();
        let ticket = store.begin_analysis().await.unwrap();
        assert_eq!(ticket.file_name, "a.csv");
        assert_eq!(ticket.file_id, uploaded.id);
        assert_eq!(ticket.rows.len(), 1);
        assert!(store.snapshot().await.is_analyzing);

        let data = store.finish_analysis(ticket, analysis()).await.unwrap();
        assert_eq!(data.id, uploaded.id);
        assert_eq!(data.uploaded_at, uploaded.uploaded_at);
        assert_eq!(data.names, vec!["Ana Ruiz"]);
        assert_eq!(data.dates, vec!["3/4/2024"]);
        assert_eq!(data.ai_analysis, Some(analysis()));
        assert!(!store.snapshot().await.is_analyzing);
    }

    #[tokio::test]
    async fn test_analysis_of_replaced_file_is_discarded() {
        let store = AppStore::default();
        store
            .complete(process_file("a.csv", b"Maria Lopez,2024-01-01\n").unwrap())
            .await;
        let ticket = store.begin_analysis().await.unwrap();

        store
            .complete(process_file("b.csv", b"Juan Perez,11:00\n").unwrap())
            .await;
        let err = store.finish_analysis(ticket, analysis()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let data = store.file_data().await.unwrap();
        assert_eq!(data.file_name, "b.csv");
        assert_eq!(data.names, vec!["Juan Perez"]);
        assert!(data.ai_analysis.is_none());
        let snapshot = store.snapshot().await;
        assert!(!snapshot.is_analyzing);
        assert!(!snapshot.error.is_empty());
    }

    #[tokio::test]
    async fn test_analysis_after_reset_is_discarded() {
        let store = AppStore::default();
        store
            .complete(process_file("a.csv", b"Maria Lopez\n").unwrap())
            .await;
        let ticket = store.begin_analysis().await.unwrap();
        store.reset().await;

        assert!(store.finish_analysis(ticket, analysis()).await.is_err());
        assert!(store.file_data().await.is_none());
    }

    #[tokio::test]
    async fn test_failure_and_reset() {
        let store = AppStore::default();
        store.set_selected_provider(Provider::Gemini).await;
        store.begin_processing("x.txt").await;
        store.fail("Unsupported file format. Please use XLSX or CSV.").await;

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.status, ProcessStatus::Error);
        assert!(!snapshot.is_processing);

        store.reset().await;
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.status, ProcessStatus::Idle);
        assert!(snapshot.error.is_empty());
        assert!(snapshot.file_name.is_empty());
        assert_eq!(snapshot.selected_provider, Provider::Gemini);
    }
}
