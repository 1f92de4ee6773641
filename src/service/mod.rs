//! Analysis Service
//!
//! Orchestrates uploads and analysis runs over the storage, ingest, profile,
//! and chat layers. Analysis runs execute on background tasks: starting a run
//! returns immediately with a Pending record that moves to Processing and
//! then to a terminal state, observable by polling. An in-flight registry
//! keyed by upload id prevents concurrent runs over the same upload.
//!
//! Failures inside a run never leave a record stuck in Processing: any error
//! after the status flip marks the run Failed.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use tracing::{error, info, warn};

use crate::ai::{ChatReply, ChatService};
use crate::constants::chat as chat_limits;
use crate::ingest;
use crate::storage::{BlobStore, SharedDatabase};
use crate::types::{
    AnalysisRecord, InsightError, Result, Row, RunStatus, UploadRecord,
};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub struct AnalysisService {
    db: SharedDatabase,
    blobs: Arc<dyn BlobStore>,
    chat: ChatService,
    /// Upload ids with a run currently executing
    in_flight: DashMap<String, String>,
    /// Fixed seed for reproducible trend synthesis, when configured
    seed: Option<u64>,
}

impl AnalysisService {
    pub fn new(
        db: SharedDatabase,
        blobs: Arc<dyn BlobStore>,
        chat: ChatService,
        seed: Option<u64>,
    ) -> Arc<Self> {
        Arc::new(Self {
            db,
            blobs,
            chat,
            in_flight: DashMap::new(),
            seed,
        })
    }

    // =========================================================================
    // Uploads
    // =========================================================================

    /// Store the uploaded bytes and create the upload record. The parsed
    /// shape (row/column counts) is filled in by a background task; callers
    /// get the record back before parsing happens.
    pub async fn upload(
        self: &Arc<Self>,
        original_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadRecord> {
        let blob_path = self.blobs.put(original_name, &bytes).await?;
        let record = self
            .db
            .create_upload(original_name, mime_type, bytes.len() as u64, &blob_path)?;
        info!(upload_id = %record.id, name = original_name, size = bytes.len(), "upload stored");

        let service = Arc::clone(self);
        let upload_id = record.id.clone();
        let name = original_name.to_string();
        tokio::spawn(async move {
            if let Err(e) = service.record_upload_shape(&upload_id, &name, bytes).await {
                warn!(upload_id = %upload_id, error = %e, "failed to record upload shape");
            }
        });

        Ok(record)
    }

    async fn record_upload_shape(&self, upload_id: &str, name: &str, bytes: Vec<u8>) -> Result<()> {
        let rows = parse_rows(&bytes, name);
        let shape = ingest::upload_shape(&rows);
        let metadata = json!({ "parsed": !rows.is_empty() });
        self.db
            .set_upload_shape(upload_id, shape.row_count, shape.column_count, Some(&metadata))
    }

    pub fn get_upload(&self, id: &str) -> Result<UploadRecord> {
        self.db.get_upload(id)
    }

    // =========================================================================
    // Analysis runs
    // =========================================================================

    /// Create a run for an upload and execute it in the background. At most
    /// one run per upload: the registry slot is reserved atomically before
    /// the run record is created, so a concurrent caller sees the slot as
    /// occupied even while the record write is still in progress.
    pub async fn start_analysis(self: &Arc<Self>, upload_id: &str) -> Result<AnalysisRecord> {
        let upload = self.db.get_upload(upload_id)?;

        match self.in_flight.entry(upload.id.clone()) {
            Entry::Occupied(_) => {
                return Err(InsightError::Pipeline(format!(
                    "analysis already running for upload {upload_id}"
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(String::new());
            }
        }

        let record = match self.db.create_analysis(&upload.id) {
            Ok(record) => record,
            Err(e) => {
                self.in_flight.remove(&upload.id);
                return Err(e);
            }
        };
        self.in_flight
            .insert(upload.id.clone(), record.id.clone());

        let service = Arc::clone(self);
        let analysis_id = record.id.clone();
        tokio::spawn(async move {
            service.run_analysis(&analysis_id, &upload).await;
            service.in_flight.remove(&upload.id);
        });

        Ok(record)
    }

    async fn run_analysis(&self, analysis_id: &str, upload: &UploadRecord) {
        if let Err(e) = self.execute_run(analysis_id, upload).await {
            error!(analysis_id, error = %e, "analysis run failed");
            if let Err(e) = self.db.fail_analysis(analysis_id) {
                error!(analysis_id, error = %e, "could not mark analysis failed");
            }
            if let Err(e) = self.db.update_upload_status(&upload.id, RunStatus::Failed) {
                error!(upload_id = %upload.id, error = %e, "could not mark upload failed");
            }
        }
    }

    async fn execute_run(&self, analysis_id: &str, upload: &UploadRecord) -> Result<()> {
        self.db
            .update_analysis_status(analysis_id, RunStatus::Processing)?;
        self.db
            .update_upload_status(&upload.id, RunStatus::Processing)?;

        // Unreadable blobs fall through to the synthetic pipeline path
        // instead of failing the run.
        let bytes = match self.blobs.get(&upload.blob_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(analysis_id, error = %e, "blob unreadable, proceeding without rows");
                Vec::new()
            }
        };

        let filename = upload.original_name.clone();
        let file_size = upload.size;
        let seed = self.seed;
        let payload = tokio::task::spawn_blocking(move || {
            let rows = parse_rows(&bytes, &filename);
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            crate::profile::analyze(&rows, &filename, file_size, &mut rng)
        })
        .await
        .map_err(|e| InsightError::Pipeline(format!("analysis task panicked: {e}")))?;

        self.db.complete_analysis(analysis_id, &payload)?;
        self.db
            .update_upload_status(&upload.id, RunStatus::Completed)?;
        info!(analysis_id, origin = ?payload.origin, "analysis completed");
        Ok(())
    }

    pub fn get_analysis(&self, id: &str) -> Result<AnalysisRecord> {
        self.db.get_analysis(id)
    }

    pub fn analysis_status(&self, id: &str) -> Result<RunStatus> {
        Ok(self.db.get_analysis(id)?.status)
    }

    /// Poll until the run reaches a terminal state or the timeout elapses.
    pub async fn wait_for_analysis(&self, id: &str, timeout: Duration) -> Result<AnalysisRecord> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let record = self.db.get_analysis(id)?;
            if record.status.is_terminal() {
                return Ok(record);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(InsightError::Pipeline(format!(
                    "analysis {id} still {} after {:?}",
                    record.status.as_str(),
                    timeout
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    // =========================================================================
    // Chat
    // =========================================================================

    /// Answer a chat message against the most recent completed analyses.
    pub async fn chat(&self, message: &str) -> Result<ChatReply> {
        let context = self
            .db
            .recent_completed_analyses(chat_limits::MAX_CONTEXT_ANALYSES)?;
        Ok(self.chat.reply(message, &context).await)
    }
}

/// Parse rows, downgrading ingest errors to an empty row set. The pipeline's
/// synthetic fallback handles the rest.
fn parse_rows(bytes: &[u8], filename: &str) -> Vec<Row> {
    match ingest::rows_from_bytes(bytes, filename) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(filename, error = %e, "ingest failed, proceeding without rows");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Database, FsBlobStore};
    use crate::types::DataOrigin;

    fn service(dir: &std::path::Path) -> Arc<AnalysisService> {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(dir));
        AnalysisService::new(db, blobs, ChatService::new(None), Some(7))
    }

    fn churn_csv() -> Vec<u8> {
        let mut csv = String::from("Churn,MonthlyCharges,tenure\n");
        for i in 0..40 {
            let churn = if i % 4 == 0 { "Yes" } else { "No" };
            csv.push_str(&format!("{churn},{},{}\n", 50 + i, 1 + i));
        }
        csv.into_bytes()
    }

    #[tokio::test]
    async fn test_upload_then_analyze_completes() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let upload = service
            .upload("churn_data.csv", "text/csv", churn_csv())
            .await
            .unwrap();
        assert_eq!(upload.status, RunStatus::Pending);

        let run = service.start_analysis(&upload.id).await.unwrap();
        let finished = service
            .wait_for_analysis(&run.id, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(finished.status, RunStatus::Completed);
        let payload = finished.payload.unwrap();
        assert_eq!(payload.origin, DataOrigin::Observed);
        assert_eq!(payload.summary.statistics.total_records, 40);
        assert_eq!(service.get_upload(&upload.id).unwrap().status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_binary_upload_falls_back_to_synthetic() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let upload = service
            .upload("report.xlsx", "application/vnd.ms-excel", b"\x50\x4b\x03\x04junk".to_vec())
            .await
            .unwrap();
        let run = service.start_analysis(&upload.id).await.unwrap();
        let finished = service
            .wait_for_analysis(&run.id, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(finished.status, RunStatus::Completed);
        assert_eq!(finished.payload.unwrap().origin, DataOrigin::Synthetic);
    }

    #[tokio::test]
    async fn test_unknown_upload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        assert!(matches!(
            service.start_analysis("missing").await,
            Err(InsightError::RecordNotFound { kind: "upload", .. })
        ));
    }

    #[tokio::test]
    async fn test_second_start_rejected_while_slot_reserved() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let upload = service
            .upload("churn_data.csv", "text/csv", churn_csv())
            .await
            .unwrap();

        // A competing call that has reserved the slot but not yet created
        // its run record.
        service
            .in_flight
            .insert(upload.id.clone(), String::new());
        assert!(matches!(
            service.start_analysis(&upload.id).await,
            Err(InsightError::Pipeline(_))
        ));

        // Once the slot is released the upload can be analyzed normally.
        service.in_flight.remove(&upload.id);
        let run = service.start_analysis(&upload.id).await.unwrap();
        let finished = service
            .wait_for_analysis(&run.id, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(finished.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_chat_without_provider_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let reply = service.chat("what's up with my data?").await.unwrap();
        assert!(reply.fallback);
        assert_eq!(reply.suggestions.len(), 3);
    }

    #[tokio::test]
    async fn test_seeded_runs_are_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let mut payloads = Vec::new();
        for _ in 0..2 {
            let upload = service
                .upload("churn_data.csv", "text/csv", churn_csv())
                .await
                .unwrap();
            let run = service.start_analysis(&upload.id).await.unwrap();
            let finished = service
                .wait_for_analysis(&run.id, Duration::from_secs(5))
                .await
                .unwrap();
            payloads.push(finished.payload.unwrap());
        }
        assert_eq!(payloads[0].trends, payloads[1].trends);
    }
}
