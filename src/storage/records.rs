//! Upload and Analysis Record Store
//!
//! CRUD over the `uploads` and `analyses` tables. Timestamps are stored as
//! RFC 3339 text and payloads as serialized JSON; status strings are the
//! SCREAMING_SNAKE_CASE forms of [`RunStatus`]. A status column that fails to
//! parse is a storage error, not a silent default.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

use crate::storage::database::Database;
use crate::types::{
    AnalysisPayload, AnalysisRecord, InsightError, Result, ResultExt, RunStatus, UploadRecord,
};

/// Analysis joined with the originating upload's display name, for recent
/// history listings.
#[derive(Debug, Clone)]
pub struct CompletedAnalysis {
    pub analysis: AnalysisRecord,
    pub original_name: String,
}

fn parse_status(raw: &str) -> Result<RunStatus> {
    RunStatus::parse(raw)
        .ok_or_else(|| InsightError::storage(format!("unknown status in database: {raw}")))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| InsightError::storage(format!("bad timestamp in database: {e}")))
}

type UploadRow = (
    String,
    String,
    String,
    i64,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<i64>,
    Option<i64>,
);

fn upload_from_row(row: UploadRow) -> Result<UploadRecord> {
    let (id, original_name, mime_type, size, blob_path, status, uploaded, processed, metadata, rows, cols) =
        row;
    Ok(UploadRecord {
        id,
        original_name,
        mime_type,
        size: size.max(0) as u64,
        blob_path,
        status: parse_status(&status)?,
        uploaded_at: parse_timestamp(&uploaded)?,
        processed_at: processed.as_deref().map(parse_timestamp).transpose()?,
        metadata: metadata
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?,
        row_count: rows.map(|n| n.max(0) as usize),
        column_count: cols.map(|n| n.max(0) as usize),
    })
}

type AnalysisRow = (String, String, String, Option<String>, String, Option<String>);

fn analysis_from_row(row: AnalysisRow) -> Result<AnalysisRecord> {
    let (id, upload_id, status, payload, created, completed) = row;
    Ok(AnalysisRecord {
        id,
        upload_id,
        status: parse_status(&status)?,
        payload: payload.as_deref().map(serde_json::from_str).transpose()?,
        created_at: parse_timestamp(&created)?,
        completed_at: completed.as_deref().map(parse_timestamp).transpose()?,
    })
}

impl Database {
    /// Create an upload record in Pending state and return it.
    pub fn create_upload(
        &self,
        original_name: &str,
        mime_type: &str,
        size: u64,
        blob_path: &str,
    ) -> Result<UploadRecord> {
        let record = UploadRecord {
            id: Uuid::new_v4().to_string(),
            original_name: original_name.to_string(),
            mime_type: mime_type.to_string(),
            size,
            blob_path: blob_path.to_string(),
            status: RunStatus::Pending,
            uploaded_at: Utc::now(),
            processed_at: None,
            metadata: None,
            row_count: None,
            column_count: None,
        };
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO uploads (id, original_name, mime_type, size, blob_path, status, uploaded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                record.original_name,
                record.mime_type,
                record.size as i64,
                record.blob_path,
                record.status.as_str(),
                record.uploaded_at.to_rfc3339(),
            ],
        )
        .with_context("Failed to insert upload")?;
        Ok(record)
    }

    pub fn get_upload(&self, id: &str) -> Result<UploadRecord> {
        let conn = self.conn()?;
        let row: Option<UploadRow> = conn
            .query_row(
                "SELECT id, original_name, mime_type, size, blob_path, status, uploaded_at,
                        processed_at, metadata, row_count, column_count
                 FROM uploads WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                        row.get(7)?,
                        row.get(8)?,
                        row.get(9)?,
                        row.get(10)?,
                    ))
                },
            )
            .optional()?;
        match row {
            Some(row) => upload_from_row(row),
            None => Err(InsightError::RecordNotFound {
                kind: "upload",
                id: id.to_string(),
            }),
        }
    }

    pub fn update_upload_status(&self, id: &str, status: RunStatus) -> Result<()> {
        let conn = self.conn()?;
        let processed_at = status.is_terminal().then(|| Utc::now().to_rfc3339());
        let changed = conn
            .execute(
                "UPDATE uploads SET status = ?1, processed_at = COALESCE(?2, processed_at)
                 WHERE id = ?3",
                params![status.as_str(), processed_at, id],
            )
            .with_context("Failed to update upload status")?;
        if changed == 0 {
            return Err(InsightError::RecordNotFound {
                kind: "upload",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Record the parsed shape and any extracted metadata on an upload.
    pub fn set_upload_shape(
        &self,
        id: &str,
        row_count: usize,
        column_count: usize,
        metadata: Option<&serde_json::Value>,
    ) -> Result<()> {
        let conn = self.conn()?;
        let metadata_json = metadata.map(serde_json::to_string).transpose()?;
        conn.execute(
            "UPDATE uploads SET row_count = ?1, column_count = ?2,
                    metadata = COALESCE(?3, metadata)
             WHERE id = ?4",
            params![row_count as i64, column_count as i64, metadata_json, id],
        )
        .with_context("Failed to record upload shape")?;
        Ok(())
    }

    /// Create an analysis run in Pending state for an upload.
    pub fn create_analysis(&self, upload_id: &str) -> Result<AnalysisRecord> {
        let record = AnalysisRecord {
            id: Uuid::new_v4().to_string(),
            upload_id: upload_id.to_string(),
            status: RunStatus::Pending,
            payload: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO analyses (id, upload_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.id,
                record.upload_id,
                record.status.as_str(),
                record.created_at.to_rfc3339(),
            ],
        )
        .with_context("Failed to insert analysis")?;
        Ok(record)
    }

    pub fn get_analysis(&self, id: &str) -> Result<AnalysisRecord> {
        let conn = self.conn()?;
        let row: Option<AnalysisRow> = conn
            .query_row(
                "SELECT id, upload_id, status, payload, created_at, completed_at
                 FROM analyses WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .optional()?;
        match row {
            Some(row) => analysis_from_row(row),
            None => Err(InsightError::RecordNotFound {
                kind: "analysis",
                id: id.to_string(),
            }),
        }
    }

    pub fn update_analysis_status(&self, id: &str, status: RunStatus) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE analyses SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id],
            )
            .with_context("Failed to update analysis status")?;
        if changed == 0 {
            return Err(InsightError::RecordNotFound {
                kind: "analysis",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Persist the payload and mark the run Completed in one statement.
    pub fn complete_analysis(&self, id: &str, payload: &AnalysisPayload) -> Result<()> {
        let conn = self.conn()?;
        let payload_json = serde_json::to_string(payload)?;
        let changed = conn
            .execute(
                "UPDATE analyses SET status = ?1, payload = ?2, completed_at = ?3 WHERE id = ?4",
                params![
                    RunStatus::Completed.as_str(),
                    payload_json,
                    Utc::now().to_rfc3339(),
                    id,
                ],
            )
            .with_context("Failed to complete analysis")?;
        if changed == 0 {
            return Err(InsightError::RecordNotFound {
                kind: "analysis",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    pub fn fail_analysis(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE analyses SET status = ?1, completed_at = ?2 WHERE id = ?3",
            params![RunStatus::Failed.as_str(), Utc::now().to_rfc3339(), id],
        )
        .with_context("Failed to mark analysis failed")?;
        Ok(())
    }

    /// Most recent completed analyses with their upload names, newest first.
    /// Feeds the chat context builder.
    pub fn recent_completed_analyses(&self, limit: usize) -> Result<Vec<CompletedAnalysis>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT a.id, a.upload_id, a.status, a.payload, a.created_at, a.completed_at,
                    u.original_name
             FROM analyses a JOIN uploads u ON u.id = a.upload_id
             WHERE a.status = ?1
             ORDER BY a.created_at DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(
            params![RunStatus::Completed.as_str(), limit as i64],
            |row| {
                Ok((
                    (
                        row.get::<_, String>(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ),
                    row.get::<_, String>(6)?,
                ))
            },
        )?;

        let mut out = Vec::new();
        for row in rows {
            let (analysis_row, original_name) = row?;
            out.push(CompletedAnalysis {
                analysis: analysis_from_row(analysis_row)?,
                original_name,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sample_payload() -> AnalysisPayload {
        let mut rng = StdRng::seed_from_u64(2);
        profile::analyze(&[], "sample.csv", 512, &mut rng)
    }

    #[test]
    fn test_upload_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let created = db
            .create_upload("sales.csv", "text/csv", 1234, "blobs/abc.csv")
            .unwrap();
        let fetched = db.get_upload(&created.id).unwrap();
        assert_eq!(fetched.original_name, "sales.csv");
        assert_eq!(fetched.size, 1234);
        assert_eq!(fetched.status, RunStatus::Pending);
        assert!(fetched.processed_at.is_none());
    }

    #[test]
    fn test_missing_records_are_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.get_upload("nope"),
            Err(InsightError::RecordNotFound { kind: "upload", .. })
        ));
        assert!(matches!(
            db.get_analysis("nope"),
            Err(InsightError::RecordNotFound { kind: "analysis", .. })
        ));
    }

    #[test]
    fn test_terminal_upload_status_sets_processed_at() {
        let db = Database::open_in_memory().unwrap();
        let upload = db.create_upload("a.csv", "text/csv", 1, "b").unwrap();
        db.update_upload_status(&upload.id, RunStatus::Completed)
            .unwrap();
        let fetched = db.get_upload(&upload.id).unwrap();
        assert_eq!(fetched.status, RunStatus::Completed);
        assert!(fetched.processed_at.is_some());
    }

    #[test]
    fn test_analysis_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let upload = db.create_upload("a.csv", "text/csv", 1, "b").unwrap();
        let analysis = db.create_analysis(&upload.id).unwrap();

        db.update_analysis_status(&analysis.id, RunStatus::Processing)
            .unwrap();
        let payload = sample_payload();
        db.complete_analysis(&analysis.id, &payload).unwrap();

        let fetched = db.get_analysis(&analysis.id).unwrap();
        assert_eq!(fetched.status, RunStatus::Completed);
        assert!(fetched.completed_at.is_some());
        let stored = fetched.payload.unwrap();
        assert_eq!(stored.trends.len(), 12);
    }

    #[test]
    fn test_recent_completed_ordering_and_limit() {
        let db = Database::open_in_memory().unwrap();
        let payload = sample_payload();
        for name in ["one.csv", "two.csv", "three.csv"] {
            let upload = db.create_upload(name, "text/csv", 1, "b").unwrap();
            let analysis = db.create_analysis(&upload.id).unwrap();
            db.complete_analysis(&analysis.id, &payload).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        // a pending run must not appear
        let upload = db.create_upload("pending.csv", "text/csv", 1, "b").unwrap();
        db.create_analysis(&upload.id).unwrap();

        let recent = db.recent_completed_analyses(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].original_name, "three.csv");
        assert_eq!(recent[1].original_name, "two.csv");
    }

    #[test]
    fn test_upload_shape_recorded() {
        let db = Database::open_in_memory().unwrap();
        let upload = db.create_upload("a.csv", "text/csv", 1, "b").unwrap();
        let meta = serde_json::json!({"delimiter": ","});
        db.set_upload_shape(&upload.id, 120, 7, Some(&meta)).unwrap();
        let fetched = db.get_upload(&upload.id).unwrap();
        assert_eq!(fetched.row_count, Some(120));
        assert_eq!(fetched.column_count, Some(7));
        assert_eq!(fetched.metadata, Some(meta));
    }
}
