//! File-backed job record persistence.

use std::path::PathBuf;
use tracing::{debug, warn};
use uuid::Uuid;

use veo_models::{JobId, JobRecord};

use crate::error::{StoreError, StoreResult};
use crate::layout::StorageLayout;

/// One JSON file per job under `<base>/jobs/`.
///
/// Saves go through a temp file and an atomic rename so a crashed writer
/// never leaves a half-written record behind.
#[derive(Debug, Clone)]
pub struct JobStore {
    dir: PathBuf,
}

impl JobStore {
    pub fn new(layout: &StorageLayout) -> Self {
        Self {
            dir: layout.jobs_dir(),
        }
    }

    /// Persist a record, replacing any previous version.
    pub async fn save(&self, record: &JobRecord) -> StoreResult<()> {
        let path = self.record_path(&record.job_id)?;
        let json = serde_json::to_vec_pretty(record)?;

        let tmp = path.with_extension(format!("tmp.{}", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(job_id = %record.job_id, status = ?record.status, "Saved job record");
        Ok(())
    }

    /// Load a record. Unknown ids return `None`.
    pub async fn load(&self, id: &JobId) -> StoreResult<Option<JobRecord>> {
        let path = self.record_path(id)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Delete a record if present.
    pub async fn delete(&self, id: &JobId) -> StoreResult<bool> {
        let path = self.record_path(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// List all persisted records, skipping unreadable files.
    pub async fn list(&self) -> StoreResult<Vec<JobRecord>> {
        let mut records = Vec::new();

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match tokio::fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice::<JobRecord>(&bytes) {
                    Ok(record) => records.push(record),
                    Err(e) => warn!("Skipping malformed job file {}: {}", path.display(), e),
                },
                Err(e) => warn!("Skipping unreadable job file {}: {}", path.display(), e),
            }
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    fn record_path(&self, id: &JobId) -> StoreResult<PathBuf> {
        let name = sanitize_id(id.as_str())?;
        Ok(self.dir.join(format!("{}.json", name)))
    }
}

/// Reduce a job id to a safe filename component.
///
/// Ids are uuids in practice, but records can be loaded by caller-supplied
/// ids and must never escape the jobs directory.
fn sanitize_id(id: &str) -> StoreResult<String> {
    let cleaned: String = id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if cleaned.is_empty() {
        return Err(StoreError::InvalidJobId(id.to_string()));
    }
    Ok(cleaned)
}
