use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;

use board_core::{io, paths};

use crate::error::StoreError;
use crate::store::{self, EntityStore, Record, SortKey};

// ─── FileEntityStore ──────────────────────────────────────────────────────

/// An [`EntityStore`] backed by one YAML file per entity under `dir`.
///
/// Writes go through [`io::atomic_write`], and a single async lock
/// serializes read-modify-write cycles so concurrent updates from the
/// reconciler cannot clobber each other.
pub struct FileEntityStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl FileEntityStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, entity: &str) -> Result<PathBuf, StoreError> {
        paths::validate_entity_name(entity).map_err(|e| StoreError::Rejected {
            status: 400,
            message: e.to_string(),
        })?;
        Ok(paths::entity_file(&self.dir, entity))
    }
}

fn read_records(path: &Path) -> Result<Vec<Record>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = std::fs::read_to_string(path).map_err(|e| StoreError::Storage(e.to_string()))?;
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(&data).map_err(|e| StoreError::Decode(e.to_string()))
}

fn write_records(path: &Path, records: &[Record]) -> Result<(), StoreError> {
    let data = serde_yaml::to_string(records).map_err(|e| StoreError::Storage(e.to_string()))?;
    io::atomic_write(path, data.as_bytes()).map_err(|e| StoreError::Storage(e.to_string()))
}

/// Run blocking file work off the async executor.
async fn blocking<T, F>(f: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Storage(format!("task join error: {e}")))?
}

#[async_trait]
impl EntityStore for FileEntityStore {
    async fn list(&self, entity: &str, sort: Option<&SortKey>) -> Result<Vec<Record>, StoreError> {
        let path = self.path(entity)?;
        let _guard = self.lock.lock().await;
        let mut records = blocking(move || read_records(&path)).await?;
        if let Some(sort) = sort {
            store::sort_records(&mut records, sort);
        }
        Ok(records)
    }

    async fn filter(&self, entity: &str, criteria: &Record) -> Result<Vec<Record>, StoreError> {
        let path = self.path(entity)?;
        let _guard = self.lock.lock().await;
        let records = blocking(move || read_records(&path)).await?;
        Ok(records
            .into_iter()
            .filter(|r| store::matches(r, criteria))
            .collect())
    }

    async fn create(&self, entity: &str, fields: Record) -> Result<Record, StoreError> {
        let path = self.path(entity)?;
        let _guard = self.lock.lock().await;
        blocking(move || {
            let mut records = read_records(&path)?;
            let mut record = fields;
            record.insert(
                "id".into(),
                Value::String(uuid::Uuid::new_v4().simple().to_string()),
            );
            record
                .entry("created_date")
                .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
            records.push(record.clone());
            write_records(&path, &records)?;
            Ok(record)
        })
        .await
    }

    async fn update(&self, entity: &str, id: &str, patch: Record) -> Result<Record, StoreError> {
        let path = self.path(entity)?;
        let (entity, id) = (entity.to_string(), id.to_string());
        let _guard = self.lock.lock().await;
        blocking(move || {
            let mut records = read_records(&path)?;
            let record = records
                .iter_mut()
                .find(|r| store::record_id(r) == Some(id.as_str()))
                .ok_or_else(|| StoreError::NotFound {
                    entity: entity.clone(),
                    id: id.clone(),
                })?;
            store::merge(record, patch);
            let updated = record.clone();
            write_records(&path, &records)?;
            Ok(updated)
        })
        .await
    }

    async fn delete(&self, entity: &str, id: &str) -> Result<(), StoreError> {
        let path = self.path(entity)?;
        let (entity, id) = (entity.to_string(), id.to_string());
        let _guard = self.lock.lock().await;
        blocking(move || {
            let mut records = read_records(&path)?;
            let before = records.len();
            records.retain(|r| store::record_id(r) != Some(id.as_str()));
            if records.len() == before {
                return Err(StoreError::NotFound { entity, id });
            }
            write_records(&path, &records)
        })
        .await
    }
}
