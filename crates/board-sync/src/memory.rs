use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::error::StoreError;
use crate::store::{self, EntityStore, Record, SortKey};

// ─── Call log ─────────────────────────────────────────────────────────────

/// One request received by a [`MemoryEntityStore`], failed or not.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List { entity: String },
    Filter { entity: String, criteria: Record },
    Create { entity: String, fields: Record },
    Update { entity: String, id: String, patch: Record },
    Delete { entity: String, id: String },
}

#[derive(Debug, Default)]
struct Faults {
    list: bool,
    create: bool,
    all_updates: bool,
    updates: HashSet<String>,
    all_deletes: bool,
}

#[derive(Debug, Default)]
struct Inner {
    entities: HashMap<String, Vec<Record>>,
    calls: Vec<Call>,
    faults: Faults,
    next_id: u64,
    update_delay: Option<Duration>,
}

// ─── MemoryEntityStore ────────────────────────────────────────────────────

/// An in-process [`EntityStore`] that records every call and can be told
/// to fail specific ones.
#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    inner: Mutex<Inner>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert records as-is, bypassing the call log.
    pub fn seed(&self, entity: &str, records: impl IntoIterator<Item = Record>) {
        let mut inner = self.lock();
        inner
            .entities
            .entry(entity.to_string())
            .or_default()
            .extend(records);
    }

    pub fn records(&self, entity: &str) -> Vec<Record> {
        self.lock().entities.get(entity).cloned().unwrap_or_default()
    }

    pub fn get(&self, entity: &str, id: &str) -> Option<Record> {
        self.lock()
            .entities
            .get(entity)?
            .iter()
            .find(|r| store::record_id(r) == Some(id))
            .cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// `(id, patch)` for every update call, in arrival order.
    pub fn updates(&self) -> Vec<(String, Record)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Update { id, patch, .. } => Some((id.clone(), patch.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn fail_list(&self) {
        self.lock().faults.list = true;
    }

    pub fn fail_creates(&self) {
        self.lock().faults.create = true;
    }

    pub fn fail_update_for(&self, id: &str) {
        self.lock().faults.updates.insert(id.to_string());
    }

    pub fn fail_all_updates(&self) {
        self.lock().faults.all_updates = true;
    }

    pub fn fail_deletes(&self) {
        self.lock().faults.all_deletes = true;
    }

    pub fn clear_faults(&self) {
        self.lock().faults = Faults::default();
    }

    /// Hold every update this long before answering.
    pub fn set_update_delay(&self, delay: Duration) {
        self.lock().update_delay = Some(delay);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panic while holding the lock only happens in a failing test.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn injected(op: &str) -> StoreError {
    StoreError::Rejected {
        status: 500,
        message: format!("injected {op} failure"),
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn list(&self, entity: &str, sort: Option<&SortKey>) -> Result<Vec<Record>, StoreError> {
        let mut inner = self.lock();
        inner.calls.push(Call::List {
            entity: entity.to_string(),
        });
        if inner.faults.list {
            return Err(injected("list"));
        }
        let mut records = inner.entities.get(entity).cloned().unwrap_or_default();
        if let Some(sort) = sort {
            store::sort_records(&mut records, sort);
        }
        Ok(records)
    }

    async fn filter(&self, entity: &str, criteria: &Record) -> Result<Vec<Record>, StoreError> {
        let mut inner = self.lock();
        inner.calls.push(Call::Filter {
            entity: entity.to_string(),
            criteria: criteria.clone(),
        });
        if inner.faults.list {
            return Err(injected("filter"));
        }
        Ok(inner
            .entities
            .get(entity)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| store::matches(r, criteria))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create(&self, entity: &str, fields: Record) -> Result<Record, StoreError> {
        let mut inner = self.lock();
        inner.calls.push(Call::Create {
            entity: entity.to_string(),
            fields: fields.clone(),
        });
        if inner.faults.create {
            return Err(injected("create"));
        }
        inner.next_id += 1;
        let mut record = fields;
        record.insert("id".into(), Value::String(format!("mem-{}", inner.next_id)));
        record
            .entry("created_date")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
        inner
            .entities
            .entry(entity.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(&self, entity: &str, id: &str, patch: Record) -> Result<Record, StoreError> {
        let delay = {
            let mut inner = self.lock();
            inner.calls.push(Call::Update {
                entity: entity.to_string(),
                id: id.to_string(),
                patch: patch.clone(),
            });
            inner.update_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.lock();
        if inner.faults.all_updates || inner.faults.updates.contains(id) {
            return Err(injected("update"));
        }
        let record = inner
            .entities
            .get_mut(entity)
            .and_then(|records| records.iter_mut().find(|r| store::record_id(r) == Some(id)))
            .ok_or_else(|| StoreError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            })?;
        store::merge(record, patch);
        Ok(record.clone())
    }

    async fn delete(&self, entity: &str, id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.calls.push(Call::Delete {
            entity: entity.to_string(),
            id: id.to_string(),
        });
        if inner.faults.all_deletes {
            return Err(injected("delete"));
        }
        let records = inner.entities.get_mut(entity);
        let Some(records) = records else {
            return Err(StoreError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            });
        };
        let before = records.len();
        records.retain(|r| store::record_id(r) != Some(id));
        if records.len() == before {
            return Err(StoreError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn create_assigns_id_and_date() {
        let store = MemoryEntityStore::new();
        let created = store
            .create("Task", rec(json!({"title": "Buy milk"})))
            .await
            .unwrap();
        assert_eq!(created["id"], "mem-1");
        assert!(created.contains_key("created_date"));
        assert_eq!(store.records("Task").len(), 1);
    }

    #[tokio::test]
    async fn update_merges_and_missing_is_not_found() {
        let store = MemoryEntityStore::new();
        store.seed("Task", [rec(json!({"id": "a", "order_position": 3}))]);
        let updated = store
            .update("Task", "a", rec(json!({"order_position": 0})))
            .await
            .unwrap();
        assert_eq!(updated["order_position"], 0);

        let err = store
            .update("Task", "zzz", rec(json!({"order_position": 0})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn injected_failures_are_still_logged() {
        let store = MemoryEntityStore::new();
        store.seed("Task", [rec(json!({"id": "a"}))]);
        store.fail_update_for("a");
        assert!(store.update("Task", "a", Record::new()).await.is_err());
        assert_eq!(store.updates().len(), 1);

        store.clear_faults();
        assert!(store.update("Task", "a", Record::new()).await.is_ok());
    }

    #[tokio::test]
    async fn filter_and_delete() {
        let store = MemoryEntityStore::new();
        store.seed(
            "Task",
            [
                rec(json!({"id": "a", "column": "today"})),
                rec(json!({"id": "b", "column": "done"})),
            ],
        );
        let today = store
            .filter("Task", &rec(json!({"column": "today"})))
            .await
            .unwrap();
        assert_eq!(today.len(), 1);

        store.delete("Task", "a").await.unwrap();
        assert!(store.get("Task", "a").is_none());
        assert!(store.delete("Task", "a").await.is_err());
    }
}
