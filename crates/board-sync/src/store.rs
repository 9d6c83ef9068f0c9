//! The [`EntityStore`] trait every backend implements.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreError;

/// A raw entity record as the store sends it: a flat JSON object.
pub type Record = Map<String, Value>;

// ─── SortKey ──────────────────────────────────────────────────────────────

/// Sort order for [`EntityStore::list`]. `-field` means descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.strip_prefix('-') {
            Some(field) => Self::desc(field),
            None => Self::asc(s),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.field)
        } else {
            f.write_str(&self.field)
        }
    }
}

// ─── EntityStore ──────────────────────────────────────────────────────────

/// The remote CRUD collaborator, addressed per entity type.
///
/// Every call is a fallible round-trip. Implementations must be safe to call
/// concurrently: the reconciler issues many updates at once.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Every record of `entity`, optionally pre-sorted.
    async fn list(&self, entity: &str, sort: Option<&SortKey>) -> Result<Vec<Record>, StoreError>;

    /// Records whose fields exactly match every entry in `criteria`.
    async fn filter(&self, entity: &str, criteria: &Record) -> Result<Vec<Record>, StoreError>;

    /// Persist a new record. The store assigns `id` and `created_date`.
    async fn create(&self, entity: &str, fields: Record) -> Result<Record, StoreError>;

    /// Merge `patch` into the record. A `null` value removes the field.
    async fn update(&self, entity: &str, id: &str, patch: Record) -> Result<Record, StoreError>;

    async fn delete(&self, entity: &str, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: EntityStore + ?Sized> EntityStore for Arc<S> {
    async fn list(&self, entity: &str, sort: Option<&SortKey>) -> Result<Vec<Record>, StoreError> {
        (**self).list(entity, sort).await
    }

    async fn filter(&self, entity: &str, criteria: &Record) -> Result<Vec<Record>, StoreError> {
        (**self).filter(entity, criteria).await
    }

    async fn create(&self, entity: &str, fields: Record) -> Result<Record, StoreError> {
        (**self).create(entity, fields).await
    }

    async fn update(&self, entity: &str, id: &str, patch: Record) -> Result<Record, StoreError> {
        (**self).update(entity, id, patch).await
    }

    async fn delete(&self, entity: &str, id: &str) -> Result<(), StoreError> {
        (**self).delete(entity, id).await
    }
}

// ─── Helpers shared by local stores ───────────────────────────────────────

pub(crate) fn record_id(record: &Record) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

pub(crate) fn matches(record: &Record, criteria: &Record) -> bool {
    criteria
        .iter()
        .all(|(field, expected)| record.get(field) == Some(expected))
}

/// Apply a merge patch in place.
pub(crate) fn merge(record: &mut Record, patch: Record) {
    for (field, value) in patch {
        if value.is_null() {
            record.remove(&field);
        } else {
            record.insert(field, value);
        }
    }
}

pub(crate) fn sort_records(records: &mut [Record], sort: &SortKey) {
    records.sort_by(|a, b| {
        let ord = compare_values(a.get(&sort.field), b.get(&sort.field));
        if sort.descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

/// Numbers compare numerically, strings lexically; missing and null sort last.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::MAX);
            let y = y.as_f64().unwrap_or(f64::MAX);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn sort_key_parse_and_display() {
        assert_eq!(SortKey::parse("-created_date"), SortKey::desc("created_date"));
        assert_eq!(SortKey::parse("order_position"), SortKey::asc("order_position"));
        assert_eq!(SortKey::desc("x").to_string(), "-x");
    }

    #[test]
    fn sorting_puts_missing_last() {
        let mut records = vec![
            rec(json!({"id": "c"})),
            rec(json!({"id": "b", "order_position": 10})),
            rec(json!({"id": "a", "order_position": 2})),
        ];
        sort_records(&mut records, &SortKey::asc("order_position"));
        let ids: Vec<_> = records.iter().filter_map(record_id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn merge_removes_nulls() {
        let mut record = rec(json!({"id": "a", "completed": true, "completed_at": "2026-01-01T00:00:00Z"}));
        merge(&mut record, rec(json!({"completed": false, "completed_at": null})));
        assert_eq!(record.get("completed"), Some(&json!(false)));
        assert!(!record.contains_key("completed_at"));
    }

    #[test]
    fn matches_requires_every_field() {
        let record = rec(json!({"id": "a", "column": "today", "completed": false}));
        assert!(matches(&record, &rec(json!({"column": "today"}))));
        assert!(!matches(&record, &rec(json!({"column": "today", "completed": true}))));
        assert!(matches(&record, &Record::new()));
    }
}
