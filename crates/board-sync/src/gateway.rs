//! Typed boundary between board items and raw entity-store records.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use board_core::config::BoardConfig;
use board_core::{Item, ItemChange, Layout, NewItem};

use crate::error::{RecordError, StoreError, SyncError};
use crate::identity::Identity;
use crate::store::{EntityStore, Record, SortKey};

const ID: &str = "id";
const ORDER_POSITION: &str = "order_position";
const TITLE: &str = "title";
const COMPLETED: &str = "completed";
const COMPLETED_AT: &str = "completed_at";
const CREATED_BY: &str = "created_by";
const CREATED_DATE: &str = "created_date";

// ─── Loaded ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Loaded {
    pub items: Vec<Item>,
    /// Records dropped at the boundary because they failed validation.
    pub skipped: usize,
}

// ─── ItemGateway ──────────────────────────────────────────────────────────

/// Typed access to one board's entity: decodes store records into
/// [`Item`]s and encodes item changes into merge patches.
#[derive(Clone)]
pub struct ItemGateway {
    store: Arc<dyn EntityStore>,
    entity: String,
    column_field: String,
}

impl ItemGateway {
    pub fn new(
        store: Arc<dyn EntityStore>,
        entity: impl Into<String>,
        column_field: impl Into<String>,
    ) -> Self {
        Self {
            store,
            entity: entity.into(),
            column_field: column_field.into(),
        }
    }

    pub fn for_board(store: Arc<dyn EntityStore>, board: &BoardConfig) -> Self {
        Self::new(store, board.entity.clone(), board.column_field.clone())
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Fetch every record, dropping (and logging) the ones that are not
    /// valid items for `layout`. A repeated id keeps its first record.
    pub async fn load(&self, layout: &Layout) -> Result<Loaded, StoreError> {
        let records = self
            .store
            .list(&self.entity, Some(&SortKey::asc(ORDER_POSITION)))
            .await?;
        let mut items = Vec::with_capacity(records.len());
        let mut seen = HashSet::with_capacity(records.len());
        let mut skipped = 0;
        for record in &records {
            match self.decode(record, layout) {
                Ok(item) if seen.insert(item.id.clone()) => items.push(item),
                Ok(item) => {
                    skipped += 1;
                    tracing::warn!(
                        entity = %self.entity,
                        id = %item.id,
                        "skipping record: duplicate id"
                    );
                }
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(
                        entity = %self.entity,
                        id = record.get(ID).and_then(|v| v.as_str()).unwrap_or("?"),
                        "skipping record: {e}"
                    );
                }
            }
        }
        Ok(Loaded { items, skipped })
    }

    pub async fn create(&self, fields: Record, layout: &Layout) -> Result<Item, SyncError> {
        let record = self.store.create(&self.entity, fields).await?;
        Ok(self.decode(&record, layout)?)
    }

    pub async fn update(&self, id: &str, patch: Record) -> Result<(), StoreError> {
        self.store.update(&self.entity, id, patch).await.map(|_| ())
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(&self.entity, id).await
    }

    // ─── Encoding ─────────────────────────────────────────────────────────

    /// The moved item carries its column and completion fields; a shifted
    /// sibling only its new position.
    pub fn patch_for(&self, change: &ItemChange) -> Record {
        let item = &change.item;
        let mut patch = Map::new();
        if change.moved {
            patch.insert(self.column_field.clone(), Value::String(item.column.clone()));
            patch.insert(COMPLETED.into(), Value::Bool(item.completed));
            patch.insert(COMPLETED_AT.into(), timestamp(item.completed_at));
        }
        patch.insert(ORDER_POSITION.into(), Value::from(item.order_position));
        patch
    }

    /// Fields for a create call. Board-owned fields win over `extra`.
    pub fn encode_new(
        &self,
        new: &NewItem,
        column: &str,
        order_position: u32,
        completed_at: Option<DateTime<Utc>>,
        creator: Option<&Identity>,
    ) -> Record {
        let mut fields = new.extra.clone();
        fields.insert(TITLE.into(), Value::String(new.title.clone()));
        fields.insert(self.column_field.clone(), Value::String(column.to_string()));
        fields.insert(ORDER_POSITION.into(), Value::from(order_position));
        fields.insert(COMPLETED.into(), Value::Bool(completed_at.is_some()));
        if let Some(at) = completed_at {
            fields.insert(COMPLETED_AT.into(), timestamp(Some(at)));
        }
        if let Some(who) = creator {
            fields.insert(CREATED_BY.into(), Value::String(who.email.clone()));
        }
        fields
    }

    // ─── Decoding ─────────────────────────────────────────────────────────

    pub fn decode(&self, record: &Record, layout: &Layout) -> Result<Item, RecordError> {
        let id = match record.get(ID) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(_) => return Err(invalid(ID, "expected a non-empty string")),
            None => return Err(RecordError::MissingField(ID.into())),
        };

        let column = match record.get(&self.column_field) {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(invalid(&self.column_field, "expected a string")),
            None => return Err(RecordError::MissingField(self.column_field.clone())),
        };
        if !layout.contains(&column) {
            return Err(RecordError::UnknownColumn(column));
        }

        // Records never ranked sort after every ranked sibling.
        let order_position = match record.get(ORDER_POSITION) {
            None | Some(Value::Null) => u32::MAX,
            Some(Value::Number(n)) => match n.as_u64() {
                Some(v) => u32::try_from(v).unwrap_or(u32::MAX),
                None => match n.as_f64() {
                    Some(f) if f >= 0.0 && f.fract() == 0.0 => {
                        if f > f64::from(u32::MAX) {
                            u32::MAX
                        } else {
                            f as u32
                        }
                    }
                    _ => {
                        return Err(invalid(
                            ORDER_POSITION,
                            "expected a non-negative integer",
                        ))
                    }
                },
            },
            Some(_) => return Err(invalid(ORDER_POSITION, "expected a number")),
        };

        let title = match record.get(TITLE) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(invalid(TITLE, "expected a string")),
        };

        let completed = match record.get(COMPLETED) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => return Err(invalid(COMPLETED, "expected a boolean")),
        };

        let created_by = match record.get(CREATED_BY) {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        };

        let known = [
            ID,
            self.column_field.as_str(),
            ORDER_POSITION,
            TITLE,
            COMPLETED,
            COMPLETED_AT,
            CREATED_BY,
            CREATED_DATE,
        ];
        let extra = record
            .iter()
            .filter(|(k, _)| !known.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Item {
            id,
            column,
            order_position,
            title,
            completed,
            completed_at: parse_time(record, COMPLETED_AT)?,
            created_by,
            created_date: parse_time(record, CREATED_DATE)?,
            extra,
        })
    }
}

fn invalid(field: &str, reason: &str) -> RecordError {
    RecordError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn timestamp(at: Option<DateTime<Utc>>) -> Value {
    match at {
        Some(at) => Value::String(at.to_rfc3339()),
        None => Value::Null,
    }
}

/// RFC 3339, or a bare `YYYY-MM-DDTHH:MM:SS[.f]` read as UTC.
fn parse_time(record: &Record, field: &str) -> Result<Option<DateTime<Utc>>, RecordError> {
    let raw = match record.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.is_empty() => return Ok(None),
        Some(Value::String(s)) => s,
        Some(_) => return Err(invalid(field, "expected a timestamp string")),
    };
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(at.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| invalid(field, "not a valid timestamp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEntityStore;
    use board_core::Column;
    use serde_json::json;

    fn layout() -> Layout {
        Layout::new(
            vec![
                Column::new("idea", "Ideas"),
                Column::new("shipped", "Shipped").terminal(),
            ],
            "idea",
        )
    }

    fn gateway(store: Arc<MemoryEntityStore>) -> ItemGateway {
        ItemGateway::new(store, "RoadmapItem", "status")
    }

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn decode_reads_configured_column_field() {
        let gw = gateway(Arc::new(MemoryEntityStore::new()));
        let item = gw
            .decode(
                &rec(json!({
                    "id": "r1",
                    "status": "shipped",
                    "order_position": 2,
                    "title": "Dark mode",
                    "completed": true,
                    "completed_at": "2026-02-01T09:30:00Z",
                    "created_date": "2026-01-05T10:00:00.123456",
                    "votes": 7
                })),
                &layout(),
            )
            .unwrap();
        assert_eq!(item.column, "shipped");
        assert_eq!(item.order_position, 2);
        assert!(item.completed);
        assert!(item.completed_at.is_some());
        assert!(item.created_date.is_some());
        assert_eq!(item.extra.get("votes"), Some(&json!(7)));
        assert!(!item.extra.contains_key("status"));
    }

    #[test]
    fn decode_rejects_bad_records() {
        let gw = gateway(Arc::new(MemoryEntityStore::new()));
        let l = layout();
        assert_eq!(
            gw.decode(&rec(json!({"status": "idea"})), &l),
            Err(RecordError::MissingField("id".into()))
        );
        assert_eq!(
            gw.decode(&rec(json!({"id": "x", "status": "archived"})), &l),
            Err(RecordError::UnknownColumn("archived".into()))
        );
        assert!(matches!(
            gw.decode(&rec(json!({"id": "x", "status": "idea", "order_position": -1})), &l),
            Err(RecordError::InvalidField { .. })
        ));
        assert!(matches!(
            gw.decode(&rec(json!({"id": "x", "status": "idea", "completed_at": "yesterday"})), &l),
            Err(RecordError::InvalidField { .. })
        ));
    }

    #[test]
    fn numeric_ids_are_rejected() {
        let gw = gateway(Arc::new(MemoryEntityStore::new()));
        assert!(matches!(
            gw.decode(&rec(json!({"id": 7, "status": "idea"})), &layout()),
            Err(RecordError::InvalidField { ref field, .. }) if field == "id"
        ));
    }

    #[test]
    fn fractional_positions_are_rejected() {
        let gw = gateway(Arc::new(MemoryEntityStore::new()));
        let l = layout();
        assert!(matches!(
            gw.decode(&rec(json!({"id": "x", "status": "idea", "order_position": 1.9})), &l),
            Err(RecordError::InvalidField { ref field, .. }) if field == "order_position"
        ));
        let item = gw
            .decode(&rec(json!({"id": "x", "status": "idea", "order_position": 2.0})), &l)
            .unwrap();
        assert_eq!(item.order_position, 2);
    }

    #[test]
    fn unranked_records_sort_last() {
        let gw = gateway(Arc::new(MemoryEntityStore::new()));
        let item = gw
            .decode(&rec(json!({"id": "x", "status": "idea"})), &layout())
            .unwrap();
        assert_eq!(item.order_position, u32::MAX);
    }

    #[test]
    fn patches_differ_for_moved_and_shifted() {
        let gw = gateway(Arc::new(MemoryEntityStore::new()));
        let mut item = Item::new("a", "shipped", 0, "A");
        item.mark_completed(Utc::now());

        let moved = gw.patch_for(&ItemChange {
            item: item.clone(),
            previous_position: Some(3),
            moved: true,
        });
        assert_eq!(moved["status"], "shipped");
        assert_eq!(moved["completed"], true);
        assert!(moved["completed_at"].is_string());
        assert_eq!(moved["order_position"], 0);

        item.clear_completion();
        let cleared = gw.patch_for(&ItemChange {
            item: item.clone(),
            previous_position: Some(0),
            moved: true,
        });
        assert!(cleared["completed_at"].is_null());

        let shifted = gw.patch_for(&ItemChange {
            item,
            previous_position: Some(1),
            moved: false,
        });
        assert_eq!(shifted.len(), 1);
        assert_eq!(shifted["order_position"], 0);
    }

    #[test]
    fn encode_new_stamps_creator_and_protects_core_fields() {
        let gw = gateway(Arc::new(MemoryEntityStore::new()));
        let mut new = NewItem::new("Offline mode");
        new.extra.insert("status".into(), json!("shipped"));
        new.extra.insert("votes".into(), json!(0));
        let who = Identity {
            email: "kim@example.test".into(),
            full_name: None,
        };
        let fields = gw.encode_new(&new, "idea", 4, None, Some(&who));
        assert_eq!(fields["status"], "idea");
        assert_eq!(fields["order_position"], 4);
        assert_eq!(fields["created_by"], "kim@example.test");
        assert_eq!(fields["completed"], false);
        assert_eq!(fields["votes"], 0);
    }

    #[tokio::test]
    async fn load_skips_invalid_records() {
        let store = Arc::new(MemoryEntityStore::new());
        store.seed(
            "RoadmapItem",
            [
                rec(json!({"id": "a", "status": "idea", "order_position": 0})),
                rec(json!({"id": "b", "status": "nowhere", "order_position": 1})),
                rec(json!({"status": "idea"})),
            ],
        );
        let loaded = gateway(store).load(&layout()).await.unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.skipped, 2);
    }

    #[tokio::test]
    async fn load_keeps_first_of_duplicate_ids() {
        let store = Arc::new(MemoryEntityStore::new());
        store.seed(
            "RoadmapItem",
            [
                rec(json!({"id": "a", "status": "idea", "order_position": 0})),
                rec(json!({"id": "b", "status": "shipped", "order_position": 0, "completed": true})),
                rec(json!({"id": "b", "status": "idea", "order_position": 1})),
                rec(json!({"id": 7, "status": "idea", "order_position": 2})),
            ],
        );
        let loaded = gateway(store).load(&layout()).await.unwrap();
        let ids: Vec<_> = loaded.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"a") && ids.contains(&"b"));
        assert_eq!(loaded.skipped, 2);
    }
}
