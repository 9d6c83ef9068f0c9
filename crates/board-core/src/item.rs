use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A card on a board: a task on the to-do board, an idea on the roadmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub column: String,
    /// Zero-based rank within `column`.
    pub order_position: u32,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    /// Content fields the board does not interpret.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        column: impl Into<String>,
        order_position: u32,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            column: column.into(),
            order_position,
            title: title.into(),
            completed: false,
            completed_at: None,
            created_by: None,
            created_date: None,
            extra: Map::new(),
        }
    }

    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.completed = true;
        self.completed_at = Some(now);
    }

    pub fn clear_completion(&mut self) {
        self.completed = false;
        self.completed_at = None;
    }
}

/// Fields supplied by the user when creating an item. The store assigns the id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub title: String,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl NewItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn in_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}
