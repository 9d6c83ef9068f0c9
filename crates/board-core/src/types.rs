use crate::error::{BoardError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// InsertMode
// ---------------------------------------------------------------------------

/// Where newly created items land in a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertMode {
    #[default]
    Top,
    Append,
}

impl InsertMode {
    pub fn as_str(self) -> &'static str {
        match self {
            InsertMode::Top => "top",
            InsertMode::Append => "append",
        }
    }
}

impl fmt::Display for InsertMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub title: String,
    /// Membership implies the item is completed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub terminal: bool,
    #[serde(default)]
    pub insert: InsertMode,
}

impl Column {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            terminal: false,
            insert: InsertMode::Top,
        }
    }

    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    pub fn append(mut self) -> Self {
        self.insert = InsertMode::Append;
        self
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// The fixed set of columns a board renders, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub columns: Vec<Column>,
    /// Column that receives new items when none is given.
    pub default_column: String,
}

impl Layout {
    pub fn new(columns: Vec<Column>, default_column: impl Into<String>) -> Self {
        Self {
            columns,
            default_column: default_column.into(),
        }
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn require(&self, id: &str) -> Result<&Column> {
        self.column(id)
            .ok_or_else(|| BoardError::UnknownColumn(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.column(id).is_some()
    }

    pub fn is_terminal(&self, id: &str) -> bool {
        self.column(id).is_some_and(|c| c.terminal)
    }

    pub fn first_terminal(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.terminal)
    }

    pub fn column_ids(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.id.as_str())
    }

    /// Hard structural checks. A layout that fails these cannot host a board.
    pub fn check(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(BoardError::InvalidConfig("board has no columns".into()));
        }
        let mut seen = HashSet::new();
        for col in &self.columns {
            paths::validate_column_id(&col.id)?;
            if !seen.insert(col.id.as_str()) {
                return Err(BoardError::InvalidConfig(format!(
                    "duplicate column id '{}'",
                    col.id
                )));
            }
        }
        let default = self.column(&self.default_column).ok_or_else(|| {
            BoardError::InvalidConfig(format!(
                "default column '{}' is not one of the board's columns",
                self.default_column
            ))
        })?;
        if default.terminal {
            return Err(BoardError::InvalidConfig(format!(
                "default column '{}' cannot be terminal",
                default.id
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
