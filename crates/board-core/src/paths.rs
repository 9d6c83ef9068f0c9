use crate::error::{BoardError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// File constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "board.yaml";
pub const STORE_DIR: &str = ".board";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn store_dir(root: &Path) -> PathBuf {
    root.join(STORE_DIR)
}

/// One YAML file per entity type, e.g. `.board/Task.yaml`.
pub fn entity_file(dir: &Path, entity: &str) -> PathBuf {
    dir.join(format!("{entity}.yaml"))
}

// ---------------------------------------------------------------------------
// Identifier validation
// ---------------------------------------------------------------------------

static COLUMN_RE: OnceLock<Regex> = OnceLock::new();
static ENTITY_RE: OnceLock<Regex> = OnceLock::new();

fn column_re() -> &'static Regex {
    COLUMN_RE.get_or_init(|| Regex::new(r"^[a-z0-9]+(?:[-_][a-z0-9]+)*$").unwrap())
}

fn entity_re() -> &'static Regex {
    ENTITY_RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap())
}

pub fn validate_column_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 64 || !column_re().is_match(id) {
        return Err(BoardError::InvalidColumnId(id.to_string()));
    }
    Ok(())
}

/// Entity names end up in file names and URL paths.
pub fn validate_entity_name(name: &str) -> Result<()> {
    if name.len() > 64 || !entity_re().is_match(name) {
        return Err(BoardError::InvalidEntityName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
