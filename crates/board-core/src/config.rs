use crate::error::{BoardError, Result};
use crate::paths;
use crate::types::{Column, Layout};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// BoardConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    pub name: String,
    /// Entity type in the store, e.g. `Task`.
    pub entity: String,
    /// Record field holding the column id (`column` or `status`).
    #[serde(default = "default_column_field")]
    pub column_field: String,
    #[serde(flatten)]
    pub layout: Layout,
}

fn default_column_field() -> String {
    "column".to_string()
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// YAML files on local disk, one per entity.
    File {
        #[serde(default = "default_store_dir")]
        dir: PathBuf,
    },
    /// A remote entity API.
    Http {
        base_url: String,
        /// Environment variable holding a bearer token.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token_env: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_secs: Option<u64>,
    },
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(paths::STORE_DIR)
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            dir: default_store_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// IdentityConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

// ---------------------------------------------------------------------------
// NotificationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Toasts kept in memory; the oldest is dropped past this.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// How long a toast stays visible.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_capacity() -> usize {
    32
}

fn default_ttl_secs() -> u64 {
    4
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// SyncConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Write normalized positions back when the loaded board has gaps.
    #[serde(default = "default_repair_on_load")]
    pub repair_on_load: bool,
}

fn default_repair_on_load() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            repair_on_load: default_repair_on_load(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub board: BoardConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityConfig>,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(board: BoardConfig) -> Self {
        Self {
            version: 1,
            board,
            store: StoreConfig::default(),
            identity: None,
            notifications: NotificationConfig::default(),
            sync: SyncConfig::default(),
        }
    }

    /// Backlog → Today → Done, new tasks on top of the backlog.
    pub fn todo() -> Self {
        Self::new(BoardConfig {
            name: "To-do".to_string(),
            entity: "Task".to_string(),
            column_field: default_column_field(),
            layout: Layout::new(
                vec![
                    Column::new("backlog", "Backlog"),
                    Column::new("today", "Today"),
                    Column::new("done", "Done").terminal().append(),
                ],
                "backlog",
            ),
        })
    }

    /// Ideas → Planned → In Progress → Shipped, keyed on `status`.
    pub fn roadmap() -> Self {
        Self::new(BoardConfig {
            name: "Roadmap".to_string(),
            entity: "RoadmapItem".to_string(),
            column_field: "status".to_string(),
            layout: Layout::new(
                vec![
                    Column::new("idea", "Ideas").append(),
                    Column::new("planned", "Planned").append(),
                    Column::new("in_progress", "In Progress").append(),
                    Column::new("shipped", "Shipped").terminal().append(),
                ],
                "idea",
            ),
        })
    }

    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "todo" => Ok(Self::todo()),
            "roadmap" => Ok(Self::roadmap()),
            other => Err(BoardError::InvalidConfig(format!(
                "unknown preset '{other}' (expected 'todo' or 'roadmap')"
            ))),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.board.layout
    }

    /// Load and structurally check a config file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BoardError::NotInitialized);
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        cfg.check()?;
        Ok(cfg)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        crate::io::atomic_write(path, self.to_yaml()?.as_bytes())
    }

    /// Errors that make the board unusable.
    pub fn check(&self) -> Result<()> {
        paths::validate_entity_name(&self.board.entity)?;
        if self.board.column_field.trim().is_empty() {
            return Err(BoardError::InvalidConfig("column_field is empty".into()));
        }
        self.board.layout.check()
    }

    /// Store directory resolved against the directory holding the config.
    pub fn store_dir(&self, base: &Path) -> Option<PathBuf> {
        match &self.store {
            StoreConfig::File { dir } if dir.is_absolute() => Some(dir.clone()),
            StoreConfig::File { dir } => Some(base.join(dir)),
            StoreConfig::Http { .. } => None,
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if let Err(e) = self.check() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: e.to_string(),
            });
        }

        if self.board.layout.first_terminal().is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "no terminal column: items can never be marked complete".to_string(),
            });
        }

        if let StoreConfig::Http {
            base_url,
            token_env,
            ..
        } = &self.store
        {
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("store base_url '{base_url}' is not an http(s) URL"),
                });
            }
            if let Some(var) = token_env {
                if std::env::var_os(var).is_none() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!("token variable '{var}' is not set"),
                    });
                }
            }
        }

        if self.notifications.capacity == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "notifications.capacity is 0: failures will not be shown".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
