use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("not initialized: run 'board init'")]
    NotInitialized,

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("no item at index {index} in column '{column}'")]
    ItemIndexOutOfRange { column: String, index: usize },

    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("duplicate item id on board: {0}")]
    DuplicateItem(String),

    #[error("invalid column id '{0}': must be lowercase alphanumeric with '-' or '_'")]
    InvalidColumnId(String),

    #[error("invalid entity name '{0}': must start with a letter and contain only letters, digits, or '_'")]
    InvalidEntityName(String),

    #[error("invalid board config: {0}")]
    InvalidConfig(String),

    #[error("board invariant violated in column '{column}': {reason}")]
    Invariant { column: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BoardError>;
