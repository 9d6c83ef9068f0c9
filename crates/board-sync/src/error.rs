use board_core::BoardError;
use thiserror::Error;

/// Failure talking to an [`EntityStore`](crate::store::EntityStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },

    #[error("failed to decode store response: {0}")]
    Decode(String),

    #[error("local storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

/// A store record that does not describe a valid item for this board.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("missing field '{0}'")]
    MissingField(String),

    #[error("field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("column '{0}' is not on this board")]
    UnknownColumn(String),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid record: {0}")]
    Record(#[from] RecordError),

    #[error("create failed: {0}")]
    Create(#[source] StoreError),

    #[error("delete of '{id}' failed: {source}")]
    Delete {
        id: String,
        #[source]
        source: StoreError,
    },

    #[error("{failed} of {total} writes failed: {first}")]
    Reconcile {
        failed: usize,
        total: usize,
        #[source]
        first: StoreError,
    },
}
