use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use board_core::BoardError;
use board_sync::{StoreError, SyncError};

// ---------------------------------------------------------------------------
// Internal sentinels for explicit statuses
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct BadRequest(String);

impl std::fmt::Display for BadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequest {}

#[derive(Debug)]
struct NotFound(String);

impl std::fmt::Display for NotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotFound {}

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequest(msg.into()).into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFound(msg.into()).into())
    }

    fn status(&self) -> StatusCode {
        if self.0.is::<BadRequest>() {
            return StatusCode::BAD_REQUEST;
        }
        if self.0.is::<NotFound>() {
            return StatusCode::NOT_FOUND;
        }
        if let Some(e) = self.0.downcast_ref::<SyncError>() {
            return match e {
                SyncError::Board(b) => board_status(b),
                SyncError::Record(_) => StatusCode::BAD_GATEWAY,
                // The store itself answered "no such record" on a read.
                SyncError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
                SyncError::Store(_)
                | SyncError::Create(_)
                | SyncError::Delete { .. }
                | SyncError::Reconcile { .. } => StatusCode::BAD_GATEWAY,
            };
        }
        if let Some(b) = self.0.downcast_ref::<BoardError>() {
            return board_status(b);
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn board_status(err: &BoardError) -> StatusCode {
    match err {
        BoardError::ItemNotFound(_) => StatusCode::NOT_FOUND,
        BoardError::DuplicateItem(_) => StatusCode::CONFLICT,
        BoardError::UnknownColumn(_)
        | BoardError::ItemIndexOutOfRange { .. }
        | BoardError::InvalidColumnId(_)
        | BoardError::InvalidEntityName(_)
        | BoardError::InvalidConfig(_)
        | BoardError::NotInitialized => StatusCode::BAD_REQUEST,
        BoardError::Invariant { .. }
        | BoardError::Io(_)
        | BoardError::Yaml(_)
        | BoardError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), "request failed: {:#}", self.0);
        }
        let body = serde_json::json!({ "error": format!("{:#}", self.0) });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: impl Into<anyhow::Error>) -> StatusCode {
        AppError(err.into()).into_response().status()
    }

    #[test]
    fn item_not_found_maps_to_404() {
        assert_eq!(
            status_of(SyncError::Board(BoardError::ItemNotFound("a".into()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(BoardError::ItemNotFound("a".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn bad_moves_map_to_400() {
        assert_eq!(
            status_of(SyncError::Board(BoardError::UnknownColumn("x".into()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(SyncError::Board(BoardError::ItemIndexOutOfRange {
                column: "today".into(),
                index: 4,
            })),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn failed_sync_maps_to_502() {
        let err = SyncError::Reconcile {
            failed: 1,
            total: 2,
            first: StoreError::Transport("connection reset".into()),
        };
        assert_eq!(status_of(err), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_of(SyncError::Create(StoreError::Rejected {
                status: 500,
                message: "boom".into(),
            })),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn sentinels_and_unknown_errors() {
        assert_eq!(
            AppError::bad_request("title is empty").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("no toast 9").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(anyhow::anyhow!("something unexpected")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn response_body_is_json() {
        let response = AppError::not_found("gone").into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(ct.to_str().unwrap().contains("application/json"));
    }
}
