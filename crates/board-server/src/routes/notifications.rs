use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use board_sync::Notification;
use chrono::Utc;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/notifications: toasts that have not expired yet.
pub async fn list_notifications(State(app): State<AppState>) -> Json<Vec<Notification>> {
    Json(app.board.notifications().active(Utc::now()))
}

/// DELETE /api/notifications/{id}
pub async fn dismiss_notification(
    State(app): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    if app.board.notifications().dismiss(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("no notification {id}")))
    }
}
