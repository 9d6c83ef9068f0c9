use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use board_core::{Item, NewItem};
use board_sync::SyncOutcome;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub result: SyncOutcome,
    pub item: Option<Item>,
}

/// POST /api/items: create an item; 201 with the stored item.
pub async fn create_item(
    State(app): State<AppState>,
    Json(body): Json<NewItem>,
) -> Result<(StatusCode, Json<Item>), AppError> {
    if body.title.trim().is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }
    let item = app.board.create_item(body).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// DELETE /api/items/{id}
pub async fn delete_item(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SyncOutcome>, AppError> {
    Ok(Json(app.board.delete_item(&id).await?))
}

/// POST /api/items/{id}/toggle: complete or reopen.
pub async fn toggle_item(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, AppError> {
    let result = app.board.toggle_item(&id).await?;
    let item = app.board.snapshot().get(&id).cloned();
    Ok(Json(ToggleResponse { result, item }))
}
