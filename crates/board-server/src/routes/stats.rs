use axum::extract::State;
use axum::Json;
use board_core::stats::BoardStats;
use chrono::Local;

use crate::state::AppState;

/// GET /api/stats: progress and streak, counted in the server's local day.
pub async fn get_stats(State(app): State<AppState>) -> Json<BoardStats> {
    Json(app.board.stats(Local::now().date_naive()))
}
