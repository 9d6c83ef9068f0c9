use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use board_core::config::Config;
use board_core::{BoardState, InsertMode, Item, MoveRequest};
use board_sync::{LoadReport, SyncOutcome};

use crate::error::AppError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ColumnView {
    pub id: String,
    pub title: String,
    pub terminal: bool,
    pub insert: InsertMode,
    pub revision: u64,
    pub items: Vec<Item>,
}

/// A board as the UI renders it: columns in configured order with titles.
#[derive(Debug, Serialize)]
pub struct BoardView {
    pub name: String,
    pub revision: u64,
    pub columns: Vec<ColumnView>,
}

impl BoardView {
    pub fn new(board: &BoardState, config: &Config) -> Self {
        let columns = config
            .layout()
            .columns
            .iter()
            .map(|c| {
                let lane = board.lane(&c.id);
                ColumnView {
                    id: c.id.clone(),
                    title: c.title.clone(),
                    terminal: c.terminal,
                    insert: c.insert,
                    revision: lane.map_or(0, |l| l.revision),
                    items: lane.map(|l| l.items.clone()).unwrap_or_default(),
                }
            })
            .collect();
        Self {
            name: config.board.name.clone(),
            revision: board.revision(),
            columns,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MoveBody {
    pub from_column: String,
    pub from_index: usize,
    pub to_column: String,
    pub to_index: usize,
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    pub result: SyncOutcome,
    pub board: BoardView,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub report: LoadReport,
    pub board: BoardView,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/board: the current (optimistic) board.
pub async fn get_board(State(app): State<AppState>) -> Json<BoardView> {
    let ctl = &app.board;
    Json(BoardView::new(&ctl.snapshot(), ctl.config()))
}

/// POST /api/board/move: drag an item from one slot to another.
///
/// On a failed sync the board has already been rolled back when the 502
/// reaches the client; `GET /api/board` returns the restored state.
pub async fn move_item(
    State(app): State<AppState>,
    Json(body): Json<MoveBody>,
) -> Result<Json<MoveResponse>, AppError> {
    let req = MoveRequest::new(body.from_column, body.from_index, body.to_column, body.to_index);
    let result = app.board.move_item(&req).await?;
    Ok(Json(MoveResponse {
        result,
        board: BoardView::new(&app.board.snapshot(), app.board.config()),
    }))
}

/// POST /api/board/reload: discard local state and load from the store.
pub async fn reload(State(app): State<AppState>) -> Result<Json<ReloadResponse>, AppError> {
    let report = app.board.reload().await?;
    Ok(Json(ReloadResponse {
        report,
        board: BoardView::new(&app.board.snapshot(), app.board.config()),
    }))
}
