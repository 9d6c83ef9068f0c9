use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_stream::StreamExt as _;

use super::board::BoardView;
use crate::state::AppState;

/// GET /api/events: SSE stream.
///
/// Emits `board` with the full board on connect and on every published
/// state (optimistic applies and rollbacks alike), and `toast` for each
/// new notification.
pub async fn sse_events(State(app): State<AppState>) -> impl axum::response::IntoResponse {
    let ctl = app.board.clone();
    let boards = WatchStream::new(app.board.subscribe()).map(move |board| {
        let view = BoardView::new(&board, ctl.config());
        Ok::<Event, Infallible>(json_event("board", &view))
    });
    let toasts = BroadcastStream::new(app.board.notifications().subscribe()).filter_map(|msg| {
        msg.ok()
            .map(|n| Ok::<Event, Infallible>(json_event("toast", &n)))
    });
    Sse::new(boards.merge(toasts)).keep_alive(KeepAlive::default())
}

fn json_event(name: &str, payload: &impl serde::Serialize) -> Event {
    let data = serde_json::to_string(payload).unwrap_or_else(|_| "null".to_string());
    Event::default().event(name).data(data)
}
