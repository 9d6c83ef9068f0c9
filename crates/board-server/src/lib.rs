pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use board_sync::BoardController;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(board: Arc<BoardController>) -> Router {
    let app_state = state::AppState::new(board);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // Board
        .route("/api/board", get(routes::board::get_board))
        .route("/api/board/move", post(routes::board::move_item))
        .route("/api/board/reload", post(routes::board::reload))
        // Items
        .route("/api/items", post(routes::items::create_item))
        .route("/api/items/{id}", delete(routes::items::delete_item))
        .route("/api/items/{id}/toggle", post(routes::items::toggle_item))
        // Derived
        .route("/api/stats", get(routes::stats::get_stats))
        .route(
            "/api/notifications",
            get(routes::notifications::list_notifications),
        )
        .route(
            "/api/notifications/{id}",
            delete(routes::notifications::dismiss_notification),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Serve the board API on `0.0.0.0:{port}`.
pub async fn serve(board: Arc<BoardController>, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(board, listener, open_browser).await
}

/// Serve on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(
    board: Arc<BoardController>,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let name = board.config().board.name.clone();
    let app = build_router(board);

    tracing::info!(board = %name, "board server listening on http://localhost:{actual_port}");

    if open_browser {
        let url = format!("http://localhost:{actual_port}/api/board");
        if let Err(e) = open::that(&url) {
            tracing::warn!("could not open browser: {e}");
        }
    }

    axum::serve(listener, app).await?;
    Ok(())
}
