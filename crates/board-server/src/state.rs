use std::sync::Arc;

use board_sync::BoardController;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub board: Arc<BoardController>,
}

impl AppState {
    pub fn new(board: Arc<BoardController>) -> Self {
        Self { board }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_core::config::Config;
    use board_sync::MemoryEntityStore;

    #[test]
    fn clones_share_one_controller() {
        let ctl = BoardController::new(Config::todo(), Arc::new(MemoryEntityStore::new()));
        let state = AppState::new(Arc::new(ctl));
        let copy = state.clone();
        assert!(Arc::ptr_eq(&state.board, &copy.board));
    }
}
