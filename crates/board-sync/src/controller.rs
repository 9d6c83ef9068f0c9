//! [`BoardController`]: one board, applied optimistically and reconciled
//! against an [`EntityStore`].
//!
//! Every mutation follows the same shape:
//!
//! ```text
//! lock queue ─► snapshot ─► pure transition ─► publish ─► reconcile
//!                   │                                        │
//!                   └──────────── restore on failure ◄───────┘
//! ```
//!
//! Mutations on one board are serialized by the queue lock, held until the
//! reconcile settles, so a rollback always restores the state its own
//! operation started from. Reads never take the lock and see the
//! optimistic board.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use board_core::config::Config;
use board_core::reorder::{self, Reorder};
use board_core::stats::{self, BoardStats};
use board_core::{BoardError, BoardState, Item, Layout, MoveRequest, NewItem, Slot};

use crate::error::SyncError;
use crate::gateway::ItemGateway;
use crate::identity::{IdentityProvider, StaticIdentity};
use crate::notify::{self, NotificationCenter};
use crate::reconcile::{self, Write};
use crate::store::EntityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
    /// Items whose stored position was rewritten to close a gap.
    pub repaired: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Nothing to do: the item was dropped where it already was.
    Unchanged,
    /// Every remote write succeeded.
    Synced { writes: usize },
}

pub struct BoardController {
    config: Config,
    gateway: ItemGateway,
    identity: Arc<dyn IdentityProvider>,
    notifications: Arc<NotificationCenter>,
    state: watch::Sender<BoardState>,
    queue: Mutex<()>,
}

impl BoardController {
    pub fn new(config: Config, store: Arc<dyn EntityStore>) -> Self {
        let gateway = ItemGateway::for_board(store, &config.board);
        let identity = Arc::new(StaticIdentity::from_config(config.identity.as_ref()));
        let notifications = Arc::new(NotificationCenter::from_config(&config.notifications));
        let (state, _) = watch::channel(BoardState::empty(&config.board.layout));
        Self {
            config,
            gateway,
            identity,
            notifications,
            state,
            queue: Mutex::new(()),
        }
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = identity;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.config.board.layout
    }

    /// The board as currently displayed, including unconfirmed changes.
    pub fn snapshot(&self) -> BoardState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BoardState> {
        self.state.subscribe()
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    pub fn stats(&self, today: NaiveDate) -> BoardStats {
        stats::compute(&self.snapshot(), self.layout(), today)
    }

    // ─── Load ─────────────────────────────────────────────────────────────

    /// Replace the local board with the store's contents.
    pub async fn load(&self) -> Result<LoadReport, SyncError> {
        let _turn = self.queue.lock().await;
        let layout = self.layout();
        let loaded = self.gateway.load(layout).await?;
        let count = loaded.items.len();
        let board = BoardState::from_items(layout, loaded.items)?.succeeding(&self.snapshot());

        let normalized = reorder::normalize(&board);
        self.apply(normalized.board);

        let mut repaired = 0;
        if !normalized.changes.is_empty() {
            if self.config.sync.repair_on_load {
                let writes = reconcile::plan(&self.gateway, &normalized.changes);
                let report = reconcile::execute(&self.gateway, writes).await;
                repaired = report.succeeded();
                if !report.failures.is_empty() {
                    tracing::warn!(
                        failed = report.failures.len(),
                        "could not write back every repaired position"
                    );
                }
            } else {
                tracing::info!(
                    gaps = normalized.changes.len(),
                    "positions normalized locally; repair_on_load is off"
                );
            }
        }

        let report = LoadReport {
            loaded: count,
            skipped: loaded.skipped,
            repaired,
        };
        tracing::info!(
            board = %self.config.board.name,
            loaded = report.loaded,
            skipped = report.skipped,
            repaired = report.repaired,
            "board loaded"
        );
        Ok(report)
    }

    pub async fn reload(&self) -> Result<LoadReport, SyncError> {
        tracing::debug!(board = %self.config.board.name, "reloading");
        self.load().await
    }

    // ─── Move ─────────────────────────────────────────────────────────────

    pub async fn move_item(&self, req: &MoveRequest) -> Result<SyncOutcome, SyncError> {
        let _turn = self.queue.lock().await;
        self.move_locked(req).await
    }

    /// Move by id rather than by source slot.
    pub async fn move_by_id(
        &self,
        id: &str,
        to_column: &str,
        to_index: usize,
    ) -> Result<SyncOutcome, SyncError> {
        let _turn = self.queue.lock().await;
        let board = self.snapshot();
        let (column, index) = board
            .locate(id)
            .ok_or_else(|| BoardError::ItemNotFound(id.to_string()))?;
        let req = MoveRequest {
            from: Slot::new(column, index),
            to: Slot::new(to_column, to_index),
        };
        self.move_locked(&req).await
    }

    /// Complete an item, or reopen a completed one.
    pub async fn toggle_item(&self, id: &str) -> Result<SyncOutcome, SyncError> {
        let _turn = self.queue.lock().await;
        let req = reorder::toggle_request(&self.snapshot(), self.layout(), id)?;
        self.move_locked(&req).await
    }

    async fn move_locked(&self, req: &MoveRequest) -> Result<SyncOutcome, SyncError> {
        let before = self.snapshot();
        let outcome = match reorder::reorder(&before, self.layout(), req, Utc::now())? {
            Reorder::Unchanged => return Ok(SyncOutcome::Unchanged),
            Reorder::Moved(outcome) => outcome,
        };
        self.apply(outcome.board);

        let writes = reconcile::plan(&self.gateway, &outcome.changes);
        match reconcile::execute(&self.gateway, writes).await.into_result() {
            Ok(writes) => Ok(SyncOutcome::Synced { writes }),
            Err(e) => {
                self.rollback(before, notify::MOVE_FAILED, &e);
                Err(e)
            }
        }
    }

    // ─── Create / delete ──────────────────────────────────────────────────

    /// Persist a new item, then place the stored record on the board.
    ///
    /// Nothing changes locally when the create call fails. When only the
    /// follow-up sibling updates fail the item stays on the board (it exists
    /// remotely) and a toast reports the unsaved order.
    pub async fn create_item(&self, new: NewItem) -> Result<Item, SyncError> {
        let _turn = self.queue.lock().await;
        let layout = self.layout();
        let column = new
            .column
            .clone()
            .unwrap_or_else(|| layout.default_column.clone());

        let before = self.snapshot();
        let position = reorder::new_item_position(&before, layout, &column)?;
        let completed_at = layout.is_terminal(&column).then(Utc::now);
        let creator = match self.identity.current_user().await {
            Ok(who) => who,
            Err(e) => {
                tracing::warn!("could not resolve current user: {e}");
                None
            }
        };
        let fields = self
            .gateway
            .encode_new(&new, &column, position, completed_at, creator.as_ref());

        let item = match self.gateway.create(fields, layout).await {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!(%column, "create failed: {e}");
                self.notifications.error(notify::CREATE_FAILED);
                return Err(match e {
                    SyncError::Store(e) => SyncError::Create(e),
                    other => other,
                });
            }
        };

        let id = item.id.clone();
        let outcome = reorder::insert_new(&before, layout, item)?;
        let placed = outcome.board.get(&id).cloned();
        self.apply(outcome.board);

        if !outcome.changes.is_empty() {
            let writes = reconcile::plan(&self.gateway, &outcome.changes);
            if let Err(e) = reconcile::execute(&self.gateway, writes).await.into_result() {
                tracing::warn!(%column, "sibling positions not saved: {e}");
                self.notifications.error(notify::ORDER_SAVE_FAILED);
            }
        }

        placed.ok_or_else(|| {
            SyncError::Board(BoardError::Invariant {
                column,
                reason: "created item missing after insert".into(),
            })
        })
    }

    /// Remove an item and close the gap it leaves.
    pub async fn delete_item(&self, id: &str) -> Result<SyncOutcome, SyncError> {
        let _turn = self.queue.lock().await;
        let before = self.snapshot();
        let removal = reorder::remove(&before, id)?;
        self.apply(removal.outcome.board);

        let mut writes = vec![Write::Delete {
            id: removal.removed.id.clone(),
        }];
        writes.extend(reconcile::plan(&self.gateway, &removal.outcome.changes));
        match reconcile::execute(&self.gateway, writes).await.into_result() {
            Ok(writes) => Ok(SyncOutcome::Synced { writes }),
            Err(e) => {
                self.rollback(before, notify::DELETE_FAILED, &e);
                Err(e)
            }
        }
    }

    // ─── Publishing ───────────────────────────────────────────────────────

    fn apply(&self, board: BoardState) {
        tracing::debug!(revision = board.revision(), "publish board");
        self.state.send_replace(board);
    }

    fn rollback(&self, before: BoardState, message: &str, cause: &SyncError) {
        tracing::warn!(revision = before.revision(), "rolling back: {cause}");
        self.state.send_replace(before);
        self.notifications.error(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Call, MemoryEntityStore};
    use crate::store::Record;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    fn task(id: &str, column: &str, pos: u32) -> Record {
        rec(json!({"id": id, "column": column, "order_position": pos, "title": id}))
    }

    async fn board_with(records: Vec<Record>) -> (Arc<MemoryEntityStore>, BoardController) {
        let store = Arc::new(MemoryEntityStore::new());
        store.seed("Task", records);
        let ctl = BoardController::new(Config::todo(), store.clone());
        ctl.load().await.unwrap();
        store.clear_calls();
        (store, ctl)
    }

    fn ids(board: &BoardState, column: &str) -> Vec<String> {
        board
            .items(column)
            .unwrap()
            .iter()
            .map(|i| i.id.clone())
            .collect()
    }

    #[tokio::test]
    async fn move_across_columns_writes_moved_and_shifted() {
        let (store, ctl) = board_with(vec![task("A", "backlog", 0), task("B", "backlog", 1)]).await;

        let out = ctl
            .move_item(&MoveRequest::new("backlog", 0, "today", 0))
            .await
            .unwrap();
        assert_eq!(out, SyncOutcome::Synced { writes: 2 });

        let board = ctl.snapshot();
        assert_eq!(ids(&board, "backlog"), vec!["B"]);
        assert_eq!(ids(&board, "today"), vec!["A"]);
        board.check_invariants().unwrap();

        let updates = store.updates();
        assert_eq!(updates.len(), 2);
        let (id, patch) = &updates[0];
        assert_eq!(id, "A");
        assert_eq!(patch["column"], "today");
        assert_eq!(patch["order_position"], 0);
        assert_eq!(updates[1].0, "B");
        assert_eq!(updates[1].1.len(), 1);
    }

    #[tokio::test]
    async fn move_within_column_rewrites_every_position() {
        let (store, ctl) = board_with(vec![
            task("A", "today", 0),
            task("B", "today", 1),
            task("C", "today", 2),
        ])
        .await;

        ctl.move_item(&MoveRequest::new("today", 2, "today", 0))
            .await
            .unwrap();
        assert_eq!(ids(&ctl.snapshot(), "today"), vec!["C", "A", "B"]);
        assert_eq!(store.updates().len(), 3);
        assert_eq!(store.get("Task", "B").unwrap()["order_position"], 2);
    }

    #[tokio::test]
    async fn failed_moved_update_reverts_with_one_toast() {
        let (store, ctl) = board_with(vec![
            task("A", "today", 0),
            task("B", "today", 1),
            task("C", "today", 2),
        ])
        .await;
        let before = ctl.snapshot();
        store.fail_update_for("C");

        let err = ctl
            .move_item(&MoveRequest::new("today", 2, "today", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Reconcile { failed: 1, total: 3, .. }));
        assert_eq!(ctl.snapshot(), before);

        let toasts = ctl.notifications().all();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].message, notify::MOVE_FAILED);
    }

    #[tokio::test]
    async fn partial_failure_still_reverts_everything() {
        let (store, ctl) = board_with(vec![task("A", "backlog", 0), task("B", "backlog", 1)]).await;
        let before = ctl.snapshot();
        store.fail_update_for("B");

        assert!(ctl
            .move_item(&MoveRequest::new("backlog", 0, "today", 0))
            .await
            .is_err());
        assert_eq!(ctl.snapshot(), before);
        // A's write landed remotely; the window is accepted.
        assert_eq!(store.get("Task", "A").unwrap()["column"], "today");
    }

    #[tokio::test]
    async fn drop_in_place_does_nothing() {
        let (store, ctl) = board_with(vec![task("A", "today", 0), task("B", "today", 1)]).await;
        let before = ctl.snapshot();
        let out = ctl
            .move_item(&MoveRequest::new("today", 1, "today", 9))
            .await
            .unwrap();
        assert_eq!(out, SyncOutcome::Unchanged);
        assert_eq!(ctl.snapshot(), before);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn bad_request_leaves_board_alone() {
        let (store, ctl) = board_with(vec![task("A", "today", 0)]).await;
        let err = ctl
            .move_item(&MoveRequest::new("today", 3, "done", 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::Board(BoardError::ItemIndexOutOfRange { .. })
        ));
        let err = ctl.move_by_id("A", "someday", 0).await.unwrap_err();
        assert!(matches!(err, SyncError::Board(BoardError::UnknownColumn(_))));
        assert!(store.calls().is_empty());
        assert!(ctl.notifications().all().is_empty());
    }

    #[tokio::test]
    async fn toggle_completes_and_reopens() {
        let (store, ctl) = board_with(vec![task("A", "today", 0), task("D", "done", 0)]).await;

        ctl.toggle_item("A").await.unwrap();
        let board = ctl.snapshot();
        assert_eq!(ids(&board, "done"), vec!["D", "A"]);
        let a = board.get("A").unwrap();
        assert!(a.completed && a.completed_at.is_some());
        assert_eq!(store.get("Task", "A").unwrap()["completed"], true);

        ctl.toggle_item("A").await.unwrap();
        let board = ctl.snapshot();
        assert_eq!(ids(&board, "backlog"), vec!["A"]);
        assert!(!board.get("A").unwrap().completed);
        assert!(!store.get("Task", "A").unwrap().contains_key("completed_at"));
    }

    #[tokio::test]
    async fn create_goes_on_top_and_shifts_siblings() {
        let (store, ctl) = board_with(vec![task("A", "backlog", 0), task("B", "backlog", 1)]).await;
        let ctl = ctl.with_identity(Arc::new(StaticIdentity::new("kim@example.test", None)));

        let item = ctl.create_item(NewItem::new("Write report")).await.unwrap();
        assert_eq!(item.order_position, 0);
        assert_eq!(item.created_by.as_deref(), Some("kim@example.test"));

        let board = ctl.snapshot();
        assert_eq!(ids(&board, "backlog"), vec![item.id.as_str(), "A", "B"]);
        board.check_invariants().unwrap();

        assert!(matches!(store.calls()[0], Call::Create { .. }));
        assert_eq!(store.get("Task", "B").unwrap()["order_position"], 2);
    }

    #[tokio::test]
    async fn create_in_terminal_column_is_completed() {
        let (_store, ctl) = board_with(vec![]).await;
        let item = ctl
            .create_item(NewItem::new("Already done").in_column("done"))
            .await
            .unwrap();
        assert!(item.completed);
        assert!(item.completed_at.is_some());
    }

    #[tokio::test]
    async fn failed_create_changes_nothing() {
        let (store, ctl) = board_with(vec![task("A", "backlog", 0)]).await;
        let before = ctl.snapshot();
        store.fail_creates();

        let err = ctl.create_item(NewItem::new("Nope")).await.unwrap_err();
        assert!(matches!(err, SyncError::Create(_)));
        assert_eq!(ctl.snapshot(), before);
        assert_eq!(ctl.notifications().all()[0].message, notify::CREATE_FAILED);
    }

    #[tokio::test]
    async fn unsaved_sibling_order_keeps_new_item() {
        let (store, ctl) = board_with(vec![task("A", "backlog", 0)]).await;
        store.fail_update_for("A");

        let item = ctl.create_item(NewItem::new("Kept")).await.unwrap();
        assert!(ctl.snapshot().get(&item.id).is_some());
        let toasts = ctl.notifications().all();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].message, notify::ORDER_SAVE_FAILED);
    }

    #[tokio::test]
    async fn delete_reranks_siblings() {
        let (store, ctl) = board_with(vec![
            task("A", "today", 0),
            task("B", "today", 1),
            task("C", "today", 2),
        ])
        .await;

        let out = ctl.delete_item("A").await.unwrap();
        assert_eq!(out, SyncOutcome::Synced { writes: 3 });
        assert_eq!(ids(&ctl.snapshot(), "today"), vec!["B", "C"]);
        assert!(store.get("Task", "A").is_none());
        assert_eq!(store.get("Task", "C").unwrap()["order_position"], 1);
    }

    #[tokio::test]
    async fn failed_delete_reverts() {
        let (store, ctl) = board_with(vec![task("A", "today", 0), task("B", "today", 1)]).await;
        let before = ctl.snapshot();
        store.fail_deletes();

        let err = ctl.delete_item("A").await.unwrap_err();
        assert!(matches!(err, SyncError::Delete { .. }));
        assert_eq!(ctl.snapshot(), before);
        assert_eq!(ctl.notifications().all()[0].message, notify::DELETE_FAILED);
    }

    #[tokio::test]
    async fn load_skips_bad_records_and_repairs_gaps() {
        let store = Arc::new(MemoryEntityStore::new());
        store.seed(
            "Task",
            vec![
                task("A", "today", 3),
                task("B", "today", 7),
                task("X", "archive", 0),
                rec(json!({"id": "Y", "column": "today", "order_position": "first"})),
            ],
        );
        let ctl = BoardController::new(Config::todo(), store.clone());
        let report = ctl.load().await.unwrap();
        assert_eq!(
            report,
            LoadReport {
                loaded: 2,
                skipped: 2,
                repaired: 2
            }
        );
        ctl.snapshot().check_invariants().unwrap();
        assert_eq!(store.get("Task", "B").unwrap()["order_position"], 1);
    }

    #[tokio::test]
    async fn load_survives_duplicate_and_numeric_ids() {
        let store = Arc::new(MemoryEntityStore::new());
        store.seed(
            "Task",
            vec![
                task("A", "today", 0),
                task("B", "today", 1),
                task("B", "backlog", 2),
                rec(json!({"id": 7, "column": "backlog", "order_position": 1})),
            ],
        );
        let ctl = BoardController::new(Config::todo(), store.clone());
        let report = ctl.load().await.unwrap();
        assert_eq!(report.loaded, 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(ids(&ctl.snapshot(), "today"), vec!["A", "B"]);

        ctl.move_by_id("A", "backlog", 0).await.unwrap();
        assert_eq!(ids(&ctl.snapshot(), "backlog"), vec!["A"]);
        assert!(ctl.notifications().all().is_empty());
    }

    #[tokio::test]
    async fn load_without_repair_only_fixes_local_state() {
        let store = Arc::new(MemoryEntityStore::new());
        store.seed("Task", vec![task("A", "today", 5)]);
        let mut config = Config::todo();
        config.sync.repair_on_load = false;
        let ctl = BoardController::new(config, store.clone());

        let report = ctl.load().await.unwrap();
        assert_eq!(report.repaired, 0);
        assert_eq!(ctl.snapshot().get("A").unwrap().order_position, 0);
        assert!(store.updates().is_empty());
    }

    #[tokio::test]
    async fn reload_picks_up_remote_changes() {
        let (store, ctl) = board_with(vec![task("A", "today", 0)]).await;
        let first = ctl.snapshot().revision();
        store.seed("Task", vec![task("B", "today", 1)]);
        let report = ctl.reload().await.unwrap();
        assert_eq!(report.loaded, 2);
        assert!(ctl.snapshot().revision() > first);
    }

    #[tokio::test]
    async fn failed_load_keeps_current_board() {
        let (store, ctl) = board_with(vec![task("A", "today", 0)]).await;
        let before = ctl.snapshot();
        store.fail_list();
        assert!(matches!(ctl.reload().await, Err(SyncError::Store(_))));
        assert_eq!(ctl.snapshot(), before);
    }

    #[tokio::test]
    async fn reads_see_optimistic_state_before_confirmation() {
        let (store, ctl) = board_with(vec![task("A", "backlog", 0)]).await;
        let ctl = Arc::new(ctl);
        store.set_update_delay(Duration::from_millis(200));

        let mover = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.move_by_id("A", "today", 0).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ids(&ctl.snapshot(), "today"), vec!["A"]);

        mover.await.unwrap().unwrap();
        assert_eq!(ids(&ctl.snapshot(), "today"), vec!["A"]);
    }

    #[tokio::test]
    async fn concurrent_moves_are_serialized() {
        let (store, ctl) = board_with(vec![
            task("A", "backlog", 0),
            task("B", "backlog", 1),
            task("C", "backlog", 2),
        ])
        .await;
        store.set_update_delay(Duration::from_millis(20));
        let rx = ctl.subscribe();

        let (first, second) = tokio::join!(
            ctl.move_by_id("A", "today", 0),
            ctl.move_by_id("C", "today", 0),
        );
        first.unwrap();
        second.unwrap();

        let board = ctl.snapshot();
        board.check_invariants().unwrap();
        assert_eq!(board.len(), 3);
        assert_eq!(ids(&board, "today"), vec!["C", "A"]);
        assert!(rx.has_changed().unwrap());

        // Remote positions match the final local board.
        for item in board.iter_items() {
            let remote = store.get("Task", &item.id).unwrap();
            assert_eq!(remote["order_position"], item.order_position);
            assert_eq!(remote["column"], item.column.as_str());
        }
    }

    #[tokio::test]
    async fn stats_reflect_optimistic_board() {
        let (_store, ctl) = board_with(vec![task("A", "today", 0), task("B", "today", 1)]).await;
        ctl.toggle_item("A").await.unwrap();
        let stats = ctl.stats(Utc::now().date_naive());
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.completion_percent, 50);
        assert_eq!(stats.streak_days, 1);
    }
}
