//! `board-sync`: optimistic synchronization of a board against a remote
//! entity store.
//!
//! # Architecture
//!
//! ```text
//! BoardController        ← owns the published BoardState (watch channel)
//!     │                     serializes mutations, rolls back on failure
//!     ▼
//! reconcile              ← plans one write per ItemChange, fans out
//!     │                     concurrently with join_all
//!     ▼
//! ItemGateway            ← Item ⇄ Record, validated at the boundary
//!     │
//!     ▼
//! dyn EntityStore        ← HttpEntityStore | FileEntityStore | MemoryEntityStore
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use board_core::{config::Config, MoveRequest};
//! use board_sync::{BoardController, FileEntityStore};
//!
//! let store = Arc::new(FileEntityStore::new(".board"));
//! let ctl = BoardController::new(Config::todo(), store);
//! ctl.load().await?;
//! ctl.move_item(&MoveRequest::new("backlog", 0, "today", 0)).await?;
//! ```

pub mod controller;
pub mod error;
pub mod file;
pub mod gateway;
pub mod http;
pub mod identity;
pub mod memory;
pub mod notify;
pub mod reconcile;
pub mod store;

pub use controller::{BoardController, LoadReport, SyncOutcome};
pub use error::{RecordError, StoreError, SyncError};
pub use file::FileEntityStore;
pub use gateway::ItemGateway;
pub use http::HttpEntityStore;
pub use identity::{Identity, IdentityProvider, StaticIdentity};
pub use memory::MemoryEntityStore;
pub use notify::{Level, Notification, NotificationCenter};
pub use store::{EntityStore, Record, SortKey};
