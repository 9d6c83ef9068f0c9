//! `board-core`: the synchronous heart of an ordered-list board.
//!
//! Everything here is pure: a [`BoardState`] goes in, a new one comes out
//! along with the [`ItemChange`]s a caller has to persist. Talking to a
//! remote store lives in `board-sync`.

pub mod board;
pub mod config;
pub mod error;
pub mod io;
pub mod item;
pub mod paths;
pub mod reorder;
pub mod stats;
pub mod types;

pub use board::{BoardState, Lane};
pub use error::{BoardError, Result};
pub use item::{Item, NewItem};
pub use reorder::{ItemChange, MoveRequest, Outcome, Reorder, Removal, Slot};
pub use types::{Column, InsertMode, Layout};
