//! Pure board transitions: move, insert, remove, normalize.
//!
//! Every function takes the current [`BoardState`] by reference and returns
//! a new board together with the list of [`ItemChange`]s that must be
//! persisted for the remote store to match.

use crate::board::BoardState;
use crate::error::{BoardError, Result};
use crate::item::Item;
use crate::types::{InsertMode, Layout};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Requests and outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub column: String,
    pub index: usize,
}

impl Slot {
    pub fn new(column: impl Into<String>, index: usize) -> Self {
        Self {
            column: column.into(),
            index,
        }
    }
}

/// A drag gesture: take the item at `from`, drop it at `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from: Slot,
    pub to: Slot,
}

impl MoveRequest {
    pub fn new(
        from_column: impl Into<String>,
        from_index: usize,
        to_column: impl Into<String>,
        to_index: usize,
    ) -> Self {
        Self {
            from: Slot::new(from_column, from_index),
            to: Slot::new(to_column, to_index),
        }
    }
}

/// An item whose persisted fields must be written after a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemChange {
    /// The item as it stands on the new board.
    pub item: Item,
    pub previous_position: Option<u32>,
    /// The dragged item itself; its column and completion fields changed too.
    pub moved: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub board: BoardState,
    /// The moved item first (if any), then shifted siblings in board order.
    pub changes: Vec<ItemChange>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reorder {
    /// Dropped where it was picked up. Nothing to apply or persist.
    Unchanged,
    Moved(Outcome),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    pub removed: Item,
    pub outcome: Outcome,
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// Move the item at `req.from` to `req.to`.
///
/// The destination index is read against the destination list with the
/// item already removed and is clamped to `[0, len]`. Entering a terminal
/// column stamps completion with `now`; leaving one for a non-terminal
/// column clears it.
pub fn reorder(
    board: &BoardState,
    layout: &Layout,
    req: &MoveRequest,
    now: DateTime<Utc>,
) -> Result<Reorder> {
    layout.require(&req.from.column)?;
    layout.require(&req.to.column)?;

    let source_len = board
        .items(&req.from.column)
        .ok_or_else(|| BoardError::UnknownColumn(req.from.column.clone()))?
        .len();
    if req.from.index >= source_len {
        return Err(BoardError::ItemIndexOutOfRange {
            column: req.from.column.clone(),
            index: req.from.index,
        });
    }

    let same_column = req.from.column == req.to.column;
    if same_column && req.to.index.min(source_len - 1) == req.from.index {
        return Ok(Reorder::Unchanged);
    }

    let mut next = board.clone();
    let mut item = next.lane_mut(&req.from.column)?.items.remove(req.from.index);

    let leaving_terminal = layout.is_terminal(&req.from.column);
    let entering_terminal = layout.is_terminal(&req.to.column);
    if entering_terminal && !leaving_terminal {
        item.mark_completed(now);
    } else if leaving_terminal && !entering_terminal {
        item.clear_completion();
    }
    item.column = req.to.column.clone();
    let moved_id = item.id.clone();

    let dest = next.lane_mut(&req.to.column)?;
    let at = req.to.index.min(dest.items.len());
    dest.items.insert(at, item);

    next.reindex(&req.from.column)?;
    if !same_column {
        next.reindex(&req.to.column)?;
    }
    next.touch();

    let columns = if same_column {
        vec![req.to.column.as_str()]
    } else {
        vec![req.from.column.as_str(), req.to.column.as_str()]
    };
    let changes = changes_between(board, &next, &columns, Some(moved_id.as_str()));
    Ok(Reorder::Moved(Outcome {
        board: next,
        changes,
    }))
}

/// The move that flips an item's completion: into the first terminal
/// column, or back out to the default column.
pub fn toggle_request(board: &BoardState, layout: &Layout, id: &str) -> Result<MoveRequest> {
    let (column, index) = board
        .locate(id)
        .ok_or_else(|| BoardError::ItemNotFound(id.to_string()))?;

    let target = if layout.is_terminal(column) {
        layout.require(&layout.default_column)?
    } else {
        layout.first_terminal().ok_or_else(|| {
            BoardError::InvalidConfig("board has no terminal column to complete into".into())
        })?
    };
    let to_index = match target.insert {
        InsertMode::Top => 0,
        InsertMode::Append => board.items(&target.id).map_or(0, |items| items.len()),
    };
    Ok(MoveRequest::new(column, index, target.id.clone(), to_index))
}

// ---------------------------------------------------------------------------
// Create / delete
// ---------------------------------------------------------------------------

/// Position a new item in `column` should be created with.
pub fn new_item_position(board: &BoardState, layout: &Layout, column: &str) -> Result<u32> {
    let col = layout.require(column)?;
    Ok(match col.insert {
        InsertMode::Top => 0,
        InsertMode::Append => board.items(column).map_or(0, |items| items.len()) as u32,
    })
}

/// Place an already-persisted item on the board according to its column's
/// insert mode. Siblings pushed down by a top insert are reported as changes;
/// the new item itself is not.
pub fn insert_new(board: &BoardState, layout: &Layout, item: Item) -> Result<Outcome> {
    let col = layout.require(&item.column)?;
    if board.get(&item.id).is_some() {
        return Err(BoardError::DuplicateItem(item.id));
    }
    let column = col.id.clone();
    let mut next = board.clone();
    let lane = next.lane_mut(&column)?;
    let at = match col.insert {
        InsertMode::Top => 0,
        InsertMode::Append => lane.items.len(),
    };
    lane.items.insert(at, item);
    next.reindex(&column)?;
    next.touch();

    let changes = changes_between(board, &next, &[column.as_str()], None);
    Ok(Outcome {
        board: next,
        changes,
    })
}

/// Remove the item with `id` and close the gap it leaves behind.
pub fn remove(board: &BoardState, id: &str) -> Result<Removal> {
    let (column, index) = board
        .locate(id)
        .ok_or_else(|| BoardError::ItemNotFound(id.to_string()))?;
    let column = column.to_string();

    let mut next = board.clone();
    let removed = next.lane_mut(&column)?.items.remove(index);
    next.reindex(&column)?;
    next.touch();

    let changes = changes_between(board, &next, &[column.as_str()], None);
    Ok(Removal {
        removed,
        outcome: Outcome {
            board: next,
            changes,
        },
    })
}

// ---------------------------------------------------------------------------
// Repair
// ---------------------------------------------------------------------------

/// Rewrite positions in every column to `0..n-1`, reporting items whose
/// stored position was different. Used after loading from the store.
pub fn normalize(board: &BoardState) -> Outcome {
    let mut next = board.clone();
    let columns: Vec<String> = board.lanes().iter().map(|l| l.column.clone()).collect();
    let mut dirty = false;
    for column in &columns {
        let needs = board
            .items(column)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .any(|(idx, item)| item.order_position as usize != idx);
        if needs {
            // Column came from the board itself, so it always exists.
            let _ = next.reindex(column);
            dirty = true;
        }
    }
    if !dirty {
        return Outcome {
            board: next,
            changes: Vec::new(),
        };
    }
    next.touch();
    let refs: Vec<&str> = columns.iter().map(String::as_str).collect();
    let changes = changes_between(board, &next, &refs, None);
    Outcome {
        board: next,
        changes,
    }
}

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

fn changes_between(
    before: &BoardState,
    after: &BoardState,
    columns: &[&str],
    moved: Option<&str>,
) -> Vec<ItemChange> {
    let mut changes = Vec::new();
    if let Some(id) = moved {
        if let Some(item) = after.get(id) {
            changes.push(ItemChange {
                item: item.clone(),
                previous_position: before.get(id).map(|i| i.order_position),
                moved: true,
            });
        }
    }
    for column in columns {
        for item in after.items(column).unwrap_or_default() {
            if Some(item.id.as_str()) == moved {
                continue;
            }
            // Items new to the board were persisted with their position already.
            let Some(previous) = before.get(&item.id).map(|i| i.order_position) else {
                continue;
            };
            if previous != item.order_position {
                changes.push(ItemChange {
                    item: item.clone(),
                    previous_position: Some(previous),
                    moved: false,
                });
            }
        }
    }
    changes
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
