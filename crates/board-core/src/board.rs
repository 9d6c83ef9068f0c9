//! The ordered collection store: column id → ordered items.
//!
//! A [`BoardState`] is an immutable-by-convention snapshot. Operations in
//! [`crate::reorder`] take a board by reference and return a new one, so a
//! caller can keep the previous snapshot around for rollback.

use crate::error::{BoardError, Result};
use crate::item::Item;
use crate::types::Layout;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One column's items, in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub column: String,
    pub items: Vec<Item>,
    /// Bumped on every local mutation that touches this column.
    pub revision: u64,
}

impl Lane {
    fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            items: Vec::new(),
            revision: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardState {
    lanes: Vec<Lane>,
    revision: u64,
}

impl BoardState {
    /// An empty board with one lane per configured column.
    pub fn empty(layout: &Layout) -> Self {
        Self {
            lanes: layout.column_ids().map(Lane::new).collect(),
            revision: 0,
        }
    }

    /// Group `items` by column and sort each lane by
    /// `(order_position, created_date, id)`.
    ///
    /// Positions are left as loaded; gaps or duplicates coming from the
    /// store survive until [`crate::reorder::normalize`] runs.
    pub fn from_items(layout: &Layout, items: Vec<Item>) -> Result<Self> {
        let mut board = Self::empty(layout);
        let mut seen = HashSet::new();
        for item in items {
            if !seen.insert(item.id.clone()) {
                return Err(BoardError::DuplicateItem(item.id));
            }
            board.lane_mut(&item.column)?.items.push(item);
        }
        for lane in &mut board.lanes {
            lane.items.sort_by(|a, b| {
                a.order_position
                    .cmp(&b.order_position)
                    .then_with(|| a.created_date.cmp(&b.created_date))
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
        Ok(board)
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn lane(&self, column: &str) -> Option<&Lane> {
        self.lanes.iter().find(|l| l.column == column)
    }

    pub fn items(&self, column: &str) -> Option<&[Item]> {
        self.lane(column).map(|l| l.items.as_slice())
    }

    pub fn iter_items(&self) -> impl Iterator<Item = &Item> {
        self.lanes.iter().flat_map(|l| l.items.iter())
    }

    /// Column and index of the item with `id`.
    pub fn locate(&self, id: &str) -> Option<(&str, usize)> {
        self.lanes.iter().find_map(|lane| {
            lane.items
                .iter()
                .position(|i| i.id == id)
                .map(|idx| (lane.column.as_str(), idx))
        })
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.iter_items().find(|i| i.id == id)
    }

    pub fn len(&self) -> usize {
        self.lanes.iter().map(|l| l.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Continue `previous`'s revision numbering, so subscribers see a
    /// freshly loaded board as newer than anything published before it.
    pub fn succeeding(mut self, previous: &BoardState) -> Self {
        self.revision = previous.revision + 1;
        self
    }

    /// Verify that every item sits in its own column exactly once and that
    /// positions equal indices.
    pub fn check_invariants(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for lane in &self.lanes {
            for (idx, item) in lane.items.iter().enumerate() {
                if !seen.insert(item.id.as_str()) {
                    return Err(BoardError::DuplicateItem(item.id.clone()));
                }
                if item.column != lane.column {
                    return Err(BoardError::Invariant {
                        column: lane.column.clone(),
                        reason: format!("item '{}' claims column '{}'", item.id, item.column),
                    });
                }
                if item.order_position as usize != idx {
                    return Err(BoardError::Invariant {
                        column: lane.column.clone(),
                        reason: format!(
                            "item '{}' has position {} at index {idx}",
                            item.id, item.order_position
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Crate-internal mutation helpers
    // -----------------------------------------------------------------------

    pub(crate) fn lane_mut(&mut self, column: &str) -> Result<&mut Lane> {
        self.lanes
            .iter_mut()
            .find(|l| l.column == column)
            .ok_or_else(|| BoardError::UnknownColumn(column.to_string()))
    }

    /// Rewrite every position in `column` to match its index.
    pub(crate) fn reindex(&mut self, column: &str) -> Result<()> {
        let lane = self.lane_mut(column)?;
        for (idx, item) in lane.items.iter_mut().enumerate() {
            item.order_position = idx as u32;
        }
        lane.revision += 1;
        Ok(())
    }

    pub(crate) fn touch(&mut self) {
        self.revision += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
