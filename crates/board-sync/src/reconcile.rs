//! Turning local item changes into store writes and running them concurrently.

use futures::future::join_all;

use board_core::ItemChange;

use crate::error::{StoreError, SyncError};
use crate::gateway::ItemGateway;
use crate::store::Record;

/// One remote call needed to make the store match the local board.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Update { id: String, patch: Record },
    Delete { id: String },
}

impl Write {
    pub fn id(&self) -> &str {
        match self {
            Write::Update { id, .. } | Write::Delete { id } => id,
        }
    }
}

/// One update per change, in the order the changes were reported.
pub fn plan(gateway: &ItemGateway, changes: &[ItemChange]) -> Vec<Write> {
    changes
        .iter()
        .map(|change| Write::Update {
            id: change.item.id.clone(),
            patch: gateway.patch_for(change),
        })
        .collect()
}

#[derive(Debug)]
pub struct Failure {
    pub id: String,
    pub delete: bool,
    pub error: StoreError,
}

#[derive(Debug)]
pub struct Report {
    pub total: usize,
    pub failures: Vec<Failure>,
}

impl Report {
    pub fn succeeded(&self) -> usize {
        self.total - self.failures.len()
    }

    /// `Ok(total)` only when every write landed. A failed delete is
    /// reported as [`SyncError::Delete`] even when sibling updates failed
    /// as well.
    pub fn into_result(self) -> Result<usize, SyncError> {
        let total = self.total;
        let failed = self.failures.len();
        let mut failures = self.failures;
        if let Some(pos) = failures.iter().position(|f| f.delete) {
            let f = failures.swap_remove(pos);
            return Err(SyncError::Delete {
                id: f.id,
                source: f.error,
            });
        }
        match failures.into_iter().next() {
            None => Ok(total),
            Some(first) => Err(SyncError::Reconcile {
                failed,
                total,
                first: first.error,
            }),
        }
    }
}

/// Issue every write concurrently and wait for all of them. Writes that
/// already landed are not undone when a sibling fails.
pub async fn execute(gateway: &ItemGateway, writes: Vec<Write>) -> Report {
    let total = writes.len();
    let calls = writes.into_iter().map(|write| async move {
        match write {
            Write::Update { id, patch } => {
                tracing::debug!(entity = gateway.entity(), %id, ?patch, "update");
                let result = gateway.update(&id, patch).await;
                (id, false, result)
            }
            Write::Delete { id } => {
                tracing::debug!(entity = gateway.entity(), %id, "delete");
                let result = gateway.delete(&id).await;
                (id, true, result)
            }
        }
    });

    let mut failures = Vec::new();
    for (id, delete, result) in join_all(calls).await {
        if let Err(error) = result {
            tracing::warn!(entity = gateway.entity(), %id, "write failed: {error}");
            failures.push(Failure { id, delete, error });
        }
    }
    Report { total, failures }
}
