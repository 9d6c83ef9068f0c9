//! Transient user-facing messages ("toasts").
//!
//! The controller pushes one notification per failed sync. Hosts either
//! poll [`NotificationCenter::active`] or subscribe to the broadcast feed.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use board_core::config::NotificationConfig;

pub const MOVE_FAILED: &str = "Could not move item. Reverting.";
pub const CREATE_FAILED: &str = "Could not create item.";
pub const ORDER_SAVE_FAILED: &str = "Could not save item order.";
pub const DELETE_FAILED: &str = "Could not delete item. Reverting.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub level: Level,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Default)]
struct Queue {
    items: VecDeque<Notification>,
    next_id: u64,
}

pub struct NotificationCenter {
    queue: Mutex<Queue>,
    capacity: usize,
    ttl: Duration,
    tx: broadcast::Sender<Notification>,
}

impl NotificationCenter {
    pub fn new(capacity: usize, ttl: std::time::Duration) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = broadcast::channel(capacity);
        Self {
            queue: Mutex::new(Queue::default()),
            capacity,
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::seconds(4)),
            tx,
        }
    }

    pub fn from_config(config: &NotificationConfig) -> Self {
        Self::new(
            config.capacity,
            std::time::Duration::from_secs(config.ttl_secs),
        )
    }

    pub fn push(&self, level: Level, message: impl Into<String>) -> Notification {
        let now = Utc::now();
        let notification = {
            let mut q = self.lock();
            q.next_id += 1;
            let n = Notification {
                id: q.next_id,
                level,
                message: message.into(),
                created_at: now,
                expires_at: now + self.ttl,
            };
            q.items.push_back(n.clone());
            while q.items.len() > self.capacity {
                q.items.pop_front();
            }
            n
        };
        match level {
            Level::Error => tracing::warn!(id = notification.id, "toast: {}", notification.message),
            Level::Info => tracing::info!(id = notification.id, "toast: {}", notification.message),
        }
        // No subscribers is fine; the queue still holds it.
        let _ = self.tx.send(notification.clone());
        notification
    }

    pub fn error(&self, message: impl Into<String>) -> Notification {
        self.push(Level::Error, message)
    }

    /// Everything still retained, expired or not, oldest first.
    pub fn all(&self) -> Vec<Notification> {
        self.lock().items.iter().cloned().collect()
    }

    pub fn active(&self, now: DateTime<Utc>) -> Vec<Notification> {
        self.lock()
            .items
            .iter()
            .filter(|n| n.is_active(now))
            .cloned()
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn dismiss(&self, id: u64) -> bool {
        let mut q = self.lock();
        let before = q.items.len();
        q.items.retain(|n| n.id != id);
        q.items.len() != before
    }

    pub fn clear(&self) {
        self.lock().items.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::from_config(&NotificationConfig::default())
    }
}
