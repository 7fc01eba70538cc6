use std::collections::VecDeque;

use chrono::{DateTime, Duration, FixedOffset};
use serde::Serialize;

pub const DEFAULT_CAPACITY: usize = 5;
pub const DEFAULT_TTL_MS: i64 = 5000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Xp,
    Achievement,
    Level,
    Streak,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub timestamp: DateTime<FixedOffset>,
}

/// Newest-first toast queue. Holds at most `capacity` entries and drops each
/// one `ttl` after it was pushed, independently of the others.
#[derive(Debug)]
pub struct NotificationQueue {
    entries: VecDeque<Notification>,
    capacity: usize,
    ttl: Duration,
    next_id: u64,
}

impl NotificationQueue {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            ttl,
            next_id: 1,
        }
    }

    pub fn push(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        now: DateTime<FixedOffset>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_front(Notification {
            id,
            message: message.into(),
            kind,
            timestamp: now,
        });
        self.entries.truncate(self.capacity);
        id
    }

    /// Drop every notification whose TTL has elapsed. Returns how many were removed.
    pub fn expire(&mut self, now: DateTime<FixedOffset>) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|n| n.timestamp + ttl > now);
        before - self.entries.len()
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|n| n.id != id);
        before != self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Notifications still within their TTL at `now`, newest first.
    pub fn recent(&self, now: DateTime<FixedOffset>) -> Vec<Notification> {
        self.entries
            .iter()
            .filter(|n| n.timestamp + self.ttl > now)
            .cloned()
            .collect()
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, Duration::milliseconds(DEFAULT_TTL_MS))
    }
}
