use chrono::{DateTime, Duration, FixedOffset};

use crate::store::schema::{ACHIEVEMENTS_KEY, USER_STATS_KEY};

/// Logical records the engine persists, each debounced independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Record {
    UserStats,
    Achievements,
}

impl Record {
    pub fn key(self) -> &'static str {
        match self {
            Record::UserStats => USER_STATS_KEY,
            Record::Achievements => ACHIEVEMENTS_KEY,
        }
    }

    pub fn all() -> &'static [Record] {
        &[Record::UserStats, Record::Achievements]
    }
}

/// Trailing-edge debounce over a fixed set of records.
///
/// Every `mark_dirty` re-arms the record's deadline, so a burst of mutations
/// produces one write once the burst has been idle for `window`.
#[derive(Debug)]
pub struct WriteCoalescer {
    window: Duration,
    deadlines: [Option<DateTime<FixedOffset>>; 2],
}

impl WriteCoalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadlines: [None, None],
        }
    }

    fn slot(record: Record) -> usize {
        match record {
            Record::UserStats => 0,
            Record::Achievements => 1,
        }
    }

    pub fn mark_dirty(&mut self, record: Record, now: DateTime<FixedOffset>) {
        self.deadlines[Self::slot(record)] = Some(now + self.window);
    }

    /// Remove and return the records whose idle window has elapsed.
    pub fn take_due(&mut self, now: DateTime<FixedOffset>) -> Vec<Record> {
        let mut due = Vec::new();
        for &record in Record::all() {
            let slot = &mut self.deadlines[Self::slot(record)];
            if slot.is_some_and(|deadline| deadline <= now) {
                *slot = None;
                due.push(record);
            }
        }
        due
    }

    /// Remove and return every pending record regardless of deadline.
    pub fn take_all(&mut self) -> Vec<Record> {
        let mut pending = Vec::new();
        for &record in Record::all() {
            if self.deadlines[Self::slot(record)].take().is_some() {
                pending.push(record);
            }
        }
        pending
    }
}
