//! Timestamped log entries recording one increment each.

use std::fmt;

use chrono::{DateTime, Utc};

use super::CounterId;

/// Stable event identifier. Higher ids were inserted later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(i64);

impl EventId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry in a counter's event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterEvent {
    pub id: EventId,
    pub counter_id: CounterId,
    pub recorded_at: DateTime<Utc>,
}

impl CounterEvent {
    /// Ordering key for "most recent": timestamp first, then insertion order.
    pub fn recency_key(&self) -> (DateTime<Utc>, EventId) {
        (self.recorded_at, self.id)
    }
}

/// Sort events most recent first.
pub fn sort_most_recent_first(events: &mut [CounterEvent]) {
    events.sort_by(|a, b| b.recency_key().cmp(&a.recency_key()));
}
