//! Port for a counter's append-only event log.
//!
//! Plain increments and decrements go through
//! [`super::TallyLedger`] so the log moves together with the count. The
//! operations here are the individual log primitives.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{CounterEvent, CounterId};

use super::CounterPersistenceError;

/// Raw access to a counter's events.
///
/// Tallies must go through [`super::TallyLedger`]. `append` and
/// `remove_most_recent` do not lock the counter row and leave `count`
/// untouched, so using them for a tally lets the count and the log drift.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterEventLog: Send + Sync {
    /// Insert one event stamped `recorded_at`. Not for tallies.
    async fn append(
        &self,
        counter_id: CounterId,
        recorded_at: DateTime<Utc>,
    ) -> Result<CounterEvent, CounterPersistenceError>;

    /// Delete the event with the greatest `(recorded_at, id)` and return it.
    /// Not for tallies.
    async fn remove_most_recent(
        &self,
        counter_id: CounterId,
    ) -> Result<Option<CounterEvent>, CounterPersistenceError>;

    /// Events for the counter, most recent first.
    async fn list_by_counter(
        &self,
        counter_id: CounterId,
    ) -> Result<Vec<CounterEvent>, CounterPersistenceError>;
}
