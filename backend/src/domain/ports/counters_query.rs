//! Driving port for counter reads.

use async_trait::async_trait;

use crate::domain::{Counter, CounterEvent, CounterId, Error, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CountersQuery: Send + Sync {
    /// Counters owned by the caller.
    async fn list_counters(&self, caller: UserId) -> Result<Vec<Counter>, Error>;

    async fn get_counter(&self, caller: UserId, id: CounterId) -> Result<Counter, Error>;

    /// Event log for one of the caller's counters, most recent first.
    async fn list_events(&self, caller: UserId, id: CounterId) -> Result<Vec<CounterEvent>, Error>;
}
