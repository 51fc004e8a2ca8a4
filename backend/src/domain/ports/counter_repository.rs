//! Port for counter storage and the shared counter persistence error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Counter, CounterId, CounterPatch, CounterTitle, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by counter, event log and ledger adapters.
    pub enum CounterPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "counter repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "counter repository query failed: {message}",
    }
}

/// Counter storage.
///
/// Callers apply the ownership guard before mutating; adapters do not.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterRepository: Send + Sync {
    /// Insert a counter with count zero.
    async fn create(
        &self,
        owner: UserId,
        title: &CounterTitle,
        created_at: DateTime<Utc>,
    ) -> Result<Counter, CounterPersistenceError>;

    async fn find_by_id(&self, id: CounterId) -> Result<Option<Counter>, CounterPersistenceError>;

    /// All counters owned by `owner` in insertion order.
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Counter>, CounterPersistenceError>;

    /// Apply the present patch fields without touching the event log.
    ///
    /// Returns `None` when the counter no longer exists.
    async fn update(
        &self,
        id: CounterId,
        patch: &CounterPatch,
    ) -> Result<Option<Counter>, CounterPersistenceError>;

    /// Delete the counter together with all of its events.
    ///
    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: CounterId) -> Result<bool, CounterPersistenceError>;
}
