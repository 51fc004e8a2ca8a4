//! Driving port for counter mutations.

use async_trait::async_trait;

use crate::domain::{Counter, CounterId, CounterPatch, CounterTitle, Error, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CountersCommand: Send + Sync {
    async fn create_counter(&self, caller: UserId, title: CounterTitle) -> Result<Counter, Error>;

    /// Manual correction. Does not write to the event log.
    async fn update_counter(
        &self,
        caller: UserId,
        id: CounterId,
        patch: CounterPatch,
    ) -> Result<Counter, Error>;

    async fn delete_counter(&self, caller: UserId, id: CounterId) -> Result<(), Error>;

    async fn increment(&self, caller: UserId, id: CounterId) -> Result<Counter, Error>;

    /// Floors at zero without error.
    async fn decrement(&self, caller: UserId, id: CounterId) -> Result<Counter, Error>;
}
