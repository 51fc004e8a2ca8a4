//! Counter use-cases implementing the counters driving ports.
//!
//! Every counter-scoped operation loads the counter, then applies the
//! ownership guard, so a missing counter reports `not_found` and a foreign
//! one reports `forbidden`. Increments and decrements are delegated to the
//! [`TallyLedger`] which performs the guard inside its atomic unit.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::access::ensure_owner;
use crate::domain::ports::{
    CounterEventLog, CounterPersistenceError, CounterRepository, CountersCommand, CountersQuery,
    TallyLedger,
};
use crate::domain::{
    Counter, CounterEvent, CounterId, CounterPatch, CounterTitle, Divergence, Error, TallyOutcome,
    TallyReceipt, TallyRejection, TallyRequest, TallyStep, UserId,
};

/// Counter service backed by a store, an event log and a tally ledger.
#[derive(Clone)]
pub struct CounterService<R: ?Sized, E: ?Sized, L: ?Sized> {
    store: Arc<R>,
    log: Arc<E>,
    ledger: Arc<L>,
    clock: Arc<dyn Clock>,
}

impl<R: ?Sized, E: ?Sized, L: ?Sized> CounterService<R, E, L> {
    /// Create a new service.
    ///
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use mockable::DefaultClock;
    /// use onemore::domain::CounterService;
    /// use onemore::outbound::memory::InMemoryStore;
    ///
    /// let store = Arc::new(InMemoryStore::new(Arc::new(DefaultClock)));
    /// let service = CounterService::new(
    ///     store.clone(),
    ///     store.clone(),
    ///     store,
    ///     Arc::new(DefaultClock),
    /// );
    /// # let _ = service;
    /// ```
    pub fn new(store: Arc<R>, log: Arc<E>, ledger: Arc<L>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            log,
            ledger,
            clock,
        }
    }
}

fn map_counter_error(error: CounterPersistenceError) -> Error {
    match error {
        CounterPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("counter repository unavailable: {message}"))
        }
        CounterPersistenceError::Query { message } => {
            Error::internal(format!("counter repository error: {message}"))
        }
    }
}

fn counter_not_found(id: CounterId) -> Error {
    Error::not_found(format!("counter {id} not found"))
}

fn report_divergence(receipt: &TallyReceipt) {
    match receipt.divergence() {
        Some(Divergence::EmptyLogOnDecrement { count }) => warn!(
            counter_id = %receipt.counter.id,
            count,
            "InconsistentState: decrement found an empty event log"
        ),
        Some(Divergence::CountMismatch { count, events }) => warn!(
            counter_id = %receipt.counter.id,
            step = receipt.step.as_str(),
            count,
            events,
            "InconsistentState: counter value and event log size differ"
        ),
        None => {}
    }
}

impl<R, E, L> CounterService<R, E, L>
where
    R: CounterRepository + ?Sized,
    E: CounterEventLog + ?Sized,
    L: TallyLedger + ?Sized,
{
    async fn load_owned(&self, caller: UserId, id: CounterId) -> Result<Counter, Error> {
        let counter = self
            .store
            .find_by_id(id)
            .await
            .map_err(map_counter_error)?
            .ok_or_else(|| counter_not_found(id))?;
        ensure_owner(caller, counter)
    }

    async fn tally(&self, caller: UserId, id: CounterId, step: TallyStep) -> Result<Counter, Error> {
        let request = TallyRequest {
            counter_id: id,
            caller,
            step,
            now: self.clock.utc(),
        };
        let outcome = self.ledger.apply(request).await.map_err(map_counter_error)?;
        match outcome {
            TallyOutcome::Applied(receipt) => {
                report_divergence(&receipt);
                Ok(receipt.counter)
            }
            TallyOutcome::Missing => Err(counter_not_found(id)),
            TallyOutcome::Rejected(TallyRejection::Forbidden) => Err(Error::forbidden(format!(
                "counter {id} belongs to another user"
            ))),
            TallyOutcome::Rejected(TallyRejection::CountOverflow) => {
                Err(Error::invalid_request("counter cannot be incremented further"))
            }
        }
    }
}

#[async_trait]
impl<R, E, L> CountersCommand for CounterService<R, E, L>
where
    R: CounterRepository + ?Sized,
    E: CounterEventLog + ?Sized,
    L: TallyLedger + ?Sized,
{
    async fn create_counter(&self, caller: UserId, title: CounterTitle) -> Result<Counter, Error> {
        let counter = self
            .store
            .create(caller, &title, self.clock.utc())
            .await
            .map_err(map_counter_error)?;
        info!(counter_id = %counter.id, owner_id = %caller, "counter created");
        Ok(counter)
    }

    async fn update_counter(
        &self,
        caller: UserId,
        id: CounterId,
        patch: CounterPatch,
    ) -> Result<Counter, Error> {
        let current = self.load_owned(caller, id).await?;
        if patch.is_empty() {
            return Ok(current);
        }

        let updated = self
            .store
            .update(id, &patch)
            .await
            .map_err(map_counter_error)?
            .ok_or_else(|| counter_not_found(id))?;
        if updated.count != current.count {
            info!(
                counter_id = %id,
                previous = current.count,
                count = updated.count,
                "manual count update bypasses the event log"
            );
        }
        Ok(updated)
    }

    async fn delete_counter(&self, caller: UserId, id: CounterId) -> Result<(), Error> {
        self.load_owned(caller, id).await?;
        let deleted = self.store.delete(id).await.map_err(map_counter_error)?;
        if !deleted {
            return Err(counter_not_found(id));
        }
        info!(counter_id = %id, "counter deleted with its events");
        Ok(())
    }

    async fn increment(&self, caller: UserId, id: CounterId) -> Result<Counter, Error> {
        self.tally(caller, id, TallyStep::Increment).await
    }

    async fn decrement(&self, caller: UserId, id: CounterId) -> Result<Counter, Error> {
        self.tally(caller, id, TallyStep::Decrement).await
    }
}

#[async_trait]
impl<R, E, L> CountersQuery for CounterService<R, E, L>
where
    R: CounterRepository + ?Sized,
    E: CounterEventLog + ?Sized,
    L: TallyLedger + ?Sized,
{
    async fn list_counters(&self, caller: UserId) -> Result<Vec<Counter>, Error> {
        self.store
            .list_by_owner(caller)
            .await
            .map_err(map_counter_error)
    }

    async fn get_counter(&self, caller: UserId, id: CounterId) -> Result<Counter, Error> {
        self.load_owned(caller, id).await
    }

    async fn list_events(&self, caller: UserId, id: CounterId) -> Result<Vec<CounterEvent>, Error> {
        self.load_owned(caller, id).await?;
        self.log
            .list_by_counter(id)
            .await
            .map_err(map_counter_error)
    }
}

#[cfg(test)]
#[path = "counter_service_tests.rs"]
mod tests;
