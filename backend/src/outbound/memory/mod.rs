//! In-process adapter implementing every persistence port.
//!
//! All state sits behind one mutex, so each call (including a whole tally)
//! is atomic with respect to every other call. Used when no database is
//! configured and by tests. Data is lost on restart.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;

use crate::domain::ports::{
    CounterEventLog, CounterPersistenceError, CounterRepository, TallyLedger,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    AppliedEffect, Counter, CounterEvent, CounterId, CounterPatch, CounterTitle, EventId,
    ExternalIdentity, LogEffect, NewUser, TallyOutcome, TallyReceipt, TallyRequest,
    TallySnapshot, User, UserId, plan_tally, sort_most_recent_first,
};

#[derive(Debug, Default)]
struct MemoryState {
    last_user_id: i64,
    last_counter_id: i64,
    last_event_id: i64,
    users: Vec<User>,
    counters: BTreeMap<CounterId, Counter>,
    events: Vec<CounterEvent>,
}

impl MemoryState {
    fn latest_event(&self, counter_id: CounterId) -> Option<&CounterEvent> {
        self.events
            .iter()
            .filter(|event| event.counter_id == counter_id)
            .max_by_key(|event| event.recency_key())
    }

    fn append_event(&mut self, counter_id: CounterId, recorded_at: DateTime<Utc>) -> CounterEvent {
        self.last_event_id += 1;
        let event = CounterEvent {
            id: EventId::new(self.last_event_id),
            counter_id,
            recorded_at,
        };
        self.events.push(event.clone());
        event
    }

    fn remove_event(&mut self, id: EventId) -> Option<CounterEvent> {
        let position = self.events.iter().position(|event| event.id == id)?;
        Some(self.events.remove(position))
    }

    fn event_count(&self, counter_id: CounterId) -> u64 {
        self.events
            .iter()
            .filter(|event| event.counter_id == counter_id)
            .fold(0, |total, _| total + 1)
    }

    fn apply_tally(&mut self, request: TallyRequest) -> TallyOutcome {
        let Some(counter) = self.counters.get(&request.counter_id).cloned() else {
            return TallyOutcome::Missing;
        };
        let snapshot = TallySnapshot {
            latest_event: self.latest_event(counter.id).cloned(),
            counter,
        };
        let plan = match plan_tally(&snapshot, request.caller, request.step, request.now) {
            Ok(plan) => plan,
            Err(rejection) => return TallyOutcome::Rejected(rejection),
        };

        let effect = match plan.effect {
            LogEffect::Append { recorded_at } => {
                AppliedEffect::Appended(self.append_event(plan.counter_id, recorded_at))
            }
            LogEffect::Remove(id) => self
                .remove_event(id)
                .map_or(AppliedEffect::RemovedNothing, AppliedEffect::Removed),
            LogEffect::RemoveMissing => AppliedEffect::RemovedNothing,
            LogEffect::Unchanged => AppliedEffect::Unchanged,
        };
        let mut counter = snapshot.counter;
        counter.count = plan.next_count;
        self.counters.insert(counter.id, counter.clone());

        TallyOutcome::Applied(TallyReceipt {
            step: request.step,
            events_remaining: self.event_count(counter.id),
            counter,
            effect,
        })
    }
}

/// Mutex-guarded store for users, counters and events.
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    /// Create an empty store. The clock stamps new users.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, String> {
        self.state
            .lock()
            .map_err(|_| "memory store lock poisoned".to_owned())
    }

    fn counters(&self) -> Result<MutexGuard<'_, MemoryState>, CounterPersistenceError> {
        self.lock().map_err(CounterPersistenceError::query)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_external_identity(
        &self,
        external_identity: &ExternalIdentity,
    ) -> Result<Option<User>, UserPersistenceError> {
        let state = self.lock().map_err(UserPersistenceError::query)?;
        Ok(state
            .users
            .iter()
            .find(|user| user.external_identity() == external_identity)
            .cloned())
    }

    async fn create_if_absent(&self, user: &NewUser) -> Result<User, UserPersistenceError> {
        let mut state = self.lock().map_err(UserPersistenceError::query)?;
        if let Some(existing) = state
            .users
            .iter()
            .find(|stored| stored.external_identity() == &user.external_identity)
        {
            return Ok(existing.clone());
        }
        state.last_user_id += 1;
        let created = User::new(
            UserId::new(state.last_user_id),
            user.clone(),
            self.clock.utc(),
        );
        state.users.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl CounterRepository for InMemoryStore {
    async fn create(
        &self,
        owner: UserId,
        title: &CounterTitle,
        created_at: DateTime<Utc>,
    ) -> Result<Counter, CounterPersistenceError> {
        let mut state = self.counters()?;
        state.last_counter_id += 1;
        let counter = Counter {
            id: CounterId::new(state.last_counter_id),
            title: title.clone(),
            count: 0,
            owner_id: owner,
            created_at,
        };
        state.counters.insert(counter.id, counter.clone());
        Ok(counter)
    }

    async fn find_by_id(&self, id: CounterId) -> Result<Option<Counter>, CounterPersistenceError> {
        Ok(self.counters()?.counters.get(&id).cloned())
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Counter>, CounterPersistenceError> {
        Ok(self
            .counters()?
            .counters
            .values()
            .filter(|counter| counter.is_owned_by(owner))
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: CounterId,
        patch: &CounterPatch,
    ) -> Result<Option<Counter>, CounterPersistenceError> {
        let mut state = self.counters()?;
        let Some(stored) = state.counters.get_mut(&id) else {
            return Ok(None);
        };
        *stored = patch.apply_to(stored);
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: CounterId) -> Result<bool, CounterPersistenceError> {
        let mut state = self.counters()?;
        if state.counters.remove(&id).is_none() {
            return Ok(false);
        }
        state.events.retain(|event| event.counter_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CounterEventLog for InMemoryStore {
    async fn append(
        &self,
        counter_id: CounterId,
        recorded_at: DateTime<Utc>,
    ) -> Result<CounterEvent, CounterPersistenceError> {
        let mut state = self.counters()?;
        if !state.counters.contains_key(&counter_id) {
            return Err(CounterPersistenceError::query(format!(
                "counter {counter_id} does not exist"
            )));
        }
        Ok(state.append_event(counter_id, recorded_at))
    }

    async fn remove_most_recent(
        &self,
        counter_id: CounterId,
    ) -> Result<Option<CounterEvent>, CounterPersistenceError> {
        let mut state = self.counters()?;
        let Some(latest) = state.latest_event(counter_id).map(|event| event.id) else {
            return Ok(None);
        };
        Ok(state.remove_event(latest))
    }

    async fn list_by_counter(
        &self,
        counter_id: CounterId,
    ) -> Result<Vec<CounterEvent>, CounterPersistenceError> {
        let mut events: Vec<CounterEvent> = self
            .counters()?
            .events
            .iter()
            .filter(|event| event.counter_id == counter_id)
            .cloned()
            .collect();
        sort_most_recent_first(&mut events);
        Ok(events)
    }
}

#[async_trait]
impl TallyLedger for InMemoryStore {
    async fn apply(&self, request: TallyRequest) -> Result<TallyOutcome, CounterPersistenceError> {
        Ok(self.counters()?.apply_tally(request))
    }
}

#[cfg(test)]
mod tests;
