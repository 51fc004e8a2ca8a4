//! PostgreSQL-backed counter store, event log and tally ledger.
//!
//! One adapter implements all three ports because a tally must touch the
//! `counters` and `counter_events` tables inside a single transaction. The
//! counter row is locked with `SELECT ... FOR UPDATE` so concurrent tallies
//! on one counter serialise while different counters proceed in parallel.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{
    CounterEventLog, CounterPersistenceError, CounterRepository, TallyLedger,
};
use crate::domain::{
    AppliedEffect, Counter, CounterEvent, CounterId, CounterPatch, CounterTitle, LogEffect,
    TallyOutcome, TallyReceipt, TallyRequest, TallySnapshot, UserId, plan_tally,
};

use super::error_mapping::{counter_diesel_error, counter_pool_error};
use super::models::{
    CounterChangeset, CounterEventRow, CounterRow, NewCounterEventRow, NewCounterRow,
};
use super::pool::DbPool;
use super::schema::{counter_events, counters};

/// Diesel-backed implementation of the counter ports.
#[derive(Clone)]
pub struct DieselCounterRepository {
    pool: DbPool,
}

impl DieselCounterRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a transaction: either Diesel or a row that does not map
/// onto the domain.
#[derive(Debug)]
enum TxError {
    Diesel(diesel::result::Error),
    Corrupt(String),
}

impl From<diesel::result::Error> for TxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

impl From<TxError> for CounterPersistenceError {
    fn from(error: TxError) -> Self {
        match error {
            TxError::Diesel(err) => counter_diesel_error(err),
            TxError::Corrupt(message) => CounterPersistenceError::query(message),
        }
    }
}

fn to_domain(row: CounterRow) -> Result<Counter, CounterPersistenceError> {
    row.into_domain().map_err(CounterPersistenceError::query)
}

fn store_count(count: u64) -> Result<i64, TxError> {
    i64::try_from(count).map_err(|_| TxError::Corrupt(format!("count {count} out of range")))
}

async fn latest_event(
    conn: &mut AsyncPgConnection,
    counter_id: i64,
) -> Result<Option<CounterEventRow>, diesel::result::Error> {
    counter_events::table
        .filter(counter_events::counter_id.eq(counter_id))
        .order((counter_events::recorded_at.desc(), counter_events::id.desc()))
        .select(CounterEventRow::as_select())
        .first(conn)
        .await
        .optional()
}

async fn insert_event(
    conn: &mut AsyncPgConnection,
    counter_id: i64,
    recorded_at: DateTime<Utc>,
) -> Result<CounterEventRow, diesel::result::Error> {
    diesel::insert_into(counter_events::table)
        .values(&NewCounterEventRow {
            counter_id,
            recorded_at,
        })
        .returning(CounterEventRow::as_returning())
        .get_result(conn)
        .await
}

async fn delete_event(
    conn: &mut AsyncPgConnection,
    event_id: i64,
) -> Result<Option<CounterEventRow>, diesel::result::Error> {
    diesel::delete(counter_events::table.find(event_id))
        .returning(CounterEventRow::as_returning())
        .get_result(conn)
        .await
        .optional()
}

async fn apply_in_transaction(
    conn: &mut AsyncPgConnection,
    request: TallyRequest,
) -> Result<TallyOutcome, TxError> {
    let counter_id = request.counter_id.get();
    let Some(row) = counters::table
        .find(counter_id)
        .select(CounterRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?
    else {
        return Ok(TallyOutcome::Missing);
    };

    let snapshot = TallySnapshot {
        counter: row.into_domain().map_err(TxError::Corrupt)?,
        latest_event: latest_event(conn, counter_id).await?.map(CounterEvent::from),
    };
    let plan = match plan_tally(&snapshot, request.caller, request.step, request.now) {
        Ok(plan) => plan,
        Err(rejection) => return Ok(TallyOutcome::Rejected(rejection)),
    };

    let effect = match plan.effect {
        LogEffect::Append { recorded_at } => {
            AppliedEffect::Appended(insert_event(conn, counter_id, recorded_at).await?.into())
        }
        LogEffect::Remove(event_id) => delete_event(conn, event_id.get())
            .await?
            .map_or(AppliedEffect::RemovedNothing, |row| {
                AppliedEffect::Removed(row.into())
            }),
        LogEffect::RemoveMissing => AppliedEffect::RemovedNothing,
        LogEffect::Unchanged => AppliedEffect::Unchanged,
    };

    if !plan.is_noop() {
        diesel::update(counters::table.find(counter_id))
            .set(counters::count.eq(store_count(plan.next_count)?))
            .execute(conn)
            .await?;
    }

    let remaining: i64 = counter_events::table
        .filter(counter_events::counter_id.eq(counter_id))
        .count()
        .get_result(conn)
        .await?;

    let mut counter = snapshot.counter;
    counter.count = plan.next_count;
    Ok(TallyOutcome::Applied(TallyReceipt {
        step: request.step,
        counter,
        effect,
        events_remaining: u64::try_from(remaining).unwrap_or_default(),
    }))
}

#[async_trait]
impl TallyLedger for DieselCounterRepository {
    async fn apply(&self, request: TallyRequest) -> Result<TallyOutcome, CounterPersistenceError> {
        let mut conn = self.pool.get().await.map_err(counter_pool_error)?;
        let outcome = conn
            .transaction(|conn| apply_in_transaction(conn, request).scope_boxed())
            .await?;
        Ok(outcome)
    }
}

#[async_trait]
impl CounterRepository for DieselCounterRepository {
    async fn create(
        &self,
        owner: UserId,
        title: &CounterTitle,
        created_at: DateTime<Utc>,
    ) -> Result<Counter, CounterPersistenceError> {
        let mut conn = self.pool.get().await.map_err(counter_pool_error)?;
        let row = diesel::insert_into(counters::table)
            .values(&NewCounterRow {
                owner_id: owner.get(),
                title: title.as_ref(),
                count: 0,
                created_at,
            })
            .returning(CounterRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(counter_diesel_error)?;
        to_domain(row)
    }

    async fn find_by_id(&self, id: CounterId) -> Result<Option<Counter>, CounterPersistenceError> {
        let mut conn = self.pool.get().await.map_err(counter_pool_error)?;
        counters::table
            .find(id.get())
            .select(CounterRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(counter_diesel_error)?
            .map(to_domain)
            .transpose()
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Counter>, CounterPersistenceError> {
        let mut conn = self.pool.get().await.map_err(counter_pool_error)?;
        counters::table
            .filter(counters::owner_id.eq(owner.get()))
            .order(counters::id.asc())
            .select(CounterRow::as_select())
            .load(&mut conn)
            .await
            .map_err(counter_diesel_error)?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn update(
        &self,
        id: CounterId,
        patch: &CounterPatch,
    ) -> Result<Option<Counter>, CounterPersistenceError> {
        if patch.is_empty() {
            return self.find_by_id(id).await;
        }
        let changeset =
            CounterChangeset::from_patch(patch).map_err(CounterPersistenceError::query)?;
        let mut conn = self.pool.get().await.map_err(counter_pool_error)?;
        diesel::update(counters::table.find(id.get()))
            .set(&changeset)
            .returning(CounterRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(counter_diesel_error)?
            .map(to_domain)
            .transpose()
    }

    async fn delete(&self, id: CounterId) -> Result<bool, CounterPersistenceError> {
        let mut conn = self.pool.get().await.map_err(counter_pool_error)?;
        let deleted = conn
            .transaction(|conn| {
                async move {
                    diesel::delete(
                        counter_events::table.filter(counter_events::counter_id.eq(id.get())),
                    )
                    .execute(conn)
                    .await?;
                    diesel::delete(counters::table.find(id.get()))
                        .execute(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(counter_diesel_error)?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl CounterEventLog for DieselCounterRepository {
    async fn append(
        &self,
        counter_id: CounterId,
        recorded_at: DateTime<Utc>,
    ) -> Result<CounterEvent, CounterPersistenceError> {
        let mut conn = self.pool.get().await.map_err(counter_pool_error)?;
        insert_event(&mut conn, counter_id.get(), recorded_at)
            .await
            .map(CounterEvent::from)
            .map_err(counter_diesel_error)
    }

    async fn remove_most_recent(
        &self,
        counter_id: CounterId,
    ) -> Result<Option<CounterEvent>, CounterPersistenceError> {
        let mut conn = self.pool.get().await.map_err(counter_pool_error)?;
        let removed = conn
            .transaction(|conn| {
                async move {
                    let Some(latest) = latest_event(conn, counter_id.get()).await? else {
                        return Ok(None);
                    };
                    delete_event(conn, latest.id).await
                }
                .scope_boxed()
            })
            .await
            .map_err(counter_diesel_error)?;
        Ok(removed.map(CounterEvent::from))
    }

    async fn list_by_counter(
        &self,
        counter_id: CounterId,
    ) -> Result<Vec<CounterEvent>, CounterPersistenceError> {
        let mut conn = self.pool.get().await.map_err(counter_pool_error)?;
        let rows = counter_events::table
            .filter(counter_events::counter_id.eq(counter_id.get()))
            .order((counter_events::recorded_at.desc(), counter_events::id.desc()))
            .select(CounterEventRow::as_select())
            .load(&mut conn)
            .await
            .map_err(counter_diesel_error)?;
        Ok(rows.into_iter().map(CounterEvent::from).collect())
    }
}
