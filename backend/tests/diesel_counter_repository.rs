//! PostgreSQL adapter behaviour.
//!
//! Runs only when `ONEMORE_TEST_DATABASE_URL` points at a disposable
//! database; otherwise each test logs a skip and returns.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use mockable::{Clock, DefaultClock};
use onemore::domain::ports::{CounterEventLog, CounterRepository, TallyLedger, UserRepository};
use onemore::domain::{
    CounterPatch, CounterTitle, ExternalIdentity, NewUser, TallyOutcome, TallyRejection,
    TallyRequest, TallyStep, User, UserId,
};
use onemore::outbound::persistence::{
    DbPool, DieselCounterRepository, DieselUserRepository, PoolConfig, run_pending_migrations,
};
use uuid::Uuid;

const DATABASE_URL_VAR: &str = "ONEMORE_TEST_DATABASE_URL";

struct Harness {
    users: DieselUserRepository,
    counters: Arc<DieselCounterRepository>,
}

async fn harness() -> Option<Harness> {
    let Ok(url) = std::env::var(DATABASE_URL_VAR) else {
        eprintln!("SKIP-TEST-CLUSTER: {DATABASE_URL_VAR} not set");
        return None;
    };
    run_pending_migrations(&url).await.expect("migrations apply");
    let pool = DbPool::new(PoolConfig::new(url).with_max_size(8))
        .await
        .expect("pool builds");
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    Some(Harness {
        users: DieselUserRepository::new(pool.clone(), clock),
        counters: Arc::new(DieselCounterRepository::new(pool)),
    })
}

async fn fresh_user(users: &DieselUserRepository) -> User {
    let uid = ExternalIdentity::new(format!("test-{}", Uuid::new_v4())).expect("valid uid");
    users
        .create_if_absent(&NewUser::new(uid, None, Some("Tester".to_owned())))
        .await
        .expect("user created")
}

fn tally(counter: onemore::domain::CounterId, caller: UserId, step: TallyStep) -> TallyRequest {
    TallyRequest {
        counter_id: counter,
        caller,
        step,
        now: Utc::now(),
    }
}

#[tokio::test]
async fn create_if_absent_returns_the_existing_row() {
    let Some(h) = harness().await else { return };
    let user = fresh_user(&h.users).await;
    let profile = NewUser::new(user.external_identity().clone(), None, None);

    let again = h.users.create_if_absent(&profile).await.expect("idempotent");
    assert_eq!(again.id(), user.id());
    assert_eq!(again.display_name(), Some("Tester"));
}

#[tokio::test]
async fn tallies_keep_count_and_log_in_step() {
    let Some(h) = harness().await else { return };
    let user = fresh_user(&h.users).await;
    let title = CounterTitle::new("Coffee").expect("valid title");
    let counter = h
        .counters
        .create(user.id(), &title, Utc::now())
        .await
        .expect("counter created");

    for _ in 0..3 {
        h.counters
            .apply(tally(counter.id, user.id(), TallyStep::Increment))
            .await
            .expect("increment");
    }
    let outcome = h
        .counters
        .apply(tally(counter.id, user.id(), TallyStep::Decrement))
        .await
        .expect("decrement");
    let TallyOutcome::Applied(receipt) = outcome else {
        panic!("expected an applied tally, got {outcome:?}");
    };
    assert_eq!(receipt.counter.count, 2);
    assert_eq!(receipt.events_remaining, 2);
    assert_eq!(
        h.counters.list_by_counter(counter.id).await.expect("events").len(),
        2
    );
}

#[tokio::test]
async fn foreign_caller_is_rejected_inside_the_transaction() {
    let Some(h) = harness().await else { return };
    let owner = fresh_user(&h.users).await;
    let stranger = fresh_user(&h.users).await;
    let title = CounterTitle::new("Mine").expect("valid title");
    let counter = h
        .counters
        .create(owner.id(), &title, Utc::now())
        .await
        .expect("counter created");

    let outcome = h
        .counters
        .apply(tally(counter.id, stranger.id(), TallyStep::Increment))
        .await
        .expect("tally runs");
    assert_eq!(outcome, TallyOutcome::Rejected(TallyRejection::Forbidden));
}

#[tokio::test]
async fn manual_update_and_delete_cascade() {
    let Some(h) = harness().await else { return };
    let user = fresh_user(&h.users).await;
    let title = CounterTitle::new("Steps").expect("valid title");
    let counter = h
        .counters
        .create(user.id(), &title, Utc::now())
        .await
        .expect("counter created");
    h.counters
        .apply(tally(counter.id, user.id(), TallyStep::Increment))
        .await
        .expect("increment");

    let patch = CounterPatch::try_new(Some("Stairs"), Some(7)).expect("valid patch");
    let updated = h
        .counters
        .update(counter.id, &patch)
        .await
        .expect("update")
        .expect("counter exists");
    assert_eq!((updated.title.as_ref(), updated.count), ("Stairs", 7));
    assert_eq!(
        h.counters.list_by_counter(counter.id).await.expect("events").len(),
        1
    );

    assert!(h.counters.delete(counter.id).await.expect("delete"));
    assert!(h.counters.find_by_id(counter.id).await.expect("lookup").is_none());
    assert!(
        h.counters
            .list_by_counter(counter.id)
            .await
            .expect("events")
            .is_empty()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_serialise_on_the_row_lock() {
    let Some(h) = harness().await else { return };
    let user = fresh_user(&h.users).await;
    let title = CounterTitle::new("Reps").expect("valid title");
    let counter = h
        .counters
        .create(user.id(), &title, Utc::now())
        .await
        .expect("counter created");

    let handles = (0..16).map(|_| {
        let counters = Arc::clone(&h.counters);
        let request = tally(counter.id, user.id(), TallyStep::Increment);
        tokio::spawn(async move { counters.apply(request).await })
    });
    for joined in join_all(handles).await {
        joined.expect("task joins").expect("increment");
    }

    let stored = h
        .counters
        .find_by_id(counter.id)
        .await
        .expect("lookup")
        .expect("counter exists");
    assert_eq!(stored.count, 16);
    assert_eq!(
        h.counters.list_by_counter(counter.id).await.expect("events").len(),
        16
    );
}
