//! Behaviour of the in-memory adapter.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::{TallyRejection, TallyStep};

const OWNER: UserId = UserId::new(1);

fn at(second: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0)
        .single()
        .expect("valid time")
        + Duration::seconds(second)
}

#[fixture]
fn store() -> InMemoryStore {
    InMemoryStore::new(Arc::new(DefaultClock))
}

async fn seeded_counter(store: &InMemoryStore) -> Counter {
    let title = CounterTitle::new("Coffee").expect("valid title");
    CounterRepository::create(store, OWNER, &title, at(0))
        .await
        .expect("create counter")
}

fn request(counter_id: CounterId, step: TallyStep, second: i64) -> TallyRequest {
    TallyRequest {
        counter_id,
        caller: OWNER,
        step,
        now: at(second),
    }
}

#[rstest]
#[tokio::test]
async fn create_if_absent_is_idempotent_per_identity(store: InMemoryStore) {
    let uid = ExternalIdentity::new("uid-1").expect("valid uid");
    let profile = NewUser::new(uid.clone(), None, Some("Ada".to_owned()));
    let first = store.create_if_absent(&profile).await.expect("create");
    let second = store.create_if_absent(&profile).await.expect("create again");
    assert_eq!(first.id(), second.id());

    let found = store
        .find_by_external_identity(&uid)
        .await
        .expect("lookup")
        .expect("user exists");
    assert_eq!(found, first);
}

#[rstest]
#[tokio::test]
async fn remove_most_recent_breaks_timestamp_ties_by_id(store: InMemoryStore) {
    let counter = seeded_counter(&store).await;
    let first = store.append(counter.id, at(5)).await.expect("append");
    let second = store.append(counter.id, at(5)).await.expect("append");

    let removed = store
        .remove_most_recent(counter.id)
        .await
        .expect("remove")
        .expect("an event was removed");
    assert_eq!(removed.id, second.id);

    let remaining = store.list_by_counter(counter.id).await.expect("list");
    assert_eq!(remaining, vec![first]);
}

#[rstest]
#[tokio::test]
async fn remove_most_recent_on_empty_log_returns_none(store: InMemoryStore) {
    let counter = seeded_counter(&store).await;
    let removed = store.remove_most_recent(counter.id).await.expect("remove");
    assert!(removed.is_none());
}

#[rstest]
#[tokio::test]
async fn list_by_counter_is_most_recent_first(store: InMemoryStore) {
    let counter = seeded_counter(&store).await;
    store.append(counter.id, at(3)).await.expect("append");
    store.append(counter.id, at(1)).await.expect("append");
    store.append(counter.id, at(2)).await.expect("append");

    let stamps: Vec<DateTime<Utc>> = store
        .list_by_counter(counter.id)
        .await
        .expect("list")
        .into_iter()
        .map(|event| event.recorded_at)
        .collect();
    assert_eq!(stamps, vec![at(3), at(2), at(1)]);
}

#[rstest]
#[tokio::test]
async fn delete_cascades_events(store: InMemoryStore) {
    let counter = seeded_counter(&store).await;
    for second in 1..=3 {
        store
            .apply(request(counter.id, TallyStep::Increment, second))
            .await
            .expect("tally");
    }
    assert!(store.delete(counter.id).await.expect("delete"));
    assert!(store.find_by_id(counter.id).await.expect("lookup").is_none());
    assert!(store.list_by_counter(counter.id).await.expect("list").is_empty());
    assert!(!store.delete(counter.id).await.expect("second delete"));
}

#[rstest]
#[tokio::test]
async fn tally_keeps_count_and_log_in_step(store: InMemoryStore) {
    let counter = seeded_counter(&store).await;
    for second in 1..=3 {
        store
            .apply(request(counter.id, TallyStep::Increment, second))
            .await
            .expect("tally");
    }
    let outcome = store
        .apply(request(counter.id, TallyStep::Decrement, 4))
        .await
        .expect("tally");

    let TallyOutcome::Applied(receipt) = outcome else {
        panic!("expected an applied tally, got {outcome:?}");
    };
    assert_eq!(receipt.counter.count, 2);
    assert_eq!(receipt.events_remaining, 2);
    assert!(matches!(receipt.effect, AppliedEffect::Removed(ref event) if event.recorded_at == at(3)));
    assert_eq!(receipt.divergence(), None);
}

#[rstest]
#[tokio::test]
async fn tally_reports_missing_and_forbidden(store: InMemoryStore) {
    let counter = seeded_counter(&store).await;
    let missing = store
        .apply(request(CounterId::new(999), TallyStep::Increment, 1))
        .await
        .expect("tally");
    assert_eq!(missing, TallyOutcome::Missing);

    let foreign = store
        .apply(TallyRequest {
            caller: UserId::new(77),
            ..request(counter.id, TallyStep::Increment, 1)
        })
        .await
        .expect("tally");
    assert_eq!(foreign, TallyOutcome::Rejected(TallyRejection::Forbidden));
    assert_eq!(
        store
            .find_by_id(counter.id)
            .await
            .expect("lookup")
            .map(|c| c.count),
        Some(0)
    );
}

#[rstest]
#[tokio::test]
async fn manual_update_leaves_log_untouched(store: InMemoryStore) {
    let counter = seeded_counter(&store).await;
    for second in 1..=5 {
        store
            .apply(request(counter.id, TallyStep::Increment, second))
            .await
            .expect("tally");
    }
    let patch = CounterPatch::try_new(None, Some(2)).expect("valid patch");
    let updated = store
        .update(counter.id, &patch)
        .await
        .expect("update")
        .expect("counter exists");
    assert_eq!(updated.count, 2);
    assert_eq!(store.list_by_counter(counter.id).await.expect("list").len(), 5);

    let outcome = store
        .apply(request(counter.id, TallyStep::Decrement, 6))
        .await
        .expect("tally");
    let TallyOutcome::Applied(receipt) = outcome else {
        panic!("expected an applied tally, got {outcome:?}");
    };
    assert_eq!(receipt.counter.count, 1);
    assert_eq!(receipt.events_remaining, 4);
    assert_eq!(
        receipt.divergence(),
        Some(crate::domain::Divergence::CountMismatch { count: 1, events: 4 })
    );
}

#[rstest]
#[tokio::test]
async fn list_by_owner_filters_other_users(store: InMemoryStore) {
    let mine = seeded_counter(&store).await;
    let title = CounterTitle::new("Tea").expect("valid title");
    CounterRepository::create(&store, UserId::new(2), &title, at(1))
        .await
        .expect("create");

    let listed = store.list_by_owner(OWNER).await.expect("list");
    assert_eq!(listed, vec![mine]);
}
