//! End-to-end behaviour of the counter API over the in-memory store.
//!
//! Each test drives the real handlers, services and adapter through the
//! versioned scope, authenticating with canned identity tokens.

#[path = "support/api.rs"]
mod api;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use api::{ALICE, BOB, bearer, create, decode, init, logs, send, step, two_user_verifier};
use onemore::domain::ProvisioningPolicy;
use onemore::inbound::http::counters::{CounterResponse, EventResponse};
use onemore::inbound::http::users::UserResponse;
use rstest::rstest;
use serde_json::json;

#[actix_web::test]
async fn first_login_provisions_user_and_later_logins_list_counters() {
    let app = init(two_user_verifier(), ProvisioningPolicy::AutoProvision).await;

    let login = || TestRequest::post().uri("/api/v1/login").set_json(json!({ "token": ALICE }));
    let (status, body) = send(&app, login()).await;
    assert_eq!(status, StatusCode::OK);
    let first: UserResponse = decode(body);
    assert_eq!(first.external_identity, "uid-alice");
    assert!(first.items.is_empty());

    let counter = create(&app, ALICE, "Water").await;
    let (_, body) = send(&app, login()).await;
    let second: UserResponse = decode(body);
    assert_eq!(second.id, first.id);
    assert_eq!(second.items, vec![counter]);
}

#[actix_web::test]
async fn increments_append_events_newest_first() {
    let app = init(two_user_verifier(), ProvisioningPolicy::AutoProvision).await;
    let counter = create(&app, ALICE, "Push-ups").await;
    assert_eq!(counter.count, 0);

    for expected in 1..=3 {
        let (status, body) = step(&app, ALICE, counter.id, "increment").await;
        assert_eq!(status, StatusCode::OK);
        let updated: CounterResponse = decode(body);
        assert_eq!(updated.count, expected);
    }

    let (status, body) = logs(&app, ALICE, counter.id).await;
    assert_eq!(status, StatusCode::OK);
    let events: Vec<EventResponse> = decode(body);
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|event| event.counter_id == counter.id));
    assert!(
        events
            .windows(2)
            .all(|pair| (pair[0].timestamp, pair[0].id) > (pair[1].timestamp, pair[1].id))
    );
}

#[actix_web::test]
async fn decrement_removes_latest_event_and_stops_at_zero() {
    let app = init(two_user_verifier(), ProvisioningPolicy::AutoProvision).await;
    let counter = create(&app, ALICE, "Coffee").await;
    step(&app, ALICE, counter.id, "increment").await;
    step(&app, ALICE, counter.id, "increment").await;
    let (_, body) = logs(&app, ALICE, counter.id).await;
    let before: Vec<EventResponse> = decode(body);

    let (status, body) = step(&app, ALICE, counter.id, "decrement").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode::<CounterResponse>(body).count, 1);
    let (_, body) = logs(&app, ALICE, counter.id).await;
    let after: Vec<EventResponse> = decode(body);
    assert_eq!(after, before[1..].to_vec());

    step(&app, ALICE, counter.id, "decrement").await;
    let (status, body) = step(&app, ALICE, counter.id, "decrement").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode::<CounterResponse>(body).count, 0);
    let (_, body) = logs(&app, ALICE, counter.id).await;
    assert!(decode::<Vec<EventResponse>>(body).is_empty());
}

#[actix_web::test]
async fn manual_update_sets_count_without_touching_logs() {
    let app = init(two_user_verifier(), ProvisioningPolicy::AutoProvision).await;
    let counter = create(&app, ALICE, "Steps").await;
    step(&app, ALICE, counter.id, "increment").await;

    let request = bearer(
        TestRequest::put().uri(&format!("/api/v1/items/{}", counter.id)),
        ALICE,
    )
    .set_json(json!({ "title": "Stairs", "count": 10 }));
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let updated: CounterResponse = decode(body);
    assert_eq!((updated.title.as_str(), updated.count), ("Stairs", 10));

    let (_, body) = logs(&app, ALICE, counter.id).await;
    assert_eq!(decode::<Vec<EventResponse>>(body).len(), 1);

    let (_, body) = step(&app, ALICE, counter.id, "decrement").await;
    assert_eq!(decode::<CounterResponse>(body).count, 9);
    let (_, body) = logs(&app, ALICE, counter.id).await;
    assert!(decode::<Vec<EventResponse>>(body).is_empty());
}

#[actix_web::test]
async fn delete_removes_counter_and_its_log() {
    let app = init(two_user_verifier(), ProvisioningPolicy::AutoProvision).await;
    let counter = create(&app, ALICE, "Tea").await;
    step(&app, ALICE, counter.id, "increment").await;

    let request = bearer(
        TestRequest::delete().uri(&format!("/api/v1/items/{}", counter.id)),
        ALICE,
    );
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], format!("counter {} deleted", counter.id));

    let (status, body) = logs(&app, ALICE, counter.id).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[rstest]
#[case("increment")]
#[case("decrement")]
#[case("logs")]
#[actix_web::test]
async fn foreign_counters_are_forbidden_and_untouched(#[case] action: &str) {
    let app = init(two_user_verifier(), ProvisioningPolicy::AutoProvision).await;
    let counter = create(&app, ALICE, "Private").await;
    step(&app, ALICE, counter.id, "increment").await;

    let (status, body) = if action == "logs" {
        logs(&app, BOB, counter.id).await
    } else {
        step(&app, BOB, counter.id, action).await
    };
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let request = bearer(
        TestRequest::get().uri(&format!("/api/v1/items/{}", counter.id)),
        ALICE,
    );
    let (_, body) = send(&app, request).await;
    assert_eq!(decode::<CounterResponse>(body).count, 1);
}

#[actix_web::test]
async fn listing_is_scoped_to_the_caller() {
    let app = init(two_user_verifier(), ProvisioningPolicy::AutoProvision).await;
    let mine = create(&app, ALICE, "Mine").await;
    create(&app, BOB, "Theirs").await;

    let (status, body) = send(&app, bearer(TestRequest::get().uri("/api/v1/items"), ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode::<Vec<CounterResponse>>(body), vec![mine]);
}

#[actix_web::test]
async fn missing_counter_is_not_found_even_for_strangers() {
    let app = init(two_user_verifier(), ProvisioningPolicy::AutoProvision).await;
    let (status, body) = step(&app, BOB, 4242, "increment").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[rstest]
#[case(None, "missing bearer token")]
#[case(Some("Bearer nobody"), "invalid or expired token")]
#[case(Some("Basic abc"), "malformed authorization header")]
#[actix_web::test]
async fn unauthenticated_requests_are_rejected(
    #[case] header: Option<&str>,
    #[case] message: &str,
) {
    let app = init(two_user_verifier(), ProvisioningPolicy::AutoProvision).await;
    let mut request = TestRequest::get().uri("/api/v1/items");
    if let Some(value) = header {
        request = request.insert_header(("Authorization", value));
    }
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
    assert_eq!(body["message"], message);
}

#[actix_web::test]
async fn provider_outage_is_reported_as_unavailable() {
    let verifier = two_user_verifier();
    let app = init(verifier.clone(), ProvisioningPolicy::AutoProvision).await;
    verifier.set_unavailable(true);

    let (status, body) = send(&app, bearer(TestRequest::get().uri("/api/v1/items"), ALICE)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "service_unavailable");
    assert_eq!(body["message"], "Service temporarily unavailable");
}

#[actix_web::test]
async fn require_existing_policy_refuses_unknown_identities() {
    let app = init(two_user_verifier(), ProvisioningPolicy::RequireExisting).await;
    let request = TestRequest::post()
        .uri("/api/v1/login")
        .set_json(json!({ "token": ALICE }));
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}
