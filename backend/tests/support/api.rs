//! Request helpers for driving the versioned API in-process.

use std::sync::Arc;

use actix_web::body::BoxBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use onemore::domain::ProvisioningPolicy;
use onemore::inbound::http::counters::CounterResponse;
use onemore::test_support::app::{api_app, in_memory_state};
use onemore::test_support::identity::StaticIdentityVerifier;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub const ALICE: &str = "alice-token";
pub const BOB: &str = "bob-token";

/// Verifier accepting the tokens of two distinct users.
pub fn two_user_verifier() -> Arc<StaticIdentityVerifier> {
    Arc::new(
        StaticIdentityVerifier::new()
            .with_identity(ALICE, "uid-alice")
            .with_identity(BOB, "uid-bob"),
    )
}

/// Initialise the in-memory application.
pub async fn init(
    verifier: Arc<StaticIdentityVerifier>,
    policy: ProvisioningPolicy,
) -> impl Service<actix_http::Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>
{
    test::init_service(api_app(in_memory_state(verifier, policy))).await
}

pub fn bearer(request: TestRequest, token: &str) -> TestRequest {
    request.insert_header(("Authorization", format!("Bearer {token}")))
}

/// Send a request and return the status with the decoded JSON body.
pub async fn send<S>(app: &S, request: TestRequest) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>,
{
    let response = test::call_service(app, request.to_request()).await;
    let status = response.status();
    let body = test::read_body(response).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON body")
    };
    (status, json)
}

/// Decode a JSON value into a DTO.
pub fn decode<T: DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).expect("DTO body")
}

pub async fn create<S>(app: &S, token: &str, title: &str) -> CounterResponse
where
    S: Service<actix_http::Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>,
{
    let request = bearer(TestRequest::post().uri("/api/v1/items"), token)
        .set_json(serde_json::json!({ "title": title }));
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    decode(body)
}

pub async fn step<S>(app: &S, token: &str, id: i64, action: &str) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>,
{
    let request = bearer(
        TestRequest::post().uri(&format!("/api/v1/items/{id}/{action}")),
        token,
    );
    send(app, request).await
}

pub async fn logs<S>(app: &S, token: &str, id: i64) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>,
{
    let request = bearer(TestRequest::get().uri(&format!("/api/v1/items/{id}/logs")), token);
    send(app, request).await
}
