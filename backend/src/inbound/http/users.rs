//! Login handler.
//!
//! ```text
//! POST /api/v1/login {"token":"<identity provider token>"}
//! ```

use actix_web::{post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{BearerToken, BearerTokenError, Counter, Error, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::counters::CounterResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Login request body for `POST /api/v1/login`.
#[derive(Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    /// Token issued by the identity provider.
    pub token: String,
}

/// The resolved user together with the counters they own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "fixture-user")]
    pub external_identity: String,
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
    #[schema(example = "Ada Lovelace")]
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<CounterResponse>,
}

impl UserResponse {
    fn new(user: User, counters: Vec<Counter>) -> Self {
        Self {
            id: user.id().get(),
            external_identity: user.external_identity().as_ref().to_owned(),
            email: user.email().map(str::to_owned),
            display_name: user.display_name().map(str::to_owned),
            created_at: user.created_at(),
            items: counters.into_iter().map(CounterResponse::from).collect(),
        }
    }
}

fn map_login_token_error(error: BearerTokenError) -> Error {
    match error {
        BearerTokenError::Missing => Error::invalid_request("token must not be empty")
            .with_details(json!({ "field": "token", "code": "empty_value" })),
        BearerTokenError::Malformed => Error::unauthorized("invalid or expired token"),
    }
}

/// Verify an identity token and return the local user.
///
/// Unknown identities are provisioned on first login unless the server
/// requires pre-provisioned users.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid token", body = ErrorSchema),
        (status = 404, description = "No local user for this identity", body = ErrorSchema),
        (status = 503, description = "Identity provider unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let token = BearerToken::new(payload.into_inner().token).map_err(map_login_token_error)?;
    let user = state.login.resolve(&token).await?;
    let counters = state.counters_query.list_counters(user.id()).await?;
    Ok(web::Json(UserResponse::new(user, counters)))
}
