//! Counter ("item") API handlers.
//!
//! ```text
//! GET    /api/v1/items
//! POST   /api/v1/items {"title":"Coffee"}
//! GET    /api/v1/items/{id}
//! PUT    /api/v1/items/{id} {"title":"Tea","count":2}
//! DELETE /api/v1/items/{id}
//! POST   /api/v1/items/{id}/increment
//! POST   /api/v1/items/{id}/decrement
//! GET    /api/v1/items/{id}/logs
//! ```
//!
//! Every route requires a bearer credential. Counter-scoped routes return
//! `404` for unknown ids and `403` for counters owned by someone else.

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Counter, CounterEvent, CounterId, CounterPatch, CounterTitle, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    ID, map_counter_validation_error, parse_count, parse_counter_id,
};

/// Counter representation returned by every counter endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CounterResponse {
    #[schema(example = 7)]
    pub id: i64,
    #[schema(example = "Coffee")]
    pub title: String,
    #[schema(example = 3)]
    pub count: u64,
    #[schema(example = 1)]
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Counter> for CounterResponse {
    fn from(counter: Counter) -> Self {
        Self {
            id: counter.id.get(),
            title: counter.title.as_ref().to_owned(),
            count: counter.count,
            owner_id: counter.owner_id.get(),
            created_at: counter.created_at,
        }
    }
}

/// One logged increment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    #[schema(example = 31)]
    pub id: i64,
    #[schema(example = 7)]
    pub counter_id: i64,
    pub timestamp: DateTime<Utc>,
}

impl From<CounterEvent> for EventResponse {
    fn from(event: CounterEvent) -> Self {
        Self {
            id: event.id.get(),
            counter_id: event.counter_id.get(),
            timestamp: event.recorded_at,
        }
    }
}

/// Request body for `POST /api/v1/items`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateCounterRequest {
    #[schema(example = "Coffee")]
    pub title: String,
}

/// Request body for `PUT /api/v1/items/{id}`.
///
/// Absent fields are left unchanged. Setting `count` does not touch the
/// event log.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateCounterRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub count: Option<i64>,
}

impl TryFrom<UpdateCounterRequest> for CounterPatch {
    type Error = Error;

    fn try_from(value: UpdateCounterRequest) -> Result<Self, Self::Error> {
        let count = parse_count(value.count)?;
        CounterPatch::try_new(value.title.as_deref(), count).map_err(map_counter_validation_error)
    }
}

/// Confirmation returned by `DELETE /api/v1/items/{id}`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct DeletedResponse {
    #[schema(example = "counter 7 deleted")]
    pub message: String,
}

fn counter_id(path: web::Path<String>) -> Result<CounterId, Error> {
    parse_counter_id(&path.into_inner(), ID)
}

/// List the caller's counters in creation order.
#[utoipa::path(
    get,
    path = "/api/v1/items",
    responses(
        (status = 200, description = "Counters owned by the caller", body = [CounterResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "listItems"
)]
#[get("/items")]
pub async fn list_counters(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<CounterResponse>>> {
    let counters = state.counters_query.list_counters(caller.0.id()).await?;
    Ok(web::Json(counters.into_iter().map(CounterResponse::from).collect()))
}

/// Create a counter starting at zero.
#[utoipa::path(
    post,
    path = "/api/v1/items",
    request_body = CreateCounterRequest,
    responses(
        (status = 201, description = "Counter created", body = CounterResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "createItem"
)]
#[post("/items")]
pub async fn create_counter(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    payload: web::Json<CreateCounterRequest>,
) -> ApiResult<HttpResponse> {
    let title =
        CounterTitle::new(&payload.into_inner().title).map_err(map_counter_validation_error)?;
    let counter = state.counters.create_counter(caller.0.id(), title).await?;
    Ok(HttpResponse::Created().json(CounterResponse::from(counter)))
}

/// Fetch one counter.
#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    params(("id" = i64, Path, description = "Counter identifier")),
    responses(
        (status = 200, description = "Counter", body = CounterResponse),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Owned by another user", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "getItem"
)]
#[get("/items/{id}")]
pub async fn get_counter(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<CounterResponse>> {
    let id = counter_id(path)?;
    let counter = state.counters_query.get_counter(caller.0.id(), id).await?;
    Ok(web::Json(counter.into()))
}

/// Manually set the title and/or count.
///
/// This is a correction path: a changed count is stored as-is and the event
/// log is left untouched, so the two may diverge afterwards.
#[utoipa::path(
    put,
    path = "/api/v1/items/{id}",
    params(("id" = i64, Path, description = "Counter identifier")),
    request_body = UpdateCounterRequest,
    responses(
        (status = 200, description = "Counter updated", body = CounterResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Owned by another user", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "updateItem"
)]
#[put("/items/{id}")]
pub async fn update_counter(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<UpdateCounterRequest>,
) -> ApiResult<web::Json<CounterResponse>> {
    let id = counter_id(path)?;
    let patch = CounterPatch::try_from(payload.into_inner())?;
    let counter = state
        .counters
        .update_counter(caller.0.id(), id, patch)
        .await?;
    Ok(web::Json(counter.into()))
}

/// Delete a counter and its event log.
#[utoipa::path(
    delete,
    path = "/api/v1/items/{id}",
    params(("id" = i64, Path, description = "Counter identifier")),
    responses(
        (status = 200, description = "Counter deleted", body = DeletedResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Owned by another user", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "deleteItem"
)]
#[delete("/items/{id}")]
pub async fn delete_counter(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<DeletedResponse>> {
    let id = counter_id(path)?;
    state.counters.delete_counter(caller.0.id(), id).await?;
    Ok(web::Json(DeletedResponse {
        message: format!("counter {id} deleted"),
    }))
}

/// Add one to the count and log the increment.
#[utoipa::path(
    post,
    path = "/api/v1/items/{id}/increment",
    params(("id" = i64, Path, description = "Counter identifier")),
    responses(
        (status = 200, description = "Counter incremented", body = CounterResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Owned by another user", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "incrementItem"
)]
#[post("/items/{id}/increment")]
pub async fn increment(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<CounterResponse>> {
    let id = counter_id(path)?;
    let counter = state.counters.increment(caller.0.id(), id).await?;
    Ok(web::Json(counter.into()))
}

/// Subtract one and drop the most recent log entry. A zero count is
/// returned unchanged.
#[utoipa::path(
    post,
    path = "/api/v1/items/{id}/decrement",
    params(("id" = i64, Path, description = "Counter identifier")),
    responses(
        (status = 200, description = "Counter decremented or already zero", body = CounterResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Owned by another user", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "decrementItem"
)]
#[post("/items/{id}/decrement")]
pub async fn decrement(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<CounterResponse>> {
    let id = counter_id(path)?;
    let counter = state.counters.decrement(caller.0.id(), id).await?;
    Ok(web::Json(counter.into()))
}

/// List logged increments, most recent first.
#[utoipa::path(
    get,
    path = "/api/v1/items/{id}/logs",
    params(("id" = i64, Path, description = "Counter identifier")),
    responses(
        (status = 200, description = "Event log", body = [EventResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Owned by another user", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "listItemLogs"
)]
#[get("/items/{id}/logs")]
pub async fn list_events(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<EventResponse>>> {
    let id = counter_id(path)?;
    let events = state.counters_query.list_events(caller.0.id(), id).await?;
    Ok(web::Json(events.into_iter().map(EventResponse::from).collect()))
}

#[cfg(test)]
#[path = "counters_tests.rs"]
mod tests;
