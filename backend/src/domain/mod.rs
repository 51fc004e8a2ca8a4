//! Domain primitives, services and ports.
//!
//! Purpose: define strongly typed entities for users, counters and their
//! event logs, the tally state machine that keeps a counter and its log in
//! step, and the ports adapters implement. Nothing here knows about HTTP or
//! SQL.
//!
//! Public surface:
//! - Error / ErrorCode: transport agnostic failure payload.
//! - User, Counter, CounterEvent: entities and their identifiers.
//! - plan_tally: the increment/decrement planner.
//! - CounterService, IdentityResolver: driving port implementations.

pub mod access;
pub mod counter;
pub mod counter_event;
pub mod counter_service;
pub mod error;
pub mod identity;
pub mod identity_resolver;
pub mod ports;
pub mod tally;
pub mod trace_id;
pub mod user;

pub use self::access::{AccessDecision, authorize};
pub use self::counter::{
    COUNT_MAX, COUNTER_TITLE_MAX, Counter, CounterId, CounterPatch, CounterTitle,
    CounterValidationError,
};
pub use self::counter_event::{CounterEvent, EventId, sort_most_recent_first};
pub use self::counter_service::CounterService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity::{BearerToken, BearerTokenError, ProvisioningPolicy, VerifiedIdentity};
pub use self::identity_resolver::IdentityResolver;
pub use self::tally::{
    AppliedEffect, Divergence, LogEffect, TallyOutcome, TallyPlan, TallyReceipt, TallyRejection,
    TallyRequest, TallySnapshot, TallyStep, plan_tally,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub(crate) use self::user::normalise_profile_field;
pub use self::user::{
    EXTERNAL_IDENTITY_MAX, ExternalIdentity, NewUser, User, UserId, UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use onemore::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
