//! Ownership guard for counter-scoped operations.

use super::{Counter, Error, UserId};

/// Result of checking a caller against a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Forbidden,
}

/// Allow access iff the caller owns the counter.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use onemore::domain::{AccessDecision, Counter, CounterId, CounterTitle, UserId, authorize};
///
/// let counter = Counter {
///     id: CounterId::new(1),
///     title: CounterTitle::new("Coffee").unwrap(),
///     count: 0,
///     owner_id: UserId::new(1),
///     created_at: Utc::now(),
/// };
/// assert_eq!(authorize(UserId::new(1), &counter), AccessDecision::Allowed);
/// assert_eq!(authorize(UserId::new(2), &counter), AccessDecision::Forbidden);
/// ```
pub fn authorize(caller: UserId, counter: &Counter) -> AccessDecision {
    if counter.is_owned_by(caller) {
        AccessDecision::Allowed
    } else {
        AccessDecision::Forbidden
    }
}

/// Error returned to callers that do not own the counter.
pub(crate) fn forbidden_error(counter: &Counter) -> Error {
    Error::forbidden(format!("counter {} belongs to another user", counter.id))
}

/// Apply the guard, returning the counter on success.
pub(crate) fn ensure_owner(caller: UserId, counter: Counter) -> Result<Counter, Error> {
    match authorize(caller, &counter) {
        AccessDecision::Allowed => Ok(counter),
        AccessDecision::Forbidden => Err(forbidden_error(&counter)),
    }
}
