//! Port executing increments and decrements as one atomic unit.

use async_trait::async_trait;

use crate::domain::{TallyOutcome, TallyRequest};

use super::CounterPersistenceError;

/// Atomic executor for [`crate::domain::plan_tally`].
///
/// Implementations must:
/// - serialise requests for the same counter (row lock or equivalent);
/// - read the counter and its most recent event under that lock;
/// - write the planned count and log effect, or nothing, never half;
/// - report the number of events left after the write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TallyLedger: Send + Sync {
    async fn apply(&self, request: TallyRequest) -> Result<TallyOutcome, CounterPersistenceError>;
}
