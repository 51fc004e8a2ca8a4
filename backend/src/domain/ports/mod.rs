//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod counter_event_log;
mod counter_repository;
mod counters_command;
mod counters_query;
mod identity_verifier;
mod login_service;
mod tally_ledger;
mod user_repository;

pub use counter_event_log::CounterEventLog;
#[cfg(test)]
pub use counter_event_log::MockCounterEventLog;
#[cfg(test)]
pub use counter_repository::MockCounterRepository;
pub use counter_repository::{CounterPersistenceError, CounterRepository};
pub use counters_command::CountersCommand;
#[cfg(test)]
pub use counters_command::MockCountersCommand;
pub use counters_query::CountersQuery;
#[cfg(test)]
pub use counters_query::MockCountersQuery;
#[cfg(test)]
pub use identity_verifier::MockIdentityVerifier;
pub use identity_verifier::{
    FIXTURE_EXTERNAL_IDENTITY, FIXTURE_TOKEN, FixtureIdentityVerifier, IdentityVerificationError,
    IdentityVerifier,
};
pub use login_service::LoginService;
#[cfg(test)]
pub use login_service::MockLoginService;
#[cfg(test)]
pub use tally_ledger::MockTallyLedger;
pub use tally_ledger::TallyLedger;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
