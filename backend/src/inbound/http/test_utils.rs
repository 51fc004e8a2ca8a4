//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use crate::domain::ports::{MockCountersCommand, MockCountersQuery, MockLoginService};
use crate::domain::{Counter, CounterId, CounterTitle, ExternalIdentity, NewUser, User, UserId};

use super::state::HttpState;

/// Token accepted by [`login_accepting`].
pub const GOOD_TOKEN: &str = "good";

pub fn fixture_user(id: i64) -> User {
    let uid = ExternalIdentity::new(format!("uid-{id}")).expect("valid uid");
    User::new(
        UserId::new(id),
        NewUser::new(uid, None, Some("Ada Lovelace".to_owned())),
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid time"),
    )
}

pub fn fixture_counter(id: i64, owner: UserId, count: u64) -> Counter {
    Counter {
        id: CounterId::new(id),
        title: CounterTitle::new("Coffee").expect("valid title"),
        count,
        owner_id: owner,
        created_at: Utc
            .with_ymd_and_hms(2024, 1, 2, 0, 0, 0)
            .single()
            .expect("valid time"),
    }
}

/// Login double resolving [`GOOD_TOKEN`] to `user_id` and rejecting the rest.
pub fn login_accepting(user_id: i64) -> MockLoginService {
    let mut login = MockLoginService::new();
    login.expect_resolve().returning(move |token| {
        if token.expose() == GOOD_TOKEN {
            Ok(fixture_user(user_id))
        } else {
            Err(crate::domain::Error::unauthorized("invalid or expired token"))
        }
    });
    login
}

pub fn http_state(
    login: MockLoginService,
    counters: MockCountersCommand,
    counters_query: MockCountersQuery,
) -> HttpState {
    HttpState::new(Arc::new(login), Arc::new(counters), Arc::new(counters_query))
}
