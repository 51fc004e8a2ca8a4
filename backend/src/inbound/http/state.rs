//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{CountersCommand, CountersQuery, LoginService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub counters: Arc<dyn CountersCommand>,
    pub counters_query: Arc<dyn CountersQuery>,
}

impl HttpState {
    /// Construct state from the driving ports.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use onemore::domain::ports::FixtureIdentityVerifier;
    /// use onemore::domain::{CounterService, IdentityResolver, ProvisioningPolicy};
    /// use onemore::inbound::http::state::HttpState;
    /// use onemore::outbound::memory::InMemoryStore;
    ///
    /// let store = Arc::new(InMemoryStore::new(Arc::new(DefaultClock)));
    /// let counters = Arc::new(CounterService::new(
    ///     store.clone(),
    ///     store.clone(),
    ///     store.clone(),
    ///     Arc::new(DefaultClock),
    /// ));
    /// let login = Arc::new(IdentityResolver::new(
    ///     Arc::new(FixtureIdentityVerifier),
    ///     store,
    ///     ProvisioningPolicy::default(),
    /// ));
    /// let state = HttpState::new(login, counters.clone(), counters);
    /// let _login = state.login.clone();
    /// ```
    pub fn new(
        login: Arc<dyn LoginService>,
        counters: Arc<dyn CountersCommand>,
        counters_query: Arc<dyn CountersQuery>,
    ) -> Self {
        Self {
            login,
            counters,
            counters_query,
        }
    }
}
