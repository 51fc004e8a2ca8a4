//! Builders wiring adapters and services into HTTP state.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};
use url::Url;

use onemore::domain::ports::{
    CounterEventLog, CounterRepository, FixtureIdentityVerifier, IdentityVerifier, TallyLedger,
    UserRepository,
};
use onemore::domain::{CounterService, IdentityResolver, ProvisioningPolicy};
use onemore::inbound::http::state::HttpState;
use onemore::outbound::identity::IdentityToolkitVerifier;
use onemore::outbound::memory::InMemoryStore;
use onemore::outbound::persistence::{DbPool, DieselCounterRepository, DieselUserRepository};

use super::AppSettings;

/// Driven-port implementations selected at startup.
#[derive(Clone)]
pub struct Adapters {
    pub users: Arc<dyn UserRepository>,
    pub counters: Arc<dyn CounterRepository>,
    pub events: Arc<dyn CounterEventLog>,
    pub ledger: Arc<dyn TallyLedger>,
}

impl Adapters {
    /// Single-process adapters; state is lost on restart.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(InMemoryStore::new(clock));
        Self {
            users: store.clone(),
            counters: store.clone(),
            events: store.clone(),
            ledger: store,
        }
    }

    /// PostgreSQL adapters sharing one pool.
    pub fn postgres(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        let counters = Arc::new(DieselCounterRepository::new(pool.clone()));
        Self {
            users: Arc::new(DieselUserRepository::new(pool, clock)),
            counters: counters.clone(),
            events: counters.clone(),
            ledger: counters,
        }
    }
}

/// Build the identity verifier once for the process.
///
/// Without an API key the fixture verifier is used, which accepts a single
/// well-known token and must never face real traffic. Release builds refuse
/// it unless `allow_fixture_identity` is set.
///
/// # Errors
///
/// Returns an error when the fixture verifier is refused, the endpoint is not
/// a URL, or the HTTP client cannot be constructed.
pub fn build_identity_verifier(
    settings: &AppSettings,
) -> std::io::Result<Arc<dyn IdentityVerifier>> {
    select_identity_verifier(settings, cfg!(debug_assertions))
}

fn select_identity_verifier(
    settings: &AppSettings,
    debug_build: bool,
) -> std::io::Result<Arc<dyn IdentityVerifier>> {
    let Some(api_key) = settings.identity_api_key() else {
        if !(debug_build || settings.allow_fixture_identity) {
            return Err(std::io::Error::other(
                "no identity provider API key configured; set ONEMORE_IDENTITY_API_KEY \
                 or opt into the fixture verifier with ONEMORE_ALLOW_FIXTURE_IDENTITY",
            ));
        }
        warn!("no identity provider API key configured; using fixture verifier (dev only)");
        return Ok(Arc::new(FixtureIdentityVerifier));
    };
    let endpoint = Url::parse(settings.identity_endpoint()).map_err(|err| {
        std::io::Error::other(format!("invalid identity endpoint: {err}"))
    })?;
    info!(endpoint = %endpoint, "using identity toolkit verifier");
    let verifier = IdentityToolkitVerifier::new(endpoint, api_key, settings.identity_timeout())
        .map_err(|err| std::io::Error::other(format!("identity client build failed: {err}")))?;
    Ok(Arc::new(verifier))
}

/// Compose services over the selected adapters.
pub fn build_http_state(
    adapters: Adapters,
    verifier: Arc<dyn IdentityVerifier>,
    policy: ProvisioningPolicy,
    clock: Arc<dyn Clock>,
) -> HttpState {
    let Adapters {
        users,
        counters,
        events,
        ledger,
    } = adapters;
    let login = Arc::new(IdentityResolver::new(verifier, users, policy));
    let service = Arc::new(CounterService::new(counters, events, ledger, clock));
    HttpState::new(login, service.clone(), service)
}
