//! Test utilities for the backend crate.
//!
//! Shared by unit tests and the integration suites under `tests/`. Compiled
//! only with the `test-support` feature.

pub mod identity {
    //! Identity verifiers with canned answers.

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use crate::domain::ports::{IdentityVerificationError, IdentityVerifier};
    use crate::domain::{BearerToken, ExternalIdentity, VerifiedIdentity};

    /// Verifier mapping fixed tokens to identities.
    ///
    /// Unknown tokens are rejected. [`StaticIdentityVerifier::set_unavailable`]
    /// simulates a provider outage.
    ///
    /// # Examples
    /// ```
    /// use onemore::test_support::identity::StaticIdentityVerifier;
    ///
    /// let verifier = StaticIdentityVerifier::new()
    ///     .with_identity("token-a", "uid-a")
    ///     .with_identity("token-b", "uid-b");
    /// # let _ = verifier;
    /// ```
    #[derive(Debug, Default)]
    pub struct StaticIdentityVerifier {
        identities: HashMap<String, String>,
        unavailable: AtomicBool,
    }

    impl StaticIdentityVerifier {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Accept `token` as the provider identity `uid`.
        #[must_use]
        pub fn with_identity(mut self, token: &str, uid: &str) -> Self {
            self.identities.insert(token.to_owned(), uid.to_owned());
            self
        }

        /// Toggle a simulated provider outage.
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl IdentityVerifier for StaticIdentityVerifier {
        async fn verify(
            &self,
            token: &BearerToken,
        ) -> Result<VerifiedIdentity, IdentityVerificationError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(IdentityVerificationError::unavailable("simulated outage"));
            }
            let uid = self
                .identities
                .get(token.expose())
                .ok_or_else(|| IdentityVerificationError::rejected("unknown test token"))?;
            let external = ExternalIdentity::new(uid)
                .map_err(|err| IdentityVerificationError::decode(err.to_string()))?;
            Ok(VerifiedIdentity::new(
                external,
                Some(format!("{uid}@example.com")),
                Some(uid.to_owned()),
            ))
        }
    }
}

pub mod app {
    //! In-memory application wiring for end-to-end handler tests.

    use std::sync::Arc;

    use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
    use actix_web::{App, web};
    use mockable::{Clock, DefaultClock};

    use crate::Trace;
    use crate::domain::ports::IdentityVerifier;
    use crate::domain::{CounterService, IdentityResolver, ProvisioningPolicy};
    use crate::inbound::http::api_scope;
    use crate::inbound::http::state::HttpState;
    use crate::outbound::memory::InMemoryStore;

    /// Build HTTP state over a fresh in-memory store.
    pub fn in_memory_state(
        verifier: Arc<dyn IdentityVerifier>,
        policy: ProvisioningPolicy,
    ) -> HttpState {
        let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
        let store = Arc::new(InMemoryStore::new(clock.clone()));
        let login = Arc::new(IdentityResolver::new(verifier, store.clone(), policy));
        let counters = Arc::new(CounterService::new(
            store.clone(),
            store.clone(),
            store,
            clock,
        ));
        HttpState::new(login, counters.clone(), counters)
    }

    /// Application exposing the versioned API over `state`.
    pub fn api_app(
        state: HttpState,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(state))
            .wrap(Trace)
            .service(api_scope())
    }
}
