//! Driving port resolving bearer credentials to local users.
//!
//! Inbound adapters call this to authenticate a request without knowing
//! which identity provider or store sits behind it.

use async_trait::async_trait;

use crate::domain::{BearerToken, Error, User};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Verify the token and return the matching local user.
    ///
    /// Fails with `unauthorized` for bad tokens, `not_found` when
    /// provisioning is disabled and the user is unknown.
    async fn resolve(&self, token: &BearerToken) -> Result<User, Error>;
}
