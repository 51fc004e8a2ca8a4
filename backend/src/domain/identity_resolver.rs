//! Resolves bearer credentials to local users.
//!
//! Verification is delegated to the injected [`IdentityVerifier`]. This
//! service only maps the verified identity onto a local [`User`], creating
//! one on first login unless provisioning is disabled. Profile fields are
//! captured at creation and never refreshed.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    IdentityVerificationError, IdentityVerifier, LoginService, UserPersistenceError,
    UserRepository,
};
use crate::domain::{BearerToken, Error, NewUser, ProvisioningPolicy, User, VerifiedIdentity};

/// Login service backed by an identity provider and a user store.
#[derive(Clone)]
pub struct IdentityResolver<V: ?Sized, U: ?Sized> {
    verifier: Arc<V>,
    users: Arc<U>,
    policy: ProvisioningPolicy,
}

impl<V: ?Sized, U: ?Sized> IdentityResolver<V, U> {
    pub fn new(verifier: Arc<V>, users: Arc<U>, policy: ProvisioningPolicy) -> Self {
        Self {
            verifier,
            users,
            policy,
        }
    }
}

impl<V, U> IdentityResolver<V, U>
where
    V: IdentityVerifier + ?Sized,
    U: UserRepository + ?Sized,
{
    fn map_verification_error(error: IdentityVerificationError) -> Error {
        match error {
            IdentityVerificationError::Rejected { .. } => {
                Error::unauthorized("invalid or expired token")
            }
            IdentityVerificationError::Unavailable { message } => {
                Error::service_unavailable(format!("identity provider unavailable: {message}"))
            }
            IdentityVerificationError::Decode { message } => {
                Error::internal(format!("identity provider response invalid: {message}"))
            }
        }
    }

    fn map_user_error(error: UserPersistenceError) -> Error {
        match error {
            UserPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserPersistenceError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
        }
    }

    /// Return the local user for a verified identity, creating it if allowed.
    pub async fn resolve_or_create_user(&self, identity: &VerifiedIdentity) -> Result<User, Error> {
        let external_identity = identity.external_identity();
        if let Some(user) = self
            .users
            .find_by_external_identity(external_identity)
            .await
            .map_err(Self::map_user_error)?
        {
            debug!(user_id = %user.id(), "resolved existing user");
            return Ok(user);
        }

        if self.policy == ProvisioningPolicy::RequireExisting {
            return Err(Error::not_found("no local user for this identity"));
        }

        let profile = NewUser::new(
            external_identity.clone(),
            identity.email().map(str::to_owned),
            identity.display_name().map(str::to_owned),
        );
        let user = self
            .users
            .create_if_absent(&profile)
            .await
            .map_err(Self::map_user_error)?;
        info!(user_id = %user.id(), "provisioned user on first login");
        Ok(user)
    }
}

#[async_trait]
impl<V, U> LoginService for IdentityResolver<V, U>
where
    V: IdentityVerifier + ?Sized,
    U: UserRepository + ?Sized,
{
    async fn resolve(&self, token: &BearerToken) -> Result<User, Error> {
        let identity = self.verifier.verify(token).await.map_err(|err| {
            warn!(
                token_fingerprint = %token.fingerprint(),
                error = %err,
                "identity verification failed"
            );
            Self::map_verification_error(err)
        })?;
        self.resolve_or_create_user(&identity).await
    }
}
