//! Driven port for the external identity provider.
//!
//! Adapters exchange an opaque bearer credential for the identity the
//! provider asserts. Local user lookup happens elsewhere.

use async_trait::async_trait;

use crate::domain::{BearerToken, ExternalIdentity, VerifiedIdentity};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity verification adapters.
    pub enum IdentityVerificationError {
        /// The provider refused the credential (invalid, expired, revoked).
        Rejected { message: String } => "identity token rejected: {message}",
        /// The provider could not be reached or failed.
        Unavailable { message: String } => "identity provider unavailable: {message}",
        /// The provider answered with a payload we could not interpret.
        Decode { message: String } => "identity provider response invalid: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify the token and return the identity it belongs to.
    async fn verify(
        &self,
        token: &BearerToken,
    ) -> Result<VerifiedIdentity, IdentityVerificationError>;
}

/// Token accepted by [`FixtureIdentityVerifier`].
pub const FIXTURE_TOKEN: &str = "fixture-token";
/// Identity returned by [`FixtureIdentityVerifier`].
pub const FIXTURE_EXTERNAL_IDENTITY: &str = "fixture-user";

/// Development verifier that accepts a single well-known token.
///
/// Only wired when no identity provider is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIdentityVerifier;

#[async_trait]
impl IdentityVerifier for FixtureIdentityVerifier {
    async fn verify(
        &self,
        token: &BearerToken,
    ) -> Result<VerifiedIdentity, IdentityVerificationError> {
        if token.expose() != FIXTURE_TOKEN {
            return Err(IdentityVerificationError::rejected("unknown fixture token"));
        }
        let uid = ExternalIdentity::new(FIXTURE_EXTERNAL_IDENTITY)
            .map_err(|err| IdentityVerificationError::decode(err.to_string()))?;
        Ok(VerifiedIdentity::new(
            uid,
            Some("ada@example.com".to_owned()),
            Some("Ada Lovelace".to_owned()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn fixture_accepts_known_token() {
        let token = BearerToken::new(FIXTURE_TOKEN).expect("valid token");
        let identity = FixtureIdentityVerifier
            .verify(&token)
            .await
            .expect("fixture token verifies");
        assert_eq!(identity.external_identity().as_ref(), FIXTURE_EXTERNAL_IDENTITY);
        assert_eq!(identity.display_name(), Some("Ada Lovelace"));
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_rejects_other_tokens() {
        let token = BearerToken::new("something-else").expect("valid token");
        let err = FixtureIdentityVerifier
            .verify(&token)
            .await
            .expect_err("unknown token");
        assert!(matches!(err, IdentityVerificationError::Rejected { .. }));
    }
}
