//! Identity primitives: bearer credentials and verified identities.
//!
//! Verification itself is delegated to an external provider behind the
//! [`crate::domain::ports::IdentityVerifier`] port. This module only shapes
//! the values flowing in and out of it.

use std::fmt;

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::{ExternalIdentity, normalise_profile_field};

/// Length of a token fingerprint in bytes before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

/// Problems found while parsing an `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerTokenError {
    /// No header or an empty token body.
    Missing,
    /// The header is not of the form `Bearer <token>`.
    Malformed,
}

impl fmt::Display for BearerTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing bearer token"),
            Self::Malformed => write!(f, "malformed authorization header"),
        }
    }
}

impl std::error::Error for BearerTokenError {}

/// Opaque bearer credential presented by a client.
///
/// The raw value is zeroed on drop and never printed by `Debug`.
///
/// # Examples
/// ```
/// use onemore::domain::BearerToken;
///
/// let token = BearerToken::from_authorization_header(Some("Bearer abc.def"))
///     .expect("well formed header");
/// assert_eq!(token.expose(), "abc.def");
/// assert_eq!(token.fingerprint().len(), 16);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(Zeroizing<String>);

impl BearerToken {
    /// Wrap a raw token, rejecting blank values and embedded whitespace.
    pub fn new(raw: impl Into<String>) -> Result<Self, BearerTokenError> {
        let raw = Zeroizing::new(raw.into());
        if raw.trim().is_empty() {
            return Err(BearerTokenError::Missing);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(BearerTokenError::Malformed);
        }
        Ok(Self(raw))
    }

    /// Parse an `Authorization` header value.
    ///
    /// The scheme is matched case-insensitively and must be followed by
    /// exactly one token.
    pub fn from_authorization_header(header: Option<&str>) -> Result<Self, BearerTokenError> {
        let value = header.map(str::trim).unwrap_or_default();
        if value.is_empty() {
            return Err(BearerTokenError::Missing);
        }
        let Some((scheme, rest)) = value.split_once(char::is_whitespace) else {
            return if value.eq_ignore_ascii_case("bearer") {
                Err(BearerTokenError::Missing)
            } else {
                Err(BearerTokenError::Malformed)
            };
        };
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(BearerTokenError::Malformed);
        }
        Self::new(rest.trim())
    }

    /// Raw token value for handing to the identity provider.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Truncated SHA-256 fingerprint that is safe to log.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(digest.iter().take(FINGERPRINT_BYTES).copied().collect::<Vec<u8>>())
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BearerToken").field(&"<redacted>").finish()
    }
}

/// Identity asserted by the external provider for a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    external_identity: ExternalIdentity,
    email: Option<String>,
    display_name: Option<String>,
}

impl VerifiedIdentity {
    pub fn new(
        external_identity: ExternalIdentity,
        email: Option<String>,
        display_name: Option<String>,
    ) -> Self {
        Self {
            external_identity,
            email: normalise_profile_field(email),
            display_name: normalise_profile_field(display_name),
        }
    }

    pub fn external_identity(&self) -> &ExternalIdentity {
        &self.external_identity
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}

/// What to do when a verified identity has no local user yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProvisioningPolicy {
    /// Create the user on first login.
    #[default]
    AutoProvision,
    /// Refuse unknown identities with `not_found`.
    RequireExisting,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Bearer abc", "abc")]
    #[case("bearer abc", "abc")]
    #[case("BEARER   abc  ", "abc")]
    #[case("  Bearer eyJ.payload.sig", "eyJ.payload.sig")]
    fn parses_well_formed_headers(#[case] header: &str, #[case] expected: &str) {
        let token = BearerToken::from_authorization_header(Some(header)).expect("valid header");
        assert_eq!(token.expose(), expected);
    }

    #[rstest]
    #[case(None, BearerTokenError::Missing)]
    #[case(Some(""), BearerTokenError::Missing)]
    #[case(Some("Bearer"), BearerTokenError::Missing)]
    #[case(Some("Bearer    "), BearerTokenError::Missing)]
    #[case(Some("Basic dXNlcjpwdw=="), BearerTokenError::Malformed)]
    #[case(Some("Token"), BearerTokenError::Malformed)]
    #[case(Some("Bearer two tokens"), BearerTokenError::Malformed)]
    fn rejects_bad_headers(#[case] header: Option<&str>, #[case] expected: BearerTokenError) {
        assert_eq!(BearerToken::from_authorization_header(header), Err(expected));
    }

    #[rstest]
    fn debug_output_redacts_token() {
        let token = BearerToken::new("super-secret").expect("valid token");
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("super-secret"));
    }

    #[rstest]
    fn fingerprint_is_stable_hex() {
        let token = BearerToken::new("super-secret").expect("valid token");
        let first = token.fingerprint();
        assert_eq!(first, token.fingerprint());
        assert_eq!(first.len(), FINGERPRINT_BYTES * 2);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!first.contains("secret"));
    }

    #[rstest]
    fn verified_identity_normalises_profile() {
        let uid = ExternalIdentity::new("uid").expect("valid uid");
        let identity = VerifiedIdentity::new(uid, Some(" a@b.c ".to_owned()), Some(String::new()));
        assert_eq!(identity.email(), Some("a@b.c"));
        assert_eq!(identity.display_name(), None);
    }
}
