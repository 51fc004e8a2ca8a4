//! User data model.
//!
//! Users are created the first time a verified identity logs in and are
//! never mutated afterwards. Profile fields are captured once at creation.

use std::fmt;

use chrono::{DateTime, Utc};

/// Maximum length accepted for an external identity.
pub const EXTERNAL_IDENTITY_MAX: usize = 128;

/// Validation errors returned by the user constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyExternalIdentity,
    ExternalIdentityTooLong { max: usize },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyExternalIdentity => write!(f, "external identity must not be empty"),
            Self::ExternalIdentityTooLong { max } => {
                write!(f, "external identity must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable local user identifier.
///
/// # Examples
/// ```
/// use onemore::domain::UserId;
///
/// let id = UserId::new(7);
/// assert_eq!(id.get(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(i64);

impl UserId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier issued by the external identity provider.
///
/// Surrounding whitespace is trimmed; the remainder must be non-empty and at
/// most [`EXTERNAL_IDENTITY_MAX`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalIdentity(String);

impl ExternalIdentity {
    /// Validate and construct an [`ExternalIdentity`].
    ///
    /// # Examples
    /// ```
    /// use onemore::domain::ExternalIdentity;
    ///
    /// let uid = ExternalIdentity::new("  firebase-uid-1 ").expect("valid uid");
    /// assert_eq!(uid.as_ref(), "firebase-uid-1");
    /// assert!(ExternalIdentity::new("   ").is_err());
    /// ```
    pub fn new(value: impl Into<String>) -> Result<Self, UserValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyExternalIdentity);
        }
        if trimmed.chars().count() > EXTERNAL_IDENTITY_MAX {
            return Err(UserValidationError::ExternalIdentityTooLong {
                max: EXTERNAL_IDENTITY_MAX,
            });
        }
        if trimmed.len() == value.len() {
            Ok(Self(value))
        } else {
            Ok(Self(trimmed.to_owned()))
        }
    }
}

impl AsRef<str> for ExternalIdentity {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ExternalIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<ExternalIdentity> for String {
    fn from(value: ExternalIdentity) -> Self {
        value.0
    }
}

/// Trim an optional profile field, treating blank values as absent.
pub(crate) fn normalise_profile_field(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

/// Profile captured when a user is provisioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub external_identity: ExternalIdentity,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl NewUser {
    /// Build a new user profile, normalising optional fields.
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
}

/// Application user.
///
/// ## Invariants
/// - `external_identity` is unique across users.
/// - The record is immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    external_identity: ExternalIdentity,
    email: Option<String>,
    display_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl User {
    /// Assemble a persisted user from its stored fields.
    pub fn new(id: UserId, profile: NewUser, created_at: DateTime<Utc>) -> Self {
        let NewUser {
            external_identity,
            email,
            display_name,
        } = profile;
        Self {
            id,
            external_identity,
            email,
            display_name,
            created_at,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
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

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
