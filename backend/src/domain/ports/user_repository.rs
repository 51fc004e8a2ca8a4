//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{ExternalIdentity, NewUser, User};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by the identity provider's identifier.
    async fn find_by_external_identity(
        &self,
        external_identity: &ExternalIdentity,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Insert the user unless one with the same external identity exists,
    /// then return the stored record.
    ///
    /// Concurrent first logins for one identity must converge on one row.
    async fn create_if_absent(&self, user: &NewUser) -> Result<User, UserPersistenceError>;
}
