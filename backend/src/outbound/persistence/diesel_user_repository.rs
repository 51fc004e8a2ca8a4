//! PostgreSQL-backed `UserRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use mockable::Clock;
use std::sync::Arc;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{ExternalIdentity, NewUser, User};

use super::error_mapping::{user_diesel_error, user_pool_error};
use super::models::{NewUserRow, UserRow};
use super::pool::DbPool;
use super::schema::users;

/// Diesel-backed user repository.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl DieselUserRepository {
    /// Create a repository; the clock stamps newly provisioned users.
    ///
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use mockable::DefaultClock;
    /// use onemore::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
    ///
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let pool = DbPool::new(PoolConfig::new("postgres://localhost/onemore")).await?;
    /// let repository = DieselUserRepository::new(pool, Arc::new(DefaultClock));
    /// # let _ = repository;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

fn to_domain(row: UserRow) -> Result<User, UserPersistenceError> {
    row.into_domain().map_err(UserPersistenceError::query)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_external_identity(
        &self,
        external_identity: &ExternalIdentity,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(user_pool_error)?;
        users::table
            .filter(users::external_identity.eq(external_identity.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(user_diesel_error)?
            .map(to_domain)
            .transpose()
    }

    async fn create_if_absent(&self, user: &NewUser) -> Result<User, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(user_pool_error)?;
        let row = NewUserRow {
            external_identity: user.external_identity.as_ref(),
            email: user.email.as_deref(),
            display_name: user.display_name.as_deref(),
            created_at: self.clock.utc(),
        };

        // A concurrent first login may win the insert; either way the
        // follow-up select returns the single stored row.
        diesel::insert_into(users::table)
            .values(&row)
            .on_conflict(users::external_identity)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(user_diesel_error)?;

        let stored = users::table
            .filter(users::external_identity.eq(user.external_identity.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .map_err(user_diesel_error)?;
        to_domain(stored)
    }
}
