//! Shared Diesel and pool error mapping for the repositories.
//!
//! Connection-level failures map to the port's `connection` constructor and
//! surface as `service_unavailable`; everything else maps to `query`.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::{CounterPersistenceError, UserPersistenceError};

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error.
pub(crate) fn map_pool_error<E>(error: PoolError, connection: impl FnOnce(String) -> E) -> E {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map Diesel errors into query or connection errors, logging the detail.
pub(crate) fn map_diesel_error<E>(
    error: DieselError,
    query: impl FnOnce(String) -> E,
    connection: impl FnOnce(String) -> E,
) -> E {
    let error_message = error.to_string();
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                error = %error_message,
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            error = %error_message,
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            connection(info.message().to_owned())
        }
        DieselError::BrokenTransactionManager => connection(error_message),
        DieselError::DatabaseError(_, info) => query(info.message().to_owned()),
        _ => query(error_message),
    }
}

pub(crate) fn counter_pool_error(error: PoolError) -> CounterPersistenceError {
    map_pool_error(error, CounterPersistenceError::connection)
}

pub(crate) fn counter_diesel_error(error: DieselError) -> CounterPersistenceError {
    map_diesel_error(
        error,
        CounterPersistenceError::query,
        CounterPersistenceError::connection,
    )
}

pub(crate) fn user_pool_error(error: PoolError) -> UserPersistenceError {
    map_pool_error(error, UserPersistenceError::connection)
}

pub(crate) fn user_diesel_error(error: DieselError) -> UserPersistenceError {
    map_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}
