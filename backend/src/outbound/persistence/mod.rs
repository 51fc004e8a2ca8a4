//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the user and counter ports backed by
//! PostgreSQL through `diesel-async` and a `bb8` pool.
//!
//! - **Thin adapters**: repositories translate between Diesel rows and
//!   domain types; the tally decision itself lives in the domain planner.
//! - **Internal models**: row structs (`models.rs`) and the schema
//!   (`schema.rs`) never leave this module.
//! - **Atomic tallies**: each increment or decrement runs in one
//!   transaction holding a row lock on the counter.
//!
//! # Example
//!
//! ```rust,no_run
//! use onemore::outbound::persistence::{DbPool, DieselCounterRepository, PoolConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/onemore")).await?;
//! let counters = DieselCounterRepository::new(pool);
//! # let _ = counters;
//! # Ok(())
//! # }
//! ```

mod diesel_counter_repository;
mod diesel_user_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_counter_repository::DieselCounterRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
