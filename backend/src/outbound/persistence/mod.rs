//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! The storage and repository adapters are thin: [`DieselStorage`] hands out
//! request-owned connections with an open transaction, and the repositories
//! translate rows on whatever [`DieselTransaction`] they are given. Diesel
//! row structs (`models.rs`) and table definitions (`schema.rs`) never leave
//! this module.
//!
//! # Example
//!
//! ```ignore
//! use backend::outbound::persistence::{DbPool, DieselStorage, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/social")).await?;
//! let storage = DieselStorage::new(pool);
//! ```

mod diesel_post_repository;
mod diesel_storage;
mod diesel_user_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_post_repository::DieselPostRepository;
pub use diesel_storage::{DieselStorage, DieselTransaction};
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
