//! Outbound adapters implementing domain ports for storage.
//!
//! - **persistence**: PostgreSQL via Diesel, the production backend.
//! - **memory**: process-local tables with the same transaction contract,
//!   selected by `APP_TESTING`.
//!
//! Adapters are thin translators between domain types and storage rows. They
//! contain no business logic.

pub mod memory;
pub mod persistence;
