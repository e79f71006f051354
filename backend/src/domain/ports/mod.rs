//! Domain ports for the hexagonal boundary.
//!
//! Storage is split in two: [`Storage`]/[`Transaction`] describe the
//! unit-of-work primitives, while the per-aggregate repositories translate
//! rows on whatever transaction they are handed.

mod macros;
pub(crate) use macros::define_port_error;

mod post_repository;
mod storage;
mod user_repository;

#[cfg(test)]
pub use post_repository::MockPostRepository;
pub use post_repository::PostRepository;
#[cfg(test)]
pub use storage::MockStorage;
pub use storage::{Storage, StorageError, Transaction};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::UserRepository;
