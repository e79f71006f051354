//! Port abstraction for user persistence adapters.
//!
//! Repositories are stateless translators: every call runs on the
//! transaction passed in, and none of them commits.
use async_trait::async_trait;

use crate::domain::{NewUser, User, UserId};

use super::{StorageError, Transaction};

/// Row-level access to the `users` table.
#[cfg_attr(test, mockall::automock(type Tx = crate::outbound::memory::MemoryTransaction;))]
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Transaction type this adapter runs on.
    type Tx: Transaction;

    /// Insert a user and flush it, returning the row with its assigned
    /// identity and timestamps. Duplicate emails surface as
    /// [`StorageError::UniqueViolation`].
    async fn insert(&self, tx: &mut Self::Tx, user: &NewUser) -> Result<User, StorageError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, tx: &mut Self::Tx, id: UserId)
    -> Result<Option<User>, StorageError>;

    /// Fetch a user by email address.
    async fn find_by_email(
        &self,
        tx: &mut Self::Tx,
        email: &str,
    ) -> Result<Option<User>, StorageError>;

    /// Reload `user` from its persisted row.
    async fn refresh(&self, tx: &mut Self::Tx, user: &mut User) -> Result<(), StorageError>;

    /// Physically remove a user (and, through the foreign key, their posts).
    async fn delete(&self, tx: &mut Self::Tx, id: UserId) -> Result<(), StorageError>;
}
