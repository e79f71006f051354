//! In-memory `UserRepository`.

use async_trait::async_trait;

use crate::domain::ports::{StorageError, UserRepository};
use crate::domain::{NewUser, User, UserId};

use super::MemoryTransaction;

/// Stateless user adapter over [`MemoryTransaction`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryUserRepository;

#[async_trait]
impl UserRepository for MemoryUserRepository {
    type Tx = MemoryTransaction;

    async fn insert(&self, tx: &mut Self::Tx, user: &NewUser) -> Result<User, StorageError> {
        tx.insert_user(user)
    }

    async fn find_by_id(
        &self,
        tx: &mut Self::Tx,
        id: UserId,
    ) -> Result<Option<User>, StorageError> {
        Ok(tx.read()?.users.get(&id).cloned())
    }

    async fn find_by_email(
        &self,
        tx: &mut Self::Tx,
        email: &str,
    ) -> Result<Option<User>, StorageError> {
        Ok(tx
            .read()?
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn refresh(&self, tx: &mut Self::Tx, user: &mut User) -> Result<(), StorageError> {
        let row = tx
            .read()?
            .users
            .get(&user.id)
            .cloned()
            .ok_or_else(|| StorageError::query(format!("user {} vanished", user.id)))?;
        *user = row;
        Ok(())
    }

    async fn delete(&self, tx: &mut Self::Tx, id: UserId) -> Result<(), StorageError> {
        tx.delete_user(id)
    }
}
