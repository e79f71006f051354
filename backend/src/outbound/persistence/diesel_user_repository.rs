//! PostgreSQL-backed `UserRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{StorageError, UserRepository};
use crate::domain::{NewUser, User, UserId};

use super::diesel_storage::DieselTransaction;
use super::error_mapping::map_diesel_error;
use super::models::{NewUserRow, UserRow};
use super::schema::users;

/// Stateless Diesel adapter for the `users` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct DieselUserRepository;

#[async_trait]
impl UserRepository for DieselUserRepository {
    type Tx = DieselTransaction;

    async fn insert(&self, tx: &mut Self::Tx, user: &NewUser) -> Result<User, StorageError> {
        let conn = tx.connection().await?;
        diesel::insert_into(users::table)
            .values(NewUserRow::from(user))
            .returning(UserRow::as_returning())
            .get_result(conn)
            .await
            .map(User::from)
            .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        tx: &mut Self::Tx,
        id: UserId,
    ) -> Result<Option<User>, StorageError> {
        let conn = tx.connection().await?;
        users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(conn)
            .await
            .optional()
            .map(|row| row.map(User::from))
            .map_err(map_diesel_error)
    }

    async fn find_by_email(
        &self,
        tx: &mut Self::Tx,
        email: &str,
    ) -> Result<Option<User>, StorageError> {
        let conn = tx.connection().await?;
        users::table
            .filter(users::email.eq(email))
            .select(UserRow::as_select())
            .first(conn)
            .await
            .optional()
            .map(|row| row.map(User::from))
            .map_err(map_diesel_error)
    }

    async fn refresh(&self, tx: &mut Self::Tx, user: &mut User) -> Result<(), StorageError> {
        let conn = tx.connection().await?;
        let row = users::table
            .find(user.id.get())
            .select(UserRow::as_select())
            .first(conn)
            .await
            .map_err(map_diesel_error)?;
        *user = row.into();
        Ok(())
    }

    async fn delete(&self, tx: &mut Self::Tx, id: UserId) -> Result<(), StorageError> {
        let conn = tx.connection().await?;
        diesel::delete(users::table.find(id.get()))
            .execute(conn)
            .await
            .map(drop)
            .map_err(map_diesel_error)
    }
}
