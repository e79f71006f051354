//! User use-cases.
//!
//! Transaction discipline: writes go through the repository on the session's
//! transaction, then the service commits exactly once and refreshes the
//! entity. Reads never commit. Closing the unit of work is not the service's
//! business.

use std::sync::Arc;

use tracing::info;

use crate::domain::ports::{StorageError, UserRepository};
use crate::domain::{CreateUser, DomainError, NewUser, ServiceError, Session, User, UserId};

/// Application service for the User aggregate.
pub struct UserService<R> {
    users: Arc<R>,
}

impl<R> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
        }
    }
}

impl<R> UserService<R> {
    /// Create a service over the given repository.
    pub fn new(users: Arc<R>) -> Self {
        Self { users }
    }
}

impl<R: UserRepository> UserService<R> {
    /// Register a user. The email must not belong to anyone else.
    ///
    /// # Errors
    /// - `conflict` with `{email}` when the address is taken, including when
    ///   a concurrent insert wins the race at the unique index.
    /// - Storage failures propagate untranslated.
    pub async fn create_user(
        &self,
        session: &mut Session<'_, R::Tx>,
        data: CreateUser,
    ) -> Result<User, ServiceError> {
        if self
            .users
            .find_by_email(session.tx(), &data.email)
            .await?
            .is_some()
        {
            return Err(email_taken(&data.email).into());
        }

        let new_user = NewUser {
            email: data.email,
            name: data.name,
            age: data.age,
        };
        // The unique index may fire at insert or, on deferred backends, at commit.
        let written = match self.users.insert(session.tx(), &new_user).await {
            Ok(user) => session.commit().await.map(|()| user),
            Err(err) => Err(err),
        };
        let mut user = written.map_err(|err| match err {
            StorageError::UniqueViolation { .. } => email_taken(&new_user.email).into(),
            other => ServiceError::from(other),
        })?;

        self.users.refresh(session.tx(), &mut user).await?;
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    /// Fetch one user.
    ///
    /// # Errors
    /// `not_found` with `{id}` when no such user exists.
    pub async fn get_user_by_id(
        &self,
        session: &mut Session<'_, R::Tx>,
        id: UserId,
    ) -> Result<User, ServiceError> {
        self.users
            .find_by_id(session.tx(), id)
            .await?
            .ok_or_else(|| user_not_found(id).into())
    }

    /// Hard delete a user. Their posts go with them.
    ///
    /// # Errors
    /// `not_found` with `{id}` when no such user exists.
    pub async fn delete_user(
        &self,
        session: &mut Session<'_, R::Tx>,
        id: UserId,
    ) -> Result<(), ServiceError> {
        if self.users.find_by_id(session.tx(), id).await?.is_none() {
            return Err(user_not_found(id).into());
        }

        self.users.delete(session.tx(), id).await?;
        session.commit().await?;
        info!(user_id = %id, "user deleted");
        Ok(())
    }
}

fn email_taken(email: &str) -> DomainError {
    DomainError::conflict("User with this email already exists.").with_detail("email", email)
}

fn user_not_found(id: UserId) -> DomainError {
    DomainError::not_found("User not found.").with_detail("id", id.get())
}

#[cfg(test)]
#[path = "user_service_tests.rs"]
mod tests;
