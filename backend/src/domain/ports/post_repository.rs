//! Port abstraction for post persistence adapters.
//!
//! Every read excludes soft-deleted rows except [`PostRepository::refresh`],
//! which reloads by primary key.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{NewPost, Page, Post, PostId, UserId};

use super::{StorageError, Transaction};

/// Row-level access to the `posts` table.
#[cfg_attr(test, mockall::automock(type Tx = crate::outbound::memory::MemoryTransaction;))]
#[async_trait]
pub trait PostRepository: Send + Sync + 'static {
    /// Transaction type this adapter runs on.
    type Tx: Transaction;

    /// Insert a post and flush it. An unknown author surfaces as
    /// [`StorageError::ForeignKeyViolation`].
    async fn insert(&self, tx: &mut Self::Tx, post: &NewPost) -> Result<Post, StorageError>;

    /// Fetch a live post by identifier.
    async fn find_by_id(&self, tx: &mut Self::Tx, id: PostId)
    -> Result<Option<Post>, StorageError>;

    /// All live posts by one author, oldest first.
    async fn find_by_author(
        &self,
        tx: &mut Self::Tx,
        author_id: UserId,
    ) -> Result<Vec<Post>, StorageError>;

    /// A window of live posts ordered by identifier.
    async fn list(&self, tx: &mut Self::Tx, page: Page) -> Result<Vec<Post>, StorageError>;

    /// Write the mutable columns (`content`, `caption`) of `post`.
    async fn update(&self, tx: &mut Self::Tx, post: &Post) -> Result<(), StorageError>;

    /// Stamp the deletion marker; the row itself is kept.
    async fn soft_delete(
        &self,
        tx: &mut Self::Tx,
        id: PostId,
        deleted_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Reload `post` from its persisted row.
    async fn refresh(&self, tx: &mut Self::Tx, post: &mut Post) -> Result<(), StorageError>;
}
