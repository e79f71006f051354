//! In-memory `PostRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{PostRepository, StorageError};
use crate::domain::{NewPost, Page, Post, PostId, UserId};

use super::MemoryTransaction;

/// Stateless post adapter over [`MemoryTransaction`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryPostRepository;

fn window(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

fn stored(tx: &MemoryTransaction, id: PostId) -> Result<Post, StorageError> {
    tx.read()?
        .posts
        .get(&id)
        .cloned()
        .ok_or_else(|| StorageError::query(format!("post {id} vanished")))
}

#[async_trait]
impl PostRepository for MemoryPostRepository {
    type Tx = MemoryTransaction;

    async fn insert(&self, tx: &mut Self::Tx, post: &NewPost) -> Result<Post, StorageError> {
        tx.insert_post(post)
    }

    async fn find_by_id(
        &self,
        tx: &mut Self::Tx,
        id: PostId,
    ) -> Result<Option<Post>, StorageError> {
        Ok(tx
            .read()?
            .posts
            .get(&id)
            .filter(|post| !post.is_deleted())
            .cloned())
    }

    async fn find_by_author(
        &self,
        tx: &mut Self::Tx,
        author_id: UserId,
    ) -> Result<Vec<Post>, StorageError> {
        Ok(tx
            .read()?
            .posts
            .values()
            .filter(|post| post.author_id == author_id && !post.is_deleted())
            .cloned()
            .collect())
    }

    async fn list(&self, tx: &mut Self::Tx, page: Page) -> Result<Vec<Post>, StorageError> {
        Ok(tx
            .read()?
            .posts
            .values()
            .filter(|post| !post.is_deleted())
            .skip(window(page.offset))
            .take(window(page.limit))
            .cloned()
            .collect())
    }

    async fn update(&self, tx: &mut Self::Tx, post: &Post) -> Result<(), StorageError> {
        let mut row = stored(tx, post.id)?;
        row.content.clone_from(&post.content);
        row.caption.clone_from(&post.caption);
        tx.put_post(row);
        Ok(())
    }

    async fn soft_delete(
        &self,
        tx: &mut Self::Tx,
        id: PostId,
        deleted_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut row = stored(tx, id)?;
        row.deleted_at = Some(deleted_at);
        tx.put_post(row);
        Ok(())
    }

    async fn refresh(&self, tx: &mut Self::Tx, post: &mut Post) -> Result<(), StorageError> {
        *post = stored(tx, post.id)?;
        Ok(())
    }
}
