//! PostgreSQL-backed `PostRepository`.
//!
//! Live rows are those with `deleted_at IS NULL`; only `refresh` looks past
//! the marker.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PostRepository, StorageError};
use crate::domain::{NewPost, Page, Post, PostId, UserId};

use super::diesel_storage::DieselTransaction;
use super::error_mapping::map_diesel_error;
use super::models::{NewPostRow, PostChangeset, PostRow};
use super::schema::posts;

/// Stateless Diesel adapter for the `posts` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct DieselPostRepository;

fn into_posts(rows: Vec<PostRow>) -> Vec<Post> {
    rows.into_iter().map(Post::from).collect()
}

#[async_trait]
impl PostRepository for DieselPostRepository {
    type Tx = DieselTransaction;

    async fn insert(&self, tx: &mut Self::Tx, post: &NewPost) -> Result<Post, StorageError> {
        let conn = tx.connection().await?;
        diesel::insert_into(posts::table)
            .values(NewPostRow::from(post))
            .returning(PostRow::as_returning())
            .get_result(conn)
            .await
            .map(Post::from)
            .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        tx: &mut Self::Tx,
        id: PostId,
    ) -> Result<Option<Post>, StorageError> {
        let conn = tx.connection().await?;
        posts::table
            .find(id.get())
            .filter(posts::deleted_at.is_null())
            .select(PostRow::as_select())
            .first(conn)
            .await
            .optional()
            .map(|row| row.map(Post::from))
            .map_err(map_diesel_error)
    }

    async fn find_by_author(
        &self,
        tx: &mut Self::Tx,
        author_id: UserId,
    ) -> Result<Vec<Post>, StorageError> {
        let conn = tx.connection().await?;
        posts::table
            .filter(posts::author_id.eq(author_id.get()))
            .filter(posts::deleted_at.is_null())
            .order(posts::id.asc())
            .select(PostRow::as_select())
            .load(conn)
            .await
            .map(into_posts)
            .map_err(map_diesel_error)
    }

    async fn list(&self, tx: &mut Self::Tx, page: Page) -> Result<Vec<Post>, StorageError> {
        let conn = tx.connection().await?;
        posts::table
            .filter(posts::deleted_at.is_null())
            .order(posts::id.asc())
            .limit(page.limit)
            .offset(page.offset)
            .select(PostRow::as_select())
            .load(conn)
            .await
            .map(into_posts)
            .map_err(map_diesel_error)
    }

    async fn update(&self, tx: &mut Self::Tx, post: &Post) -> Result<(), StorageError> {
        let conn = tx.connection().await?;
        diesel::update(posts::table.find(post.id.get()))
            .set(PostChangeset::from(post))
            .execute(conn)
            .await
            .map(drop)
            .map_err(map_diesel_error)
    }

    async fn soft_delete(
        &self,
        tx: &mut Self::Tx,
        id: PostId,
        deleted_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let conn = tx.connection().await?;
        diesel::update(posts::table.find(id.get()))
            .set(posts::deleted_at.eq(Some(deleted_at)))
            .execute(conn)
            .await
            .map(drop)
            .map_err(map_diesel_error)
    }

    async fn refresh(&self, tx: &mut Self::Tx, post: &mut Post) -> Result<(), StorageError> {
        let conn = tx.connection().await?;
        let row = posts::table
            .find(post.id.get())
            .select(PostRow::as_select())
            .first(conn)
            .await
            .map_err(map_diesel_error)?;
        *post = row.into();
        Ok(())
    }
}
