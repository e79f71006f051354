//! Post use-cases.
//!
//! Posts are soft deleted with a timestamp from the injected clock; every
//! lookup treats a stamped row as missing.

use std::sync::Arc;

use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{PostRepository, StorageError};
use crate::domain::{
    CreatePost, DeletePost, DomainError, NewPost, Page, Post, PostId, ServiceError, Session,
    UpdatePost, UserId,
};

/// Application service for the Post aggregate.
pub struct PostService<R> {
    posts: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> Clone for PostService<R> {
    fn clone(&self) -> Self {
        Self {
            posts: Arc::clone(&self.posts),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R> PostService<R> {
    /// Create a service over the given repository and clock.
    pub fn new(posts: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { posts, clock }
    }
}

impl<R: PostRepository> PostService<R> {
    /// Publish a post.
    ///
    /// # Errors
    /// - `validation_error` with `{content}` when the content is blank.
    /// - `not_found` with `{author_id}` when the author does not exist.
    pub async fn create_post(
        &self,
        session: &mut Session<'_, R::Tx>,
        data: CreatePost,
    ) -> Result<Post, ServiceError> {
        if data.content.trim().is_empty() {
            return Err(empty_content(&data.content).into());
        }

        let new_post = NewPost {
            author_id: data.author_id,
            content: data.content,
            caption: data.caption,
        };
        let written = match self.posts.insert(session.tx(), &new_post).await {
            Ok(post) => session.commit().await.map(|()| post),
            Err(err) => Err(err),
        };
        let mut post = written.map_err(|err| match err {
            StorageError::ForeignKeyViolation { .. } => author_not_found(new_post.author_id).into(),
            other => ServiceError::from(other),
        })?;

        self.posts.refresh(session.tx(), &mut post).await?;
        info!(post_id = %post.id, author_id = %post.author_id, "post created");
        Ok(post)
    }

    /// Replace the content and/or caption of a live post.
    ///
    /// # Errors
    /// - `not_found` with `{id}` when the post is missing or deleted. This
    ///   is checked before any field rule.
    /// - `validation_error` with `{fields}` when neither field is supplied.
    /// - `validation_error` with `{content}` when the new content is blank.
    pub async fn update_post(
        &self,
        session: &mut Session<'_, R::Tx>,
        data: UpdatePost,
    ) -> Result<Post, ServiceError> {
        let mut post = self.require_live(session, data.id).await?;

        if data.content.is_none() && data.caption.is_none() {
            return Err(DomainError::validation("Nothing to update.")
                .with_detail("fields", json!(["content", "caption"]))
                .into());
        }
        if let Some(content) = data.content {
            if content.trim().is_empty() {
                return Err(empty_content(&content).into());
            }
            post.content = content;
        }
        if let Some(caption) = data.caption {
            post.caption = Some(caption);
        }

        self.posts.update(session.tx(), &post).await?;
        session.commit().await?;
        self.posts.refresh(session.tx(), &mut post).await?;
        info!(post_id = %post.id, "post updated");
        Ok(post)
    }

    /// Soft delete a post. The row stays; reads stop seeing it.
    ///
    /// # Errors
    /// `not_found` with `{id}` when the post is missing or already deleted.
    pub async fn delete_post(
        &self,
        session: &mut Session<'_, R::Tx>,
        data: DeletePost,
    ) -> Result<(), ServiceError> {
        let post = self.require_live(session, data.id).await?;

        self.posts
            .soft_delete(session.tx(), post.id, self.clock.utc())
            .await?;
        session.commit().await?;
        info!(post_id = %post.id, "post deleted");
        Ok(())
    }

    /// Fetch one live post.
    ///
    /// # Errors
    /// `not_found` with `{id}`.
    pub async fn get_post_by_id(
        &self,
        session: &mut Session<'_, R::Tx>,
        id: PostId,
    ) -> Result<Post, ServiceError> {
        self.require_live(session, id).await
    }

    /// Live posts by one author. An unknown author simply has none.
    pub async fn get_posts_by_author(
        &self,
        session: &mut Session<'_, R::Tx>,
        author_id: UserId,
    ) -> Result<Vec<Post>, ServiceError> {
        Ok(self.posts.find_by_author(session.tx(), author_id).await?)
    }

    /// A window of live posts.
    pub async fn get_all_posts(
        &self,
        session: &mut Session<'_, R::Tx>,
        page: Page,
    ) -> Result<Vec<Post>, ServiceError> {
        Ok(self.posts.list(session.tx(), page).await?)
    }

    async fn require_live(
        &self,
        session: &mut Session<'_, R::Tx>,
        id: PostId,
    ) -> Result<Post, ServiceError> {
        self.posts
            .find_by_id(session.tx(), id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found("Post not found.")
                    .with_detail("id", id.get())
                    .into()
            })
    }
}

fn empty_content(content: &str) -> DomainError {
    DomainError::validation("Post content cannot be empty.").with_detail("content", content)
}

fn author_not_found(author_id: UserId) -> DomainError {
    DomainError::not_found("Author not found.").with_detail("author_id", author_id.get())
}

#[cfg(test)]
#[path = "post_service_tests.rs"]
mod tests;
