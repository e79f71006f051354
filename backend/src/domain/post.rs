//! Post aggregate.
//!
//! Posts are soft deleted: `deleted_at` is stamped and every read path treats
//! the row as absent from then on.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::UserId;

/// Default page size for post listings.
pub const DEFAULT_PAGE_LIMIT: i64 = 100;

/// Database-assigned post identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(i64);

impl PostId {
    /// Wrap a raw identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Identity assigned on insert.
    pub id: PostId,
    /// Author; references an existing user.
    pub author_id: UserId,
    /// Body text, never blank.
    pub content: String,
    /// Optional caption (at most 255 characters).
    pub caption: Option<String>,
    /// Server-generated creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Whether the post has been soft deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Values for a post that has not been inserted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    /// Author identifier.
    pub author_id: UserId,
    /// Body text.
    pub content: String,
    /// Optional caption.
    pub caption: Option<String>,
}

/// Command for [`crate::domain::PostService::create_post`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePost {
    /// Author identifier.
    pub author_id: UserId,
    /// Body text; rejected when blank after trimming.
    pub content: String,
    /// Optional caption.
    pub caption: Option<String>,
}

/// Command for [`crate::domain::PostService::update_post`].
///
/// At least one of `content` or `caption` must be supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePost {
    /// Post to update.
    pub id: PostId,
    /// Replacement body text.
    pub content: Option<String>,
    /// Replacement caption.
    pub caption: Option<String>,
}

/// Command for [`crate::domain::PostService::delete_post`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletePost {
    /// Post to soft delete.
    pub id: PostId,
}

/// Offset pagination window for post listings.
///
/// Bounds are enforced by the transport layer; the domain passes the values
/// through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Maximum number of rows to return.
    pub limit: i64,
    /// Number of rows to skip.
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}
