//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{NewPost, NewUser, Post, PostId, User, UserId};

use super::schema::{posts, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub age: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            email: row.email,
            name: row.name,
            age: row.age,
            created_at: row.created_at,
        }
    }
}

/// Insertable struct for new user records. `id` and `created_at` are
/// assigned by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub age: Option<i32>,
}

impl<'a> From<&'a NewUser> for NewUserRow<'a> {
    fn from(user: &'a NewUser) -> Self {
        Self {
            email: &user.email,
            name: &user.name,
            age: user.age,
        }
    }
}

/// Row struct for reading from the posts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PostRow {
    pub id: i64,
    pub author_id: i64,
    pub content: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: PostId::new(row.id),
            author_id: UserId::new(row.author_id),
            content: row.content,
            caption: row.caption,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Insertable struct for new post records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
pub(crate) struct NewPostRow<'a> {
    pub author_id: i64,
    pub content: &'a str,
    pub caption: Option<&'a str>,
}

impl<'a> From<&'a NewPost> for NewPostRow<'a> {
    fn from(post: &'a NewPost) -> Self {
        Self {
            author_id: post.author_id.get(),
            content: &post.content,
            caption: post.caption.as_deref(),
        }
    }
}

/// Changeset for the mutable post columns. `caption` is written even when
/// `None` so a cleared caption reaches the row.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = posts)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct PostChangeset<'a> {
    pub content: &'a str,
    pub caption: Option<&'a str>,
}

impl<'a> From<&'a Post> for PostChangeset<'a> {
    fn from(post: &'a Post) -> Self {
        Self {
            content: &post.content,
            caption: post.caption.as_deref(),
        }
    }
}
