//! User aggregate.
//!
//! Users are hard deleted; removing one cascades to the posts they authored.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database-assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Identity assigned on insert.
    pub id: UserId,
    /// Unique email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Optional age in years.
    pub age: Option<i32>,
    /// Server-generated creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Values for a user that has not been inserted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Unique email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Optional age in years.
    pub age: Option<i32>,
}

/// Command for [`crate::domain::UserService::create_user`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUser {
    /// Email address; must not belong to another user.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Optional age in years.
    pub age: Option<i32>,
}
