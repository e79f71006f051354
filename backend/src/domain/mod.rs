//! Domain primitives, aggregates, and application services.
//!
//! Purpose: hold the business rules for users and posts and the
//! request-scoped unit of work they run in. Nothing here knows about HTTP or
//! SQL; adapters sit behind the traits in [`ports`].
//!
//! Public surface:
//! - [`DomainError`] / [`ErrorCode`]: business-rule violations.
//! - [`ServiceError`]: what services return (domain or storage failure).
//! - [`UnitOfWork`] / [`Session`]: transaction ownership split.
//! - [`UserService`] / [`PostService`]: the use-cases.

pub mod error;
pub mod ports;
pub mod post;
mod post_service;
pub mod unit_of_work;
pub mod user;
mod user_service;

pub use self::error::{DomainError, ErrorCode, ServiceError};
pub use self::post::{
    CreatePost, DEFAULT_PAGE_LIMIT, DeletePost, NewPost, Page, Post, PostId, UpdatePost,
};
pub use self::post_service::PostService;
pub use self::unit_of_work::{Session, UnitOfWork};
pub use self::user::{CreateUser, NewUser, User, UserId};
pub use self::user_service::UserService;
