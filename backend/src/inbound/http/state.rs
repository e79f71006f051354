//! Shared HTTP adapter state.
//!
//! Bundles the storage that request scopes begin transactions on with the
//! services handlers call. The repository types must run on the storage's
//! transaction type, which the bounds on [`HttpState::new`] enforce.

use std::sync::Arc;

use actix_web::web;

use crate::domain::ports::{PostRepository, Storage, UserRepository};
use crate::domain::{PostService, UserService};

/// Dependency bundle for HTTP handlers.
pub struct HttpState<S, U, P> {
    pub storage: Arc<S>,
    pub users: web::Data<UserService<U>>,
    pub posts: web::Data<PostService<P>>,
}

impl<S, U, P> Clone for HttpState<S, U, P> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            users: self.users.clone(),
            posts: self.posts.clone(),
        }
    }
}

impl<S, U, P> HttpState<S, U, P>
where
    S: Storage,
    U: UserRepository<Tx = S::Tx>,
    P: PostRepository<Tx = S::Tx>,
{
    /// Wire services to the storage their repositories share.
    pub fn new(storage: Arc<S>, users: UserService<U>, posts: PostService<P>) -> Self {
        Self {
            storage,
            users: web::Data::new(users),
            posts: web::Data::new(posts),
        }
    }
}
