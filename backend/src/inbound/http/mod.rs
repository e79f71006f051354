//! HTTP inbound adapter exposing REST endpoints.
//!
//! Handlers decode and validate payloads into domain commands, call a service
//! on the request's unit-of-work session, and wrap the result in the response
//! envelope. Failures leave through [`ApiResult`] and are rendered by
//! [`error`].

use std::sync::Arc;

use actix_web::web;

use crate::domain::ports::{PostRepository, Storage, UserRepository};
use crate::middleware::UnitOfWorkScope;

pub mod envelope;
pub mod error;
pub mod health;
pub mod posts;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;
pub use state::HttpState;

/// Mount the `/users` and `/posts` scopes, each wrapped in a unit-of-work
/// scope on the shared storage.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use actix_web::App;
/// use backend::domain::{PostService, UserService};
/// use backend::inbound::http::{HttpState, configure_api};
/// use backend::outbound::memory::{MemoryPostRepository, MemoryStorage, MemoryUserRepository};
/// use mockable::DefaultClock;
///
/// let state = HttpState::new(
///     Arc::new(MemoryStorage::new()),
///     UserService::new(Arc::new(MemoryUserRepository)),
///     PostService::new(Arc::new(MemoryPostRepository), Arc::new(DefaultClock)),
/// );
/// let _app = App::new().configure(configure_api(state));
/// ```
pub fn configure_api<S, U, P>(state: HttpState<S, U, P>) -> impl FnOnce(&mut web::ServiceConfig)
where
    S: Storage,
    U: UserRepository<Tx = S::Tx>,
    P: PostRepository<Tx = S::Tx>,
{
    move |cfg| {
        let HttpState {
            storage,
            users: user_service,
            posts: post_service,
        } = state;
        cfg.app_data(validation::json_config())
            .app_data(validation::query_config())
            .app_data(user_service)
            .app_data(post_service)
            .service(
                web::scope("/users")
                    .configure(users::routes::<U>)
                    .wrap(UnitOfWorkScope::new(Arc::clone(&storage))),
            )
            .service(
                web::scope("/posts")
                    .configure(posts::routes::<P>)
                    .wrap(UnitOfWorkScope::new(storage)),
            );
    }
}
