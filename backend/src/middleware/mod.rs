//! Request middleware.
//!
//! Stages, outermost first, as composed by the server: [`Trace`] (trace id
//! and request span), [`Authenticate`] (placeholder identity), then
//! [`UnitOfWorkScope`] on each API scope.

pub mod auth;
pub mod trace;
pub mod unit_of_work;

pub use auth::{Authenticate, CurrentUser, JwtConfig};
pub use trace::Trace;
pub use unit_of_work::{RequestUnitOfWork, UnitOfWorkScope};
