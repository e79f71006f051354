//! Backend library modules.
//!
//! A social network API (users and posts) in hexagonal layout: [`domain`]
//! holds the services and ports, [`outbound`] the storage adapters,
//! [`inbound`] the HTTP adapter, and [`middleware`] the request stages the
//! binary composes around it.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

pub use middleware::Trace;
