//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use backend::middleware::JwtConfig;
use backend::outbound::memory::MemoryStorage;
use backend::outbound::persistence::DbPool;

/// Where request transactions are opened.
pub enum StorageBackend {
    /// PostgreSQL through the Diesel pool.
    Postgres(DbPool),
    /// Process-local tables, for `APP_TESTING`.
    InMemory(MemoryStorage),
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) jwt: JwtConfig,
    pub(crate) backend: StorageBackend,
}

impl ServerConfig {
    /// Configuration serving from in-memory storage.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, jwt: JwtConfig) -> Self {
        Self {
            bind_addr,
            jwt,
            backend: StorageBackend::InMemory(MemoryStorage::new()),
        }
    }

    /// Serve from PostgreSQL through `pool`.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.backend = StorageBackend::Postgres(pool);
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
