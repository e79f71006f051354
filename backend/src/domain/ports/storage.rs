//! Storage port: the transactional primitives the unit of work is built on.
//!
//! A [`Storage`] hands out one [`Transaction`] per request. The transaction is
//! the only path to the database for repositories; it owns its connection
//! exclusively until [`Transaction::close`] consumes it.
//!
//! Closing takes `self` by value. Code that only holds `&mut T` (services and
//! repositories) can therefore query, commit, and roll back, but cannot end
//! the connection's lifetime; that stays with whoever owns the value.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Infrastructure failures raised by storage adapters.
    ///
    /// None of these are part of the domain error taxonomy: they propagate to
    /// the request boundary untranslated, triggering rollback and close.
    pub enum StorageError {
        /// A connection could not be obtained or was lost.
        Connection { message: String } => "storage connection failed: {message}",
        /// A statement failed during execution.
        Query { message: String } => "storage query failed: {message}",
        /// A unique constraint rejected the write.
        UniqueViolation { constraint: String } =>
            "unique constraint violated: {constraint}",
        /// A foreign key constraint rejected the write.
        ForeignKeyViolation { constraint: String } =>
            "foreign key constraint violated: {constraint}",
        /// The unit of work was committed already in this request.
        AlreadyCommitted => "unit of work already committed",
        /// The unit of work was used after it had been closed.
        Closed => "unit of work already closed",
    }
}

/// One exclusively-owned connection with an open transaction scope.
///
/// Implementations begin a fresh transaction on first use after a commit or
/// rollback, so reads that follow a commit (entity refreshes) still run
/// inside a scope that `close` will end.
#[async_trait]
pub trait Transaction: Send + Sized + 'static {
    /// Make all writes issued since the last commit durable.
    async fn commit(&mut self) -> Result<(), StorageError>;

    /// Discard uncommitted writes. A no-op when nothing is pending.
    async fn rollback(&mut self) -> Result<(), StorageError>;

    /// End any open transaction without committing and release the
    /// connection.
    async fn close(self) -> Result<(), StorageError>;
}

/// Factory for request-scoped transactions.
#[cfg_attr(test, mockall::automock(type Tx = crate::outbound::memory::MemoryTransaction;))]
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Transaction type handed to repositories.
    type Tx: Transaction;

    /// Acquire a connection and open a transaction on it.
    async fn begin(&self) -> Result<Self::Tx, StorageError>;
}
