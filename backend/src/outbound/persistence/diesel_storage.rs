//! PostgreSQL `Storage` adapter.
//!
//! A [`DieselTransaction`] owns one pooled connection for the lifetime of a
//! request and drives Diesel's ANSI transaction manager on it directly:
//!
//! - `begin` checks a connection out and issues `BEGIN`.
//! - `commit`/`rollback` end the current transaction; the next query opens a
//!   fresh one, so post-commit refreshes stay inside a scope.
//! - `close` rolls back anything still open and returns the connection.
//!
//! If the transaction is dropped without `close`, the connection goes back to
//! bb8 with the transaction manager still marked as inside a transaction;
//! the pool treats that connection as broken and discards it.

use async_trait::async_trait;
use diesel_async::pooled_connection::bb8::PooledConnection;
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, TransactionManager};
use tracing::debug;

use crate::domain::ports::{Storage, StorageError, Transaction};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::pool::DbPool;

/// Diesel-backed implementation of the [`Storage`] port.
#[derive(Clone)]
pub struct DieselStorage {
    pool: DbPool,
}

impl DieselStorage {
    /// Create storage over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Storage for DieselStorage {
    type Tx = DieselTransaction;

    async fn begin(&self) -> Result<Self::Tx, StorageError> {
        let conn = self.pool.get_owned().await.map_err(map_pool_error)?;
        let mut tx = DieselTransaction { conn, open: false };
        tx.open_scope().await?;
        Ok(tx)
    }
}

/// One request's connection and its current transaction.
pub struct DieselTransaction {
    conn: PooledConnection<'static, AsyncPgConnection>,
    open: bool,
}

impl DieselTransaction {
    /// Connection for repository queries, inside an open transaction.
    ///
    /// # Errors
    /// Fails when a new transaction cannot be started after a commit or
    /// rollback.
    pub(super) async fn connection(&mut self) -> Result<&mut AsyncPgConnection, StorageError> {
        if !self.open {
            self.open_scope().await?;
        }
        Ok(&mut *self.conn)
    }

    async fn open_scope(&mut self) -> Result<(), StorageError> {
        AnsiTransactionManager::begin_transaction(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        self.open = true;
        debug!("database transaction opened");
        Ok(())
    }

    fn sync_open_flag(&mut self) {
        self.open = matches!(
            AnsiTransactionManager::transaction_manager_status_mut(&mut *self.conn)
                .transaction_depth(),
            Ok(Some(_))
        );
    }
}

#[async_trait]
impl Transaction for DieselTransaction {
    async fn commit(&mut self) -> Result<(), StorageError> {
        if !self.open {
            return Ok(());
        }
        let result = AnsiTransactionManager::commit_transaction(&mut *self.conn).await;
        self.sync_open_flag();
        result.map_err(map_diesel_error)
    }

    async fn rollback(&mut self) -> Result<(), StorageError> {
        if !self.open {
            return Ok(());
        }
        let result = AnsiTransactionManager::rollback_transaction(&mut *self.conn).await;
        self.sync_open_flag();
        result.map_err(map_diesel_error)
    }

    async fn close(mut self) -> Result<(), StorageError> {
        let result = self.rollback().await;
        debug!(released = !self.open, "database connection returned to pool");
        result
    }
}
