//! Request-scoped unit of work.
//!
//! Ownership is split between two types:
//!
//! - [`UnitOfWork`] owns the transaction. Only its holder (the request-scoping
//!   middleware) can roll back at the boundary or close it.
//! - [`Session`] is a borrowed view handed to services. It can reach the
//!   transaction for repository calls and commit once, but it has no way to
//!   close: [`Transaction::close`] consumes the transaction, which a borrow
//!   cannot give up.
//!
//! Dropping a `UnitOfWork` that was never closed (cancelled request, panic)
//! drops the transaction, which releases its connection.

use tracing::{debug, warn};

use crate::domain::ports::{StorageError, Transaction};

/// Owner of the single transaction opened for a request.
pub struct UnitOfWork<T: Transaction> {
    tx: Option<T>,
    committed: bool,
}

impl<T: Transaction> UnitOfWork<T> {
    /// Take ownership of a freshly begun transaction.
    pub fn new(tx: T) -> Self {
        Self {
            tx: Some(tx),
            committed: false,
        }
    }

    /// Borrow a commit-capable session for a service call.
    ///
    /// # Errors
    /// Returns [`StorageError::Closed`] once the unit of work has been closed.
    pub fn session(&mut self) -> Result<Session<'_, T>, StorageError> {
        let tx = self.tx.as_mut().ok_or_else(StorageError::closed)?;
        Ok(Session {
            tx,
            committed: &mut self.committed,
        })
    }

    /// Whether a service committed through this unit of work.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Whether [`UnitOfWork::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }

    /// Discard uncommitted writes. Safe to call after a commit, where it has
    /// nothing left to undo.
    ///
    /// # Errors
    /// Propagates the storage failure; the unit of work stays open so it can
    /// still be closed.
    pub async fn rollback(&mut self) -> Result<(), StorageError> {
        match self.tx.as_mut() {
            Some(tx) => {
                debug!(committed = self.committed, "rolling back unit of work");
                tx.rollback().await
            }
            None => Err(StorageError::closed()),
        }
    }

    /// End the transaction scope and release the connection. Idempotent:
    /// only the first call reaches storage.
    ///
    /// # Errors
    /// Propagates the storage failure raised while closing. The connection is
    /// released either way because the transaction has been consumed.
    pub async fn close(&mut self) -> Result<(), StorageError> {
        match self.tx.take() {
            Some(tx) => {
                debug!(committed = self.committed, "closing unit of work");
                tx.close().await
            }
            None => Ok(()),
        }
    }
}

impl<T: Transaction> Drop for UnitOfWork<T> {
    fn drop(&mut self) {
        if self.tx.take().is_some() {
            warn!("unit of work dropped before close; releasing connection without rollback");
        }
    }
}

/// Borrowed, commit-capable view of a [`UnitOfWork`].
pub struct Session<'a, T: Transaction> {
    tx: &'a mut T,
    committed: &'a mut bool,
}

impl<T: Transaction> Session<'_, T> {
    /// Transaction handle for repository calls.
    pub fn tx(&mut self) -> &mut T {
        &mut *self.tx
    }

    /// Commit the request's writes. A request commits at most once.
    ///
    /// # Errors
    /// Returns [`StorageError::AlreadyCommitted`] on a second call, or the
    /// storage failure raised by the commit itself.
    pub async fn commit(&mut self) -> Result<(), StorageError> {
        if *self.committed {
            return Err(StorageError::already_committed());
        }
        self.tx.commit().await?;
        *self.committed = true;
        debug!("unit of work committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Lifecycle checks against the in-memory backend.

    use super::*;
    use crate::domain::ports::Storage;
    use crate::outbound::memory::MemoryStorage;
    use rstest::{fixture, rstest};

    #[fixture]
    fn storage() -> MemoryStorage {
        MemoryStorage::new()
    }

    #[rstest]
    #[tokio::test]
    async fn second_commit_is_rejected(storage: MemoryStorage) {
        let mut uow = UnitOfWork::new(storage.begin().await.expect("begin"));
        let mut session = uow.session().expect("open session");

        session.commit().await.expect("first commit");
        let err = session.commit().await.expect_err("second commit");

        assert_eq!(err, StorageError::AlreadyCommitted);
        assert_eq!(storage.stats().commits, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn close_runs_once(storage: MemoryStorage) {
        let mut uow = UnitOfWork::new(storage.begin().await.expect("begin"));

        uow.close().await.expect("close");
        uow.close().await.expect("second close is a no-op");
        drop(uow);

        let stats = storage.stats();
        assert_eq!(stats.begins, 1);
        assert_eq!(stats.closes, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn session_is_unavailable_after_close(storage: MemoryStorage) {
        let mut uow = UnitOfWork::new(storage.begin().await.expect("begin"));
        uow.close().await.expect("close");

        assert!(uow.is_closed());
        assert!(matches!(uow.session(), Err(StorageError::Closed)));
        assert!(matches!(uow.rollback().await, Err(StorageError::Closed)));
    }

    #[rstest]
    #[tokio::test]
    async fn dropping_an_open_unit_of_work_releases_the_connection(storage: MemoryStorage) {
        let uow = UnitOfWork::new(storage.begin().await.expect("begin"));
        drop(uow);

        let stats = storage.stats();
        assert_eq!(stats.closes, 1);
        assert_eq!(stats.commits, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn rollback_after_commit_keeps_committed_state(storage: MemoryStorage) {
        let mut uow = UnitOfWork::new(storage.begin().await.expect("begin"));
        uow.session()
            .expect("open session")
            .commit()
            .await
            .expect("commit");

        uow.rollback().await.expect("rollback is a no-op");
        uow.close().await.expect("close");

        assert!(uow.is_committed());
        let stats = storage.stats();
        assert_eq!((stats.commits, stats.rollbacks, stats.closes), (1, 1, 1));
    }
}
