//! Process-local storage with snapshot transactions.
//!
//! Each transaction works on a private copy of the tables taken at begin (and
//! again after every commit or rollback). Writes land in that copy and in a
//! pending change log; commit replays the log against the shared tables under
//! one lock, re-checking constraints so concurrent writers still collide on
//! email uniqueness and author references.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::domain::ports::{Storage, StorageError, Transaction};
use crate::domain::{NewPost, NewUser, Post, PostId, User, UserId};

pub(super) const USERS_EMAIL_KEY: &str = "users_email_key";
pub(super) const POSTS_AUTHOR_FKEY: &str = "posts_author_id_fkey";

#[derive(Debug, Clone, Default)]
pub(super) struct Tables {
    pub(super) users: BTreeMap<UserId, User>,
    pub(super) posts: BTreeMap<PostId, Post>,
}

impl Tables {
    fn email_taken(&self, email: &str, except: UserId) -> bool {
        self.users
            .values()
            .any(|user| user.id != except && user.email == email)
    }

    fn remove_user(&mut self, id: UserId) {
        self.users.remove(&id);
        self.posts.retain(|_, post| post.author_id != id);
    }

    fn apply(&mut self, change: &Change) -> Result<(), StorageError> {
        match change {
            Change::InsertUser(user) => {
                if self.email_taken(&user.email, user.id) {
                    return Err(StorageError::unique_violation(USERS_EMAIL_KEY));
                }
                self.users.insert(user.id, user.clone());
            }
            Change::DeleteUser(id) => self.remove_user(*id),
            Change::PutPost(post) => {
                if !self.users.contains_key(&post.author_id) {
                    return Err(StorageError::foreign_key_violation(POSTS_AUTHOR_FKEY));
                }
                self.posts.insert(post.id, post.clone());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Change {
    InsertUser(User),
    DeleteUser(UserId),
    PutPost(Post),
}

#[derive(Default)]
struct Counters {
    begins: AtomicU64,
    commits: AtomicU64,
    rollbacks: AtomicU64,
    closes: AtomicU64,
    inserts: AtomicU64,
}

#[derive(Default)]
struct Shared {
    tables: Mutex<Tables>,
    user_seq: AtomicI64,
    post_seq: AtomicI64,
    counters: Counters,
    fail_begin: AtomicBool,
    fail_queries: AtomicBool,
}

impl Shared {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Tables {
        self.tables().clone()
    }
}

/// Point-in-time view of the lifecycle counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Transactions handed out by [`Storage::begin`].
    pub begins: u64,
    /// Successful commits.
    pub commits: u64,
    /// Rollback calls, including ones with nothing to undo.
    pub rollbacks: u64,
    /// Transactions whose connection was released, by close or by drop.
    pub closes: u64,
    /// Rows flushed by insert statements, committed or not.
    pub inserts: u64,
}

impl MemoryStats {
    /// Transactions begun but not yet released.
    pub fn open(&self) -> u64 {
        self.begins.saturating_sub(self.closes)
    }
}

/// In-memory [`Storage`] used for `APP_TESTING` and the test suites.
///
/// Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    shared: Arc<Shared>,
}

impl MemoryStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lifecycle counters.
    pub fn stats(&self) -> MemoryStats {
        let counters = &self.shared.counters;
        MemoryStats {
            begins: counters.begins.load(Ordering::SeqCst),
            commits: counters.commits.load(Ordering::SeqCst),
            rollbacks: counters.rollbacks.load(Ordering::SeqCst),
            closes: counters.closes.load(Ordering::SeqCst),
            inserts: counters.inserts.load(Ordering::SeqCst),
        }
    }

    /// Make [`Storage::begin`] fail as if no connection were available.
    pub fn fail_begin(&self, enabled: bool) {
        self.shared.fail_begin.store(enabled, Ordering::SeqCst);
    }

    /// Make every repository call fail with [`StorageError::Query`].
    pub fn fail_queries(&self, enabled: bool) {
        self.shared.fail_queries.store(enabled, Ordering::SeqCst);
    }

    /// Number of committed users.
    pub fn user_count(&self) -> usize {
        self.shared.tables().users.len()
    }

    /// Number of committed posts, soft-deleted ones included.
    pub fn post_count(&self) -> usize {
        self.shared.tables().posts.len()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx, StorageError> {
        if self.shared.fail_begin.load(Ordering::SeqCst) {
            return Err(StorageError::connection("memory storage refused connection"));
        }
        self.shared.counters.begins.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryTransaction {
            view: self.shared.snapshot(),
            shared: Arc::clone(&self.shared),
            pending: Vec::new(),
            closed: false,
        })
    }
}

/// Snapshot transaction over [`MemoryStorage`].
pub struct MemoryTransaction {
    shared: Arc<Shared>,
    view: Tables,
    pending: Vec<Change>,
    closed: bool,
}

impl MemoryTransaction {
    /// Tables as seen by this transaction, after a fault check.
    pub(super) fn read(&self) -> Result<&Tables, StorageError> {
        if self.shared.fail_queries.load(Ordering::SeqCst) {
            return Err(StorageError::query("memory storage query failure"));
        }
        Ok(&self.view)
    }

    pub(super) fn insert_user(&mut self, new_user: &NewUser) -> Result<User, StorageError> {
        let view = self.read()?;
        if view.email_taken(&new_user.email, UserId::new(0)) {
            return Err(StorageError::unique_violation(USERS_EMAIL_KEY));
        }
        let id = UserId::new(self.shared.user_seq.fetch_add(1, Ordering::SeqCst) + 1);
        let user = User {
            id,
            email: new_user.email.clone(),
            name: new_user.name.clone(),
            age: new_user.age,
            created_at: Utc::now(),
        };
        self.view.users.insert(id, user.clone());
        self.pending.push(Change::InsertUser(user.clone()));
        self.shared.counters.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(user)
    }

    pub(super) fn delete_user(&mut self, id: UserId) -> Result<(), StorageError> {
        self.read()?;
        self.view.remove_user(id);
        self.pending.push(Change::DeleteUser(id));
        Ok(())
    }

    pub(super) fn insert_post(&mut self, new_post: &NewPost) -> Result<Post, StorageError> {
        if !self.read()?.users.contains_key(&new_post.author_id) {
            return Err(StorageError::foreign_key_violation(POSTS_AUTHOR_FKEY));
        }
        let id = PostId::new(self.shared.post_seq.fetch_add(1, Ordering::SeqCst) + 1);
        let post = Post {
            id,
            author_id: new_post.author_id,
            content: new_post.content.clone(),
            caption: new_post.caption.clone(),
            created_at: Utc::now(),
            deleted_at: None,
        };
        self.put_post(post.clone());
        self.shared.counters.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(post)
    }

    /// Overwrite a post row in the view and log the change.
    pub(super) fn put_post(&mut self, post: Post) {
        self.view.posts.insert(post.id, post.clone());
        self.pending.push(Change::PutPost(post));
    }

    fn resnapshot(&mut self) {
        self.pending.clear();
        self.view = self.shared.snapshot();
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(&mut self) -> Result<(), StorageError> {
        let outcome = {
            let mut tables = self.shared.tables();
            let mut next = tables.clone();
            let replayed = self
                .pending
                .iter()
                .try_for_each(|change| next.apply(change));
            if replayed.is_ok() {
                *tables = next;
            }
            replayed
        };
        let changes = self.pending.len();
        self.resnapshot();
        outcome?;
        self.shared.counters.commits.fetch_add(1, Ordering::SeqCst);
        debug!(changes, "memory transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StorageError> {
        self.shared.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
        self.resnapshot();
        Ok(())
    }

    async fn close(mut self) -> Result<(), StorageError> {
        self.closed = true;
        self.pending.clear();
        self.shared.counters.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if !self.closed {
            self.shared.counters.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn storage() -> MemoryStorage {
        MemoryStorage::new()
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_owned(),
            name: "Ada".to_owned(),
            age: None,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn writes_are_invisible_until_commit(storage: MemoryStorage) {
        let mut writer = storage.begin().await.expect("begin writer");
        writer.insert_user(&new_user("ada@example.com")).expect("insert");
        assert_eq!(storage.user_count(), 0);

        writer.commit().await.expect("commit");
        assert_eq!(storage.user_count(), 1);
        assert_eq!(storage.stats().inserts, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn rollback_discards_pending_writes(storage: MemoryStorage) {
        let mut tx = storage.begin().await.expect("begin");
        tx.insert_user(&new_user("ada@example.com")).expect("insert");

        tx.rollback().await.expect("rollback");
        tx.commit().await.expect("empty commit");

        assert_eq!(storage.user_count(), 0);
        assert!(tx.read().expect("read").users.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn concurrent_duplicate_email_fails_at_commit(storage: MemoryStorage) {
        let mut first = storage.begin().await.expect("begin first");
        let mut second = storage.begin().await.expect("begin second");
        first.insert_user(&new_user("ada@example.com")).expect("first insert");
        second
            .insert_user(&new_user("ada@example.com"))
            .expect("second insert sees its own snapshot");

        first.commit().await.expect("first commit");
        let err = second.commit().await.expect_err("second commit");

        assert_eq!(err, StorageError::unique_violation(USERS_EMAIL_KEY));
        assert_eq!(storage.user_count(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_a_user_cascades_to_posts(storage: MemoryStorage) {
        let mut tx = storage.begin().await.expect("begin");
        let user = tx.insert_user(&new_user("ada@example.com")).expect("user");
        tx.insert_post(&NewPost {
            author_id: user.id,
            content: "hello".to_owned(),
            caption: None,
        })
        .expect("post");
        tx.commit().await.expect("commit");

        tx.delete_user(user.id).expect("delete");
        tx.commit().await.expect("commit delete");

        assert_eq!((storage.user_count(), storage.post_count()), (0, 0));
    }

    #[rstest]
    #[tokio::test]
    async fn post_for_unknown_author_violates_foreign_key(storage: MemoryStorage) {
        let mut tx = storage.begin().await.expect("begin");
        let err = tx
            .insert_post(&NewPost {
                author_id: UserId::new(42),
                content: "orphan".to_owned(),
                caption: None,
            })
            .expect_err("missing author");

        assert_eq!(err, StorageError::foreign_key_violation(POSTS_AUTHOR_FKEY));
    }

    #[rstest]
    #[tokio::test]
    async fn injected_faults_surface_as_storage_errors(storage: MemoryStorage) {
        storage.fail_begin(true);
        assert!(matches!(
            storage.begin().await,
            Err(StorageError::Connection { .. })
        ));

        storage.fail_begin(false);
        storage.fail_queries(true);
        let tx = storage.begin().await.expect("begin");
        assert!(matches!(tx.read(), Err(StorageError::Query { .. })));
    }

    #[rstest]
    #[tokio::test]
    async fn close_and_drop_count_one_release(storage: MemoryStorage) {
        let closed = storage.begin().await.expect("begin closed");
        closed.close().await.expect("close");
        let dropped = storage.begin().await.expect("begin dropped");
        drop(dropped);

        let stats = storage.stats();
        assert_eq!((stats.begins, stats.closes, stats.open()), (2, 2, 0));
    }
}
