//! In-memory storage backend.
//!
//! Selected with `APP_TESTING`. It honours the same transaction contract as
//! the PostgreSQL adapter (snapshot reads, atomic commit, constraint checks)
//! and exposes lifecycle counters and fault switches for tests.

mod posts;
mod storage;
mod users;

pub use posts::MemoryPostRepository;
pub use storage::{MemoryStats, MemoryStorage, MemoryTransaction};
pub use users::MemoryUserRepository;
