use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

pub type DbPool = Pool<SqliteConnectionManager>;

pub mod config;
pub mod error;
pub mod helper;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod setup;

// Every pooled connection needs foreign keys on, otherwise the cascades
// from posts to comments/replies/images silently do nothing.
fn with_pragmas(manager: SqliteConnectionManager) -> SqliteConnectionManager {
    manager.with_init(|conn| {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    })
}

/// Builds the shared connection pool on top of the blog database file.
pub fn open_pool(db_path: &Path) -> Result<DbPool, r2d2::Error> {
    Pool::builder().build(with_pragmas(SqliteConnectionManager::file(db_path)))
}

/// A pool holding exactly one in-memory connection. Every checkout sees the
/// same database, which is what the test suites rely on.
pub fn open_memory_pool() -> Result<DbPool, r2d2::Error> {
    Pool::builder()
        .max_size(1)
        .build(with_pragmas(SqliteConnectionManager::memory()))
}
