use crate::DbPool;
use rusqlite::{Connection, Transaction};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Invalid(String),
}

pub fn setup_blog_db(conn: &mut Connection) -> Result<(), SetupError> {
    let tx = conn.transaction()?;
    create_content_tables(&tx)?;
    create_feedback_tables(&tx)?;
    create_users_table(&tx)?;
    tx.commit()?;
    Ok(())
}

/// In-memory pool with the full schema in place.
pub fn setup_memory_pool() -> Result<DbPool, SetupError> {
    let pool = crate::open_memory_pool()?;
    {
        let mut conn = pool.get()?;
        setup_blog_db(&mut conn)?;
    }
    Ok(pool)
}

fn create_content_tables(tx: &Transaction) -> Result<(), SetupError> {
    log::debug!("Creating 'categories' and 'tags' tables...");
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE
        );
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE
        );",
    )?;

    log::debug!("Creating 'posts', 'post_tags' and 'content_images' tables...");
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            is_public INTEGER NOT NULL DEFAULT 0,
            category_id INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE SET NULL
        );
        CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts (created_at DESC, id DESC);
        CREATE INDEX IF NOT EXISTS idx_posts_category ON posts (category_id);

        CREATE TABLE IF NOT EXISTS post_tags (
            post_id INTEGER NOT NULL,
            tag_id INTEGER NOT NULL,
            PRIMARY KEY (post_id, tag_id),
            FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
            FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_post_tags_tag ON post_tags (tag_id);

        CREATE TABLE IF NOT EXISTS content_images (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            post_id INTEGER NOT NULL,
            file_path TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
        );",
    )?;
    Ok(())
}

fn create_feedback_tables(tx: &Transaction) -> Result<(), SetupError> {
    log::debug!("Creating 'comments' and 'replies' tables...");
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            post_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            text TEXT NOT NULL,
            created_at TEXT NOT NULL,
            approved INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_comments_post ON comments (post_id);

        CREATE TABLE IF NOT EXISTS replies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            comment_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            text TEXT NOT NULL,
            created_at TEXT NOT NULL,
            approved INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (comment_id) REFERENCES comments(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_replies_comment ON replies (comment_id);",
    )?;
    Ok(())
}

fn create_users_table(tx: &Transaction) -> Result<(), SetupError> {
    log::debug!("Creating 'users' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL CHECK(role IN ('admin', 'moderator')),
            is_active INTEGER NOT NULL DEFAULT 1,
            last_login_time TEXT
        )",
        [],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_is_rerunnable() {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_blog_db(&mut conn).unwrap();
        setup_blog_db(&mut conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
                 ('categories', 'tags', 'posts', 'post_tags', 'content_images', 'comments', 'replies', 'users')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 8);
    }

    #[test]
    fn memory_pool_enforces_foreign_keys() {
        let pool = setup_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let res = conn.execute(
            "INSERT INTO comments (post_id, name, text, created_at) VALUES (999, 'a', 'b', '2024-01-01')",
            [],
        );
        assert!(res.is_err());
    }
}
