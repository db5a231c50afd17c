use crate::models::Moderator;
use bcrypt::{hash, verify, BcryptError};
use chrono::Utc;
use rusqlite::{params, Connection, Error as RusqliteError, OptionalExtension, Result as RusqliteResult, Row};

fn bcrypt_to_rusqlite_error(e: BcryptError) -> RusqliteError {
    RusqliteError::ToSqlConversionFailure(Box::new(e))
}

fn map_moderator(row: &Row) -> RusqliteResult<Moderator> {
    Ok(Moderator {
        id: row.get(0)?,
        username: row.get(1)?,
        role: row.get(2)?,
        is_active: row.get(3)?,
        last_login_time: row.get(4)?,
    })
}

pub fn create_user(
    conn: &Connection,
    username: &str,
    password: &str,
    role: &str,
) -> Result<i64, RusqliteError> {
    let hashed_password = hash(password, bcrypt::DEFAULT_COST).map_err(bcrypt_to_rusqlite_error)?;
    conn.execute(
        "INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, ?3)",
        params![username, hashed_password, role],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_all_users(conn: &Connection) -> Result<Vec<Moderator>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT id, username, role, is_active, last_login_time FROM users ORDER BY id",
    )?;
    let users = stmt
        .query_map([], map_moderator)?
        .collect::<RusqliteResult<Vec<_>>>()?;
    Ok(users)
}

pub fn read_user_by_username(conn: &Connection, username: &str) -> RusqliteResult<Option<Moderator>> {
    conn.query_row(
        "SELECT id, username, role, is_active, last_login_time FROM users WHERE username = ?1",
        [username],
        map_moderator,
    )
    .optional()
}

/// Returns `(username, role)` when the password matches an active account.
pub fn verify_credentials(
    conn: &Connection,
    username: &str,
    password: &str,
) -> Option<(String, String)> {
    let res: rusqlite::Result<(String, String, bool)> = conn.query_row(
        "SELECT password_hash, role, is_active FROM users WHERE username = ?1",
        [username],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    );

    if let Ok((hash, role, is_active)) = res {
        if is_active && verify(password, &hash).unwrap_or(false) {
            return Some((username.to_string(), role));
        }
    }
    None
}

pub fn update_last_login_time(conn: &Connection, username: &str) -> Result<(), RusqliteError> {
    conn.execute(
        "UPDATE users SET last_login_time = ?1 WHERE username = ?2",
        params![Utc::now(), username],
    )?;
    Ok(())
}

pub fn change_password(conn: &Connection, username: &str, new_password: &str) -> Result<usize, RusqliteError> {
    let hashed_password = hash(new_password, bcrypt::DEFAULT_COST).map_err(bcrypt_to_rusqlite_error)?;
    conn.execute(
        "UPDATE users SET password_hash = ?1 WHERE username = ?2",
        params![hashed_password, username],
    )
}

pub fn set_user_active(conn: &Connection, username: &str, is_active: bool) -> Result<usize, RusqliteError> {
    conn.execute(
        "UPDATE users SET is_active = ?1 WHERE username = ?2",
        params![is_active, username],
    )
}
