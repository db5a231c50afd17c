use crate::models::{Comment, CommentThread, Feedback, Reply};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result as RusqliteResult, Row};

fn table_for(target: Feedback) -> &'static str {
    match target {
        Feedback::Comment(_) => "comments",
        Feedback::Reply(_) => "replies",
    }
}

fn map_comment(row: &Row) -> RusqliteResult<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        name: row.get(2)?,
        text: row.get(3)?,
        created_at: row.get(4)?,
        approved: row.get(5)?,
    })
}

fn map_reply(row: &Row) -> RusqliteResult<Reply> {
    Ok(Reply {
        id: row.get(0)?,
        comment_id: row.get(1)?,
        name: row.get(2)?,
        text: row.get(3)?,
        created_at: row.get(4)?,
        approved: row.get(5)?,
    })
}

/// New comments always start out unapproved.
pub fn insert_comment(conn: &Connection, post_id: i64, name: &str, text: &str) -> RusqliteResult<Comment> {
    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO comments (post_id, name, text, created_at, approved) VALUES (?1, ?2, ?3, ?4, 0)",
        params![post_id, name, text, created_at],
    )?;
    Ok(Comment {
        id: conn.last_insert_rowid(),
        post_id,
        name: name.to_string(),
        text: text.to_string(),
        created_at,
        approved: false,
    })
}

pub fn insert_reply(conn: &Connection, comment_id: i64, name: &str, text: &str) -> RusqliteResult<Reply> {
    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO replies (comment_id, name, text, created_at, approved) VALUES (?1, ?2, ?3, ?4, 0)",
        params![comment_id, name, text, created_at],
    )?;
    Ok(Reply {
        id: conn.last_insert_rowid(),
        comment_id,
        name: name.to_string(),
        text: text.to_string(),
        created_at,
        approved: false,
    })
}

pub fn read_comment(conn: &Connection, id: i64) -> RusqliteResult<Option<Comment>> {
    conn.query_row(
        "SELECT id, post_id, name, text, created_at, approved FROM comments WHERE id = ?1",
        [id],
        map_comment,
    )
    .optional()
}

pub fn read_reply(conn: &Connection, id: i64) -> RusqliteResult<Option<Reply>> {
    conn.query_row(
        "SELECT id, comment_id, name, text, created_at, approved FROM replies WHERE id = ?1",
        [id],
        map_reply,
    )
    .optional()
}

/// Oldest first, replies nested under their comment. With `include_pending`
/// unset only approved comments and approved replies are returned.
pub fn read_threads_for_post(
    conn: &Connection,
    post_id: i64,
    include_pending: bool,
) -> RusqliteResult<Vec<CommentThread>> {
    let mut comment_stmt = conn.prepare(
        "SELECT id, post_id, name, text, created_at, approved FROM comments \
         WHERE post_id = ?1 AND (approved = 1 OR ?2) ORDER BY created_at, id",
    )?;
    let mut reply_stmt = conn.prepare(
        "SELECT id, comment_id, name, text, created_at, approved FROM replies \
         WHERE comment_id = ?1 AND (approved = 1 OR ?2) ORDER BY created_at, id",
    )?;

    let comments = comment_stmt
        .query_map(params![post_id, include_pending], map_comment)?
        .collect::<RusqliteResult<Vec<_>>>()?;

    let mut threads = Vec::with_capacity(comments.len());
    for comment in comments {
        let replies = reply_stmt
            .query_map(params![comment.id, include_pending], map_reply)?
            .collect::<RusqliteResult<Vec<_>>>()?;
        threads.push(CommentThread { comment, replies });
    }
    Ok(threads)
}

/// The post a comment or reply ultimately hangs off, if it still exists.
pub fn parent_post_id(conn: &Connection, target: Feedback) -> RusqliteResult<Option<i64>> {
    let sql = match target {
        Feedback::Comment(_) => "SELECT post_id FROM comments WHERE id = ?1",
        Feedback::Reply(_) => {
            "SELECT c.post_id FROM replies r JOIN comments c ON c.id = r.comment_id WHERE r.id = ?1"
        }
    };
    conn.query_row(sql, [target.id()], |row| row.get(0)).optional()
}

pub fn mark_approved(conn: &Connection, target: Feedback) -> RusqliteResult<usize> {
    let sql = format!("UPDATE {} SET approved = 1 WHERE id = ?1", table_for(target));
    conn.execute(&sql, [target.id()])
}

/// Hard delete. Removing a comment takes its replies with it.
pub fn delete_feedback(conn: &Connection, target: Feedback) -> RusqliteResult<usize> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", table_for(target));
    conn.execute(&sql, [target.id()])
}
