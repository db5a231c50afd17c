use crate::error::BlogError;
use crate::middleware::Requester;
use crate::models::db_operations::comments_db_operations;
use crate::models::Feedback;
use crate::DbPool;
use rusqlite::TransactionBehavior;

fn require_moderator(requester: &Requester, action: &str, target: Feedback) -> Result<(), BlogError> {
    if requester.is_authenticated() {
        return Ok(());
    }
    log::warn!("Rejected anonymous {} of {} {}", action, target.kind(), target.id());
    Err(BlogError::Unauthorized)
}

/// Marks a pending comment or reply as approved and returns the id of the
/// post it belongs to. Approving twice is not an error.
pub fn approve(pool: &DbPool, requester: &Requester, target: Feedback) -> Result<i64, BlogError> {
    require_moderator(requester, "approval", target)?;

    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let post_id = comments_db_operations::parent_post_id(&tx, target)?.ok_or(BlogError::NotFound)?;
    comments_db_operations::mark_approved(&tx, target)?;
    tx.commit()?;

    log::info!(
        "{} {} on post {} approved by '{}'",
        target.kind(),
        target.id(),
        post_id,
        requester.username.as_deref().unwrap_or_default()
    );
    Ok(post_id)
}

/// Deletes a comment (with its replies) or a single reply and returns the id
/// of the post it belonged to.
pub fn remove(pool: &DbPool, requester: &Requester, target: Feedback) -> Result<i64, BlogError> {
    require_moderator(requester, "removal", target)?;

    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let post_id = comments_db_operations::parent_post_id(&tx, target)?.ok_or(BlogError::NotFound)?;
    comments_db_operations::delete_feedback(&tx, target)?;
    tx.commit()?;

    log::info!(
        "{} {} on post {} removed by '{}'",
        target.kind(),
        target.id(),
        post_id,
        requester.username.as_deref().unwrap_or_default()
    );
    Ok(post_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::test_fixtures::{self, moderator};
    use crate::models::db_operations::comments_db_operations::{insert_comment, insert_reply, read_comment, read_reply};

    #[test]
    fn anonymous_moderation_is_refused_and_changes_nothing() {
        let s = test_fixtures::scenario();
        let comment = insert_comment(&s.pool.get().unwrap(), s.p1, "Ann", "hi").unwrap();

        let res = approve(&s.pool, &Requester::anonymous(), Feedback::Comment(comment.id));
        assert!(matches!(res, Err(BlogError::Unauthorized)));
        let res = remove(&s.pool, &Requester::anonymous(), Feedback::Comment(comment.id));
        assert!(matches!(res, Err(BlogError::Unauthorized)));

        let stored = read_comment(&s.pool.get().unwrap(), comment.id).unwrap().unwrap();
        assert!(!stored.approved);
    }

    #[test]
    fn authorization_is_checked_before_existence() {
        let s = test_fixtures::scenario();
        let res = remove(&s.pool, &Requester::anonymous(), Feedback::Reply(4242));
        assert!(matches!(res, Err(BlogError::Unauthorized)));
    }

    #[test]
    fn approve_is_idempotent() {
        let s = test_fixtures::scenario();
        let comment = insert_comment(&s.pool.get().unwrap(), s.p1, "Ann", "hi").unwrap();

        assert_eq!(approve(&s.pool, &moderator(), Feedback::Comment(comment.id)).unwrap(), s.p1);
        assert_eq!(approve(&s.pool, &moderator(), Feedback::Comment(comment.id)).unwrap(), s.p1);

        let stored = read_comment(&s.pool.get().unwrap(), comment.id).unwrap().unwrap();
        assert!(stored.approved);
    }

    #[test]
    fn reply_moderation_resolves_the_owning_post() {
        let s = test_fixtures::scenario();
        let conn = s.pool.get().unwrap();
        let comment = insert_comment(&conn, s.p2, "Ann", "hi").unwrap();
        let reply = insert_reply(&conn, comment.id, "Ben", "hey").unwrap();
        drop(conn);

        assert_eq!(approve(&s.pool, &moderator(), Feedback::Reply(reply.id)).unwrap(), s.p2);
        let stored = read_reply(&s.pool.get().unwrap(), reply.id).unwrap().unwrap();
        assert!(stored.approved);

        assert_eq!(remove(&s.pool, &moderator(), Feedback::Reply(reply.id)).unwrap(), s.p2);
        assert!(read_reply(&s.pool.get().unwrap(), reply.id).unwrap().is_none());
    }

    #[test]
    fn removing_missing_feedback_is_not_found() {
        let s = test_fixtures::scenario();
        assert!(matches!(remove(&s.pool, &moderator(), Feedback::Comment(77)), Err(BlogError::NotFound)));
        assert!(matches!(remove(&s.pool, &moderator(), Feedback::Reply(77)), Err(BlogError::NotFound)));
        assert!(matches!(approve(&s.pool, &moderator(), Feedback::Comment(77)), Err(BlogError::NotFound)));
    }

    #[test]
    fn approving_a_removed_comment_is_not_found() {
        let s = test_fixtures::scenario();
        let comment = insert_comment(&s.pool.get().unwrap(), s.p1, "Ann", "hi").unwrap();

        remove(&s.pool, &moderator(), Feedback::Comment(comment.id)).unwrap();
        let res = approve(&s.pool, &moderator(), Feedback::Comment(comment.id));
        assert!(matches!(res, Err(BlogError::NotFound)));
        let res = remove(&s.pool, &moderator(), Feedback::Comment(comment.id));
        assert!(matches!(res, Err(BlogError::NotFound)));
    }

    #[test]
    fn removing_a_comment_takes_its_replies() {
        let s = test_fixtures::scenario();
        let conn = s.pool.get().unwrap();
        let comment = insert_comment(&conn, s.p1, "Ann", "hi").unwrap();
        let reply = insert_reply(&conn, comment.id, "Ben", "hey").unwrap();
        drop(conn);

        remove(&s.pool, &moderator(), Feedback::Comment(comment.id)).unwrap();
        assert!(read_reply(&s.pool.get().unwrap(), reply.id).unwrap().is_none());
    }
}
