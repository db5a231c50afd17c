use crate::error::BlogError;
use crate::helper::form_helpers::FeedbackForm;
use crate::models::db_operations::{comments_db_operations, posts_db_operations};
use crate::models::{Comment, Feedback, Reply};
use crate::DbPool;
use rusqlite::TransactionBehavior;
use std::collections::HashMap;

#[derive(Debug)]
pub struct SubmittedReply {
    pub reply: Reply,
    /// Where the submitter gets sent back to.
    pub post_id: i64,
}

/// Stores a pending comment on `post_id`. A missing post wins over invalid
/// form data; nothing is written unless both checks pass.
pub fn submit_comment(
    pool: &DbPool,
    post_id: i64,
    fields: &HashMap<String, String>,
) -> Result<Comment, BlogError> {
    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if !posts_db_operations::post_exists(&tx, post_id)? {
        return Err(BlogError::NotFound);
    }
    let form = FeedbackForm::validate(fields).map_err(BlogError::Validation)?;

    let comment = comments_db_operations::insert_comment(&tx, post_id, &form.name, &form.text)?;
    tx.commit()?;
    log::info!("Comment {} submitted on post {}, awaiting approval", comment.id, post_id);
    Ok(comment)
}

pub fn submit_reply(
    pool: &DbPool,
    comment_id: i64,
    fields: &HashMap<String, String>,
) -> Result<SubmittedReply, BlogError> {
    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let post_id = comments_db_operations::parent_post_id(&tx, Feedback::Comment(comment_id))?
        .ok_or(BlogError::NotFound)?;
    let form = FeedbackForm::validate(fields).map_err(BlogError::Validation)?;

    let reply = comments_db_operations::insert_reply(&tx, comment_id, &form.name, &form.text)?;
    tx.commit()?;
    log::info!("Reply {} submitted on comment {}, awaiting approval", reply.id, comment_id);
    Ok(SubmittedReply { reply, post_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::moderation_helpers;
    use crate::helper::test_fixtures::{self, moderator};
    use crate::middleware::Requester;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn count(pool: &DbPool, table: &str) -> i64 {
        let conn = pool.get().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn comment_starts_pending_and_is_approved_by_a_moderator() {
        let s = test_fixtures::scenario();
        let comment = submit_comment(&s.pool, s.p1, &fields(&[("text", "hi")])).unwrap();
        assert!(!comment.approved);
        assert_eq!(comment.post_id, s.p1);

        let res = moderation_helpers::approve(&s.pool, &Requester::anonymous(), Feedback::Comment(comment.id));
        assert!(matches!(res, Err(BlogError::Unauthorized)));

        let post_id = moderation_helpers::approve(&s.pool, &moderator(), Feedback::Comment(comment.id)).unwrap();
        assert_eq!(post_id, s.p1);
        let stored = comments_db_operations::read_comment(&s.pool.get().unwrap(), comment.id).unwrap().unwrap();
        assert!(stored.approved);
    }

    #[test]
    fn invalid_comment_persists_nothing() {
        let s = test_fixtures::scenario();
        let res = submit_comment(&s.pool, s.p1, &fields(&[("name", "Ann")]));
        match res {
            Err(BlogError::Validation(errors)) => assert!(errors.get("text").is_some()),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(count(&s.pool, "comments"), 0);
    }

    #[test]
    fn comment_on_missing_post_is_not_found() {
        let s = test_fixtures::scenario();
        assert!(matches!(submit_comment(&s.pool, 999, &fields(&[("text", "hi")])), Err(BlogError::NotFound)));
        assert!(matches!(submit_comment(&s.pool, 999, &fields(&[])), Err(BlogError::NotFound)));
        assert_eq!(count(&s.pool, "comments"), 0);
    }

    #[test]
    fn reply_attaches_to_comment_and_reports_post() {
        let s = test_fixtures::scenario();
        let comment = submit_comment(&s.pool, s.p1, &fields(&[("text", "hi")])).unwrap();
        let submitted = submit_reply(&s.pool, comment.id, &fields(&[("name", "Ben"), ("text", "hey")])).unwrap();

        assert_eq!(submitted.post_id, s.p1);
        assert_eq!(submitted.reply.comment_id, comment.id);
        assert_eq!(submitted.reply.name, "Ben");
        assert!(!submitted.reply.approved);
    }

    #[test]
    fn reply_failures() {
        let s = test_fixtures::scenario();
        assert!(matches!(submit_reply(&s.pool, 31337, &fields(&[("text", "hey")])), Err(BlogError::NotFound)));

        let comment = submit_comment(&s.pool, s.p1, &fields(&[("text", "hi")])).unwrap();
        let res = submit_reply(&s.pool, comment.id, &fields(&[("text", "")]));
        assert!(matches!(res, Err(BlogError::Validation(_))));
        assert_eq!(count(&s.pool, "replies"), 0);
    }
}
