use crate::middleware::Requester;
use crate::models::db_operations::posts_db_operations::{self, NewPost};
use crate::models::db_operations::comments_db_operations;
use crate::models::Feedback;
use crate::setup::db_setup::setup_memory_pool;
use crate::DbPool;

/// P1 is public, P2 private; both sit in "Tech" and carry "AI". "Life" has
/// no posts at all.
pub struct Scenario {
    pub pool: DbPool,
    pub tech: i64,
    pub ai: i64,
    pub p1: i64,
    pub p2: i64,
}

pub fn moderator() -> Requester {
    Requester::moderator("mod", "moderator")
}

pub fn scenario() -> Scenario {
    let pool = setup_memory_pool().unwrap();
    let mut conn = pool.get().unwrap();

    let tech = posts_db_operations::create_category(&conn, "Tech", "tech").unwrap();
    posts_db_operations::create_category(&conn, "Life", "life").unwrap();
    let ai = posts_db_operations::create_tag(&conn, "AI", "ai").unwrap();

    let p1 = posts_db_operations::create_post(
        &mut conn,
        &NewPost { title: "Hello AI", content: "First public post", is_public: true, category_id: Some(tech), tag_ids: &[ai] },
    )
    .unwrap();
    let p2 = posts_db_operations::create_post(
        &mut conn,
        &NewPost { title: "Private draft", content: "secret plans", is_public: false, category_id: Some(tech), tag_ids: &[ai] },
    )
    .unwrap();
    drop(conn);

    Scenario { pool, tech, ai, p1, p2 }
}

/// Adds an approved comment (one approved and one pending reply) and a
/// pending comment to P1. Returns `(approved_id, pending_id)`.
pub fn comments_on_p1(s: &Scenario) -> (i64, i64) {
    let conn = s.pool.get().unwrap();
    let approved = comments_db_operations::insert_comment(&conn, s.p1, "Ann", "nice").unwrap();
    comments_db_operations::mark_approved(&conn, Feedback::Comment(approved.id)).unwrap();

    let reply = comments_db_operations::insert_reply(&conn, approved.id, "Ben", "agreed").unwrap();
    comments_db_operations::mark_approved(&conn, Feedback::Reply(reply.id)).unwrap();
    comments_db_operations::insert_reply(&conn, approved.id, "Cy", "spam").unwrap();

    let pending = comments_db_operations::insert_comment(&conn, s.p1, "Dee", "waiting").unwrap();
    (approved.id, pending.id)
}
