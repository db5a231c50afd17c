use crate::models::{Category, CategoryWithCount, ContentImage, Post, Tag, TagWithCount};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result as RusqliteResult, Row};

// Column order is relied upon by `map_post`.
const POST_SELECT: &str = "SELECT p.id, p.title, p.content, p.is_public, p.created_at, p.updated_at, \
     c.id, c.name, c.slug \
     FROM posts p LEFT JOIN categories c ON c.id = p.category_id";

const POST_COUNT: &str = "SELECT COUNT(*) FROM posts p LEFT JOIN categories c ON c.id = p.category_id";

/// Narrows a post listing. A filter binds at most `?1`; paging parameters
/// are appended after it as plain `?` placeholders.
#[derive(Debug, Clone, Copy)]
pub enum PostFilter<'a> {
    All,
    Category(i64),
    Tag(i64),
    /// Case-insensitive substring match over title, content, category name
    /// and tag name. The needle is taken literally.
    Search(&'a str),
}

impl PostFilter<'_> {
    fn where_clause(&self) -> &'static str {
        match self {
            PostFilter::All => "",
            PostFilter::Category(_) => "WHERE p.category_id = ?1",
            PostFilter::Tag(_) => {
                "WHERE p.id IN (SELECT pt.post_id FROM post_tags pt WHERE pt.tag_id = ?1)"
            }
            // The tag branch goes through a subquery so a post carrying two
            // matching tags still comes back once.
            PostFilter::Search(_) => {
                "WHERE p.title LIKE ?1 ESCAPE '\\' \
                 OR p.content LIKE ?1 ESCAPE '\\' \
                 OR c.name LIKE ?1 ESCAPE '\\' \
                 OR p.id IN (SELECT pt.post_id FROM post_tags pt JOIN tags t ON t.id = pt.tag_id \
                             WHERE t.name LIKE ?1 ESCAPE '\\')"
            }
        }
    }

    fn params(&self) -> Vec<Value> {
        match self {
            PostFilter::All => vec![],
            PostFilter::Category(id) | PostFilter::Tag(id) => vec![Value::Integer(*id)],
            PostFilter::Search(needle) => vec![Value::Text(like_pattern(needle))],
        }
    }
}

/// `LIMIT`/`OFFSET` pair for a paginated read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: u32,
    pub offset: u32,
}

pub struct NewPost<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub is_public: bool,
    pub category_id: Option<i64>,
    pub tag_ids: &'a [i64],
}

fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn map_post(row: &Row) -> RusqliteResult<Post> {
    let category = match row.get::<_, Option<i64>>(6)? {
        Some(id) => Some(Category {
            id,
            name: row.get(7)?,
            slug: row.get(8)?,
        }),
        None => None,
    };

    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        is_public: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        category,
        tags: Vec::new(),
    })
}

fn map_category(row: &Row) -> RusqliteResult<Category> {
    Ok(Category { id: row.get(0)?, name: row.get(1)?, slug: row.get(2)? })
}

fn map_tag(row: &Row) -> RusqliteResult<Tag> {
    Ok(Tag { id: row.get(0)?, name: row.get(1)?, slug: row.get(2)? })
}

fn attach_tags(conn: &Connection, posts: &mut [Post]) -> RusqliteResult<()> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.slug FROM tags t \
         JOIN post_tags pt ON pt.tag_id = t.id \
         WHERE pt.post_id = ?1 ORDER BY t.id",
    )?;
    for post in posts.iter_mut() {
        post.tags = stmt
            .query_map([post.id], map_tag)?
            .collect::<RusqliteResult<Vec<_>>>()?;
    }
    Ok(())
}

// ====================================================================
// ========================= POST READS ===============================
// ====================================================================

pub fn read_post(conn: &Connection, id: i64) -> RusqliteResult<Option<Post>> {
    let sql = format!("{} WHERE p.id = ?1", POST_SELECT);
    match conn.query_row(&sql, [id], map_post).optional()? {
        Some(mut post) => {
            attach_tags(conn, std::slice::from_mut(&mut post))?;
            Ok(Some(post))
        }
        None => Ok(None),
    }
}

pub fn post_exists(conn: &Connection, id: i64) -> RusqliteResult<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )
}

pub fn count_posts(conn: &Connection, filter: PostFilter) -> RusqliteResult<u32> {
    let sql = format!("{} {}", POST_COUNT, filter.where_clause());
    conn.query_row(&sql, params_from_iter(filter.params()), |row| row.get(0))
}

/// Newest first. A `None` window returns every matching post.
pub fn read_posts(
    conn: &Connection,
    filter: PostFilter,
    window: Option<Window>,
) -> RusqliteResult<Vec<Post>> {
    let (limit, offset) = window.map_or((-1, 0), |w| (i64::from(w.limit), i64::from(w.offset)));
    let sql = format!(
        "{} {} ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?",
        POST_SELECT,
        filter.where_clause()
    );

    let mut values = filter.params();
    values.push(Value::Integer(limit));
    values.push(Value::Integer(offset));

    let mut stmt = conn.prepare(&sql)?;
    let mut posts = stmt
        .query_map(params_from_iter(values), map_post)?
        .collect::<RusqliteResult<Vec<_>>>()?;
    attach_tags(conn, &mut posts)?;
    Ok(posts)
}

pub fn read_images_for_post(conn: &Connection, post_id: i64) -> RusqliteResult<Vec<ContentImage>> {
    let mut stmt = conn.prepare(
        "SELECT id, post_id, file_path, created_at FROM content_images WHERE post_id = ?1 ORDER BY id",
    )?;
    let images = stmt
        .query_map([post_id], |row| {
            let file_path: String = row.get(2)?;
            Ok(ContentImage {
                id: row.get(0)?,
                post_id: row.get(1)?,
                url: format!("/media/{}", file_path),
                file_path,
                created_at: row.get(3)?,
            })
        })?
        .collect::<RusqliteResult<Vec<_>>>()?;
    Ok(images)
}

// ====================================================================
// ===================== CATEGORIES AND TAGS ==========================
// ====================================================================

pub fn read_category_by_slug(conn: &Connection, slug: &str) -> RusqliteResult<Option<Category>> {
    conn.query_row(
        "SELECT id, name, slug FROM categories WHERE slug = ?1",
        [slug],
        map_category,
    )
    .optional()
}

pub fn read_tag_by_slug(conn: &Connection, slug: &str) -> RusqliteResult<Option<Tag>> {
    conn.query_row("SELECT id, name, slug FROM tags WHERE slug = ?1", [slug], map_tag)
        .optional()
}

/// The visibility condition sits in the join, so categories with no public
/// posts still show up with a zero count.
pub fn read_categories_with_counts(conn: &Connection) -> RusqliteResult<Vec<CategoryWithCount>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.slug, COUNT(p.id) FROM categories c \
         LEFT JOIN posts p ON p.category_id = c.id AND p.is_public = 1 \
         GROUP BY c.id ORDER BY c.id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(CategoryWithCount { category: map_category(row)?, num_posts: row.get(3)? })
        })?
        .collect::<RusqliteResult<Vec<_>>>()?;
    Ok(rows)
}

pub fn read_tags_with_counts(conn: &Connection) -> RusqliteResult<Vec<TagWithCount>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.slug, COUNT(p.id) FROM tags t \
         LEFT JOIN post_tags pt ON pt.tag_id = t.id \
         LEFT JOIN posts p ON p.id = pt.post_id AND p.is_public = 1 \
         GROUP BY t.id ORDER BY t.id",
    )?;
    let rows = stmt
        .query_map([], |row| Ok(TagWithCount { tag: map_tag(row)?, num_posts: row.get(3)? }))?
        .collect::<RusqliteResult<Vec<_>>>()?;
    Ok(rows)
}

pub fn create_category(conn: &Connection, name: &str, slug: &str) -> RusqliteResult<i64> {
    conn.execute(
        "INSERT INTO categories (name, slug) VALUES (?1, ?2)",
        params![name, slug],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn create_tag(conn: &Connection, name: &str, slug: &str) -> RusqliteResult<i64> {
    conn.execute("INSERT INTO tags (name, slug) VALUES (?1, ?2)", params![name, slug])?;
    Ok(conn.last_insert_rowid())
}

// ====================================================================
// ======================== POST WRITES ===============================
// ====================================================================

pub fn create_post(conn: &mut Connection, new_post: &NewPost) -> RusqliteResult<i64> {
    let now = Utc::now();
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO posts (title, content, is_public, category_id, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![new_post.title, new_post.content, new_post.is_public, new_post.category_id, now],
    )?;
    let post_id = tx.last_insert_rowid();

    for tag_id in new_post.tag_ids {
        tx.execute(
            "INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?1, ?2)",
            params![post_id, tag_id],
        )?;
    }
    tx.commit()?;
    Ok(post_id)
}

pub fn set_post_visibility(conn: &Connection, post_id: i64, is_public: bool) -> RusqliteResult<usize> {
    conn.execute(
        "UPDATE posts SET is_public = ?1, updated_at = ?2 WHERE id = ?3",
        params![is_public, Utc::now(), post_id],
    )
}

/// Tags, images, comments and replies go with the post through the foreign
/// key cascades.
pub fn delete_post(conn: &Connection, post_id: i64) -> RusqliteResult<usize> {
    conn.execute("DELETE FROM posts WHERE id = ?1", [post_id])
}

pub fn add_content_image(conn: &Connection, post_id: i64, file_path: &str) -> RusqliteResult<i64> {
    conn.execute(
        "INSERT INTO content_images (post_id, file_path, created_at) VALUES (?1, ?2, ?3)",
        params![post_id, file_path, Utc::now()],
    )?;
    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::test_fixtures;

    fn count(conn: &Connection, sql: &str, post_id: i64) -> i64 {
        conn.query_row(sql, [post_id], |row| row.get(0)).unwrap()
    }

    #[test]
    fn deleting_a_post_takes_its_children_along() {
        let s = test_fixtures::scenario();
        let (approved, _) = test_fixtures::comments_on_p1(&s);
        let conn = s.pool.get().unwrap();
        add_content_image(&conn, s.p1, "posts/1/a.png").unwrap();

        assert_eq!(delete_post(&conn, s.p1).unwrap(), 1);
        assert!(read_post(&conn, s.p1).unwrap().is_none());
        assert!(read_images_for_post(&conn, s.p1).unwrap().is_empty());
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM comments WHERE post_id = ?1", s.p1), 0);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM replies WHERE comment_id = ?1", approved), 0);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM post_tags WHERE post_id = ?1", s.p1), 0);

        // The other post and the shared taxonomy are untouched.
        assert!(post_exists(&conn, s.p2).unwrap());
        assert_eq!(read_tag_by_slug(&conn, "ai").unwrap().map(|t| t.id), Some(s.ai));
        assert_eq!(delete_post(&conn, s.p1).unwrap(), 0);
    }

    #[test]
    fn images_are_listed_in_attach_order() {
        let s = test_fixtures::scenario();
        let conn = s.pool.get().unwrap();
        let first = add_content_image(&conn, s.p1, "posts/1/a.png").unwrap();
        let second = add_content_image(&conn, s.p1, "posts/1/b.jpg").unwrap();

        let images = read_images_for_post(&conn, s.p1).unwrap();
        assert_eq!(images.iter().map(|i| i.id).collect::<Vec<_>>(), vec![first, second]);
        assert_eq!(images[1].url, "/media/posts/1/b.jpg");
        assert!(read_images_for_post(&conn, s.p2).unwrap().is_empty());
    }
}
