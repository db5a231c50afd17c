use crate::config::ListingConfig;
use crate::error::BlogError;
use crate::middleware::Requester;
use crate::models::db_operations::posts_db_operations::{PostFilter, Window};
use crate::models::db_operations::{comments_db_operations, posts_db_operations};
use crate::models::{CategoryPosts, CategoryWithCount, Page, Post, PostDetail, TagPosts, TagWithCount};
use crate::DbPool;
use rusqlite::Connection;

fn read_page(
    conn: &Connection,
    filter: PostFilter,
    paginate: bool,
    page_size: u32,
    page: u32,
) -> Result<Page<Post>, BlogError> {
    if !paginate {
        let items = posts_db_operations::read_posts(conn, filter, None)?;
        let total = items.len() as u32;
        return Ok(Page { items, number: 1, num_pages: 1, total, has_next: false, has_previous: false });
    }

    // An empty listing still has a first page.
    let total = posts_db_operations::count_posts(conn, filter)?;
    let num_pages = total.div_ceil(page_size).max(1);
    if page == 0 || page > num_pages {
        return Err(BlogError::NotFound);
    }

    let window = Window { limit: page_size, offset: (page - 1) * page_size };
    let items = posts_db_operations::read_posts(conn, filter, Some(window))?;
    Ok(Page {
        items,
        number: page,
        num_pages,
        total,
        has_next: page < num_pages,
        has_previous: page > 1,
    })
}

/// Fails with `NotFound` both for a missing post and for a private post
/// requested anonymously.
pub fn get_post(pool: &DbPool, id: i64, requester: &Requester) -> Result<PostDetail, BlogError> {
    let conn = pool.get()?;
    let post = posts_db_operations::read_post(&conn, id)?.ok_or(BlogError::NotFound)?;
    if !post.is_public && !requester.is_authenticated() {
        return Err(BlogError::NotFound);
    }

    let images = posts_db_operations::read_images_for_post(&conn, id)?;
    // Moderators need to see what is waiting for them.
    let comments = comments_db_operations::read_threads_for_post(&conn, id, requester.is_authenticated())?;
    Ok(PostDetail { post, images, comments })
}

/// Newest first. Private posts are listed too; only their detail is gated.
pub fn list_posts(pool: &DbPool, listing: &ListingConfig, page: u32) -> Result<Page<Post>, BlogError> {
    let conn = pool.get()?;
    read_page(&conn, PostFilter::All, listing.paginate_index, listing.page_size, page)
}

pub fn list_categories_with_counts(pool: &DbPool) -> Result<Vec<CategoryWithCount>, BlogError> {
    let conn = pool.get()?;
    Ok(posts_db_operations::read_categories_with_counts(&conn)?)
}

pub fn list_tags_with_counts(pool: &DbPool) -> Result<Vec<TagWithCount>, BlogError> {
    let conn = pool.get()?;
    Ok(posts_db_operations::read_tags_with_counts(&conn)?)
}

pub fn list_posts_by_category(pool: &DbPool, slug: &str) -> Result<CategoryPosts, BlogError> {
    let conn = pool.get()?;
    let category = posts_db_operations::read_category_by_slug(&conn, slug)?.ok_or(BlogError::NotFound)?;
    let posts = posts_db_operations::read_posts(&conn, PostFilter::Category(category.id), None)?;
    Ok(CategoryPosts { category, posts })
}

pub fn list_posts_by_tag(pool: &DbPool, slug: &str) -> Result<TagPosts, BlogError> {
    let conn = pool.get()?;
    let tag = posts_db_operations::read_tag_by_slug(&conn, slug)?.ok_or(BlogError::NotFound)?;
    let posts = posts_db_operations::read_posts(&conn, PostFilter::Tag(tag.id), None)?;
    Ok(TagPosts { tag, posts })
}

/// A blank or missing query gives exactly what `list_posts` gives for the
/// same page.
pub fn search_posts(
    pool: &DbPool,
    listing: &ListingConfig,
    query: Option<&str>,
    page: u32,
) -> Result<Page<Post>, BlogError> {
    match query.map(str::trim).filter(|q| !q.is_empty()) {
        None => list_posts(pool, listing, page),
        Some(needle) => {
            let conn = pool.get()?;
            read_page(&conn, PostFilter::Search(needle), listing.paginate_search, listing.page_size, page)
        }
    }
}
