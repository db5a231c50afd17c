use crate::config::Config;
use crate::helper::public_helpers;
use crate::middleware::Requester;
use crate::routes::error_response;
use crate::DbPool;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct PageQuery {
    page: Option<u32>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
    page: Option<u32>,
}

pub fn config_public(cfg: &mut web::ServiceConfig) {
    cfg.route("/posts/", web::get().to(list_posts))
        .route("/posts/{id}", web::get().to(post_detail))
        .route("/categories/", web::get().to(list_categories))
        .route("/categories/{slug}/", web::get().to(category_posts))
        .route("/tags/", web::get().to(list_tags))
        .route("/tags/{slug}/", web::get().to(tag_posts))
        .route("/search/", web::get().to(search_posts));
}

async fn list_posts(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let page = query.page.unwrap_or(1);
    match public_helpers::list_posts(&pool, &config.listing, page) {
        Ok(posts) => HttpResponse::Ok().json(posts),
        Err(e) => error_response(e, &config),
    }
}

async fn post_detail(
    id: web::Path<i64>,
    requester: Requester,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> impl Responder {
    match public_helpers::get_post(&pool, id.into_inner(), &requester) {
        Ok(detail) => HttpResponse::Ok().json(detail),
        Err(e) => error_response(e, &config),
    }
}

async fn list_categories(pool: web::Data<DbPool>, config: web::Data<Config>) -> impl Responder {
    match public_helpers::list_categories_with_counts(&pool) {
        Ok(categories) => HttpResponse::Ok().json(categories),
        Err(e) => error_response(e, &config),
    }
}

async fn category_posts(
    slug: web::Path<String>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> impl Responder {
    match public_helpers::list_posts_by_category(&pool, &slug) {
        Ok(listing) => HttpResponse::Ok().json(listing),
        Err(e) => error_response(e, &config),
    }
}

async fn list_tags(pool: web::Data<DbPool>, config: web::Data<Config>) -> impl Responder {
    match public_helpers::list_tags_with_counts(&pool) {
        Ok(tags) => HttpResponse::Ok().json(tags),
        Err(e) => error_response(e, &config),
    }
}

async fn tag_posts(
    slug: web::Path<String>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> impl Responder {
    match public_helpers::list_posts_by_tag(&pool, &slug) {
        Ok(listing) => HttpResponse::Ok().json(listing),
        Err(e) => error_response(e, &config),
    }
}

async fn search_posts(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    query: web::Query<SearchQuery>,
) -> impl Responder {
    let page = query.page.unwrap_or(1);
    match public_helpers::search_posts(&pool, &config.listing, query.q.as_deref(), page) {
        Ok(results) => HttpResponse::Ok().json(serde_json::json!({
            "query": query.q,
            "results": results,
        })),
        Err(e) => error_response(e, &config),
    }
}
