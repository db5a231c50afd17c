use crate::config::Config;
use crate::helper::form_helpers::parse_form;
use crate::helper::{moderation_helpers, submission_helpers};
use crate::middleware::Requester;
use crate::error::BlogError;
use crate::models::Feedback;
use crate::routes::{error_response, login_redirect, post_detail_path, redirect};
use crate::DbPool;
use actix_web::{web, HttpRequest, HttpResponse, Responder};

pub fn config_feedback(cfg: &mut web::ServiceConfig) {
    cfg.route("/posts/{id}/comments/", web::post().to(submit_comment_action))
        .route("/comments/{id}/replies/", web::post().to(submit_reply_action))
        .route("/comments/{id}/approve/", web::post().to(approve_comment_action))
        .route("/comments/{id}/remove/", web::post().to(remove_comment_action))
        .route("/replies/{id}/approve/", web::post().to(approve_reply_action))
        .route("/replies/{id}/remove/", web::post().to(remove_reply_action));
}

async fn submit_comment_action(
    post_id: web::Path<i64>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    form: web::Bytes,
) -> impl Responder {
    let fields = match parse_form(&form) {
        Ok(f) => f,
        Err(response) => return response,
    };

    let post_id = post_id.into_inner();
    match submission_helpers::submit_comment(&pool, post_id, &fields) {
        Ok(_) => redirect(&post_detail_path(post_id)),
        Err(e) => error_response(e, &config),
    }
}

async fn submit_reply_action(
    comment_id: web::Path<i64>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    form: web::Bytes,
) -> impl Responder {
    let fields = match parse_form(&form) {
        Ok(f) => f,
        Err(response) => return response,
    };

    match submission_helpers::submit_reply(&pool, comment_id.into_inner(), &fields) {
        Ok(submitted) => redirect(&post_detail_path(submitted.post_id)),
        Err(e) => error_response(e, &config),
    }
}

enum Action {
    Approve,
    Remove,
}

fn moderate(
    action: Action,
    target: Feedback,
    req: &HttpRequest,
    requester: &Requester,
    pool: &DbPool,
    config: &Config,
) -> HttpResponse {
    let outcome = match action {
        Action::Approve => moderation_helpers::approve(pool, requester, target),
        Action::Remove => moderation_helpers::remove(pool, requester, target),
    };
    match outcome {
        Ok(post_id) => redirect(&post_detail_path(post_id)),
        Err(BlogError::Unauthorized) => login_redirect(config, req.path()),
        Err(e) => error_response(e, config),
    }
}

async fn approve_comment_action(
    id: web::Path<i64>,
    req: HttpRequest,
    requester: Requester,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> impl Responder {
    moderate(Action::Approve, Feedback::Comment(id.into_inner()), &req, &requester, &pool, &config)
}

async fn remove_comment_action(
    id: web::Path<i64>,
    req: HttpRequest,
    requester: Requester,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> impl Responder {
    moderate(Action::Remove, Feedback::Comment(id.into_inner()), &req, &requester, &pool, &config)
}

async fn approve_reply_action(
    id: web::Path<i64>,
    req: HttpRequest,
    requester: Requester,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> impl Responder {
    moderate(Action::Approve, Feedback::Reply(id.into_inner()), &req, &requester, &pool, &config)
}

async fn remove_reply_action(
    id: web::Path<i64>,
    req: HttpRequest,
    requester: Requester,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> impl Responder {
    moderate(Action::Remove, Feedback::Reply(id.into_inner()), &req, &requester, &pool, &config)
}
