use crate::config::Config;
use crate::error::BlogError;
use actix_web::{web, HttpResponse};
use serde_json::json;
use url::form_urlencoded;

pub mod auth;
pub mod feedback;
pub mod public;

/// Registers every endpoint. Comment and moderation routes only exist while
/// `features.comments_enabled` is on.
pub fn config_routes(cfg: &mut web::ServiceConfig, config: &Config) {
    cfg.configure(public::config_public);
    if config.features.comments_enabled {
        cfg.configure(feedback::config_feedback);
    }
    cfg.service(
        web::scope(&format!("/management/{}", config.admin_url_prefix)).configure(auth::config_auth),
    );
}

pub fn post_detail_path(post_id: i64) -> String {
    format!("/posts/{}", post_id)
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found().append_header(("location", location)).finish()
}

/// Sends an anonymous requester to the login page, remembering where they
/// were headed.
pub fn login_redirect(config: &Config, next: &str) -> HttpResponse {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    redirect(&format!("{}?{}", config.login_path(), query))
}

pub fn error_response(err: BlogError, config: &Config) -> HttpResponse {
    match err {
        BlogError::NotFound => HttpResponse::NotFound().body("Not found"),
        BlogError::Validation(errors) => HttpResponse::BadRequest().json(json!({ "errors": errors })),
        BlogError::Unauthorized => redirect(&config.login_path()),
        other => {
            log::error!("Request failed: {}", other);
            HttpResponse::InternalServerError().finish()
        }
    }
}
