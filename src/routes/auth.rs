use crate::middleware::{SESSION_ROLE_KEY, SESSION_USERNAME_KEY};
use crate::models::db_operations::users_db_operations;
use crate::routes::redirect;
use crate::DbPool;
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
    #[serde(default)]
    next: Option<String>,
}

const AFTER_LOGIN: &str = "/posts/";

/// Only same-site absolute paths are followed after login.
fn local_path(next: Option<&str>) -> Option<&str> {
    next.filter(|p| p.starts_with('/') && !p.starts_with("//") && !p.contains('\\'))
}

pub fn config_auth(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::post().to(handle_login))
        .route("/logout", web::post().to(handle_logout));
}

async fn handle_login(
    session: Session,
    pool: web::Data<DbPool>,
    form: web::Form<LoginForm>,
) -> impl Responder {
    let login_data = form.into_inner();
    let conn = match pool.get() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Database pool error on login: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let Some((username, role)) =
        users_db_operations::verify_credentials(&conn, &login_data.username, &login_data.password)
    else {
        log::warn!("Failed login attempt for '{}'", login_data.username);
        return HttpResponse::Unauthorized()
            .json(json!({"success": false, "error": "Invalid credentials or account suspended."}));
    };

    // Fresh session id on privilege change.
    session.renew();
    let stored = session
        .insert(SESSION_USERNAME_KEY, &username)
        .and_then(|_| session.insert(SESSION_ROLE_KEY, &role));
    if let Err(e) = stored {
        log::error!("Could not write session for '{}': {}", username, e);
        return HttpResponse::InternalServerError().finish();
    }

    if let Err(e) = users_db_operations::update_last_login_time(&conn, &username) {
        log::warn!("Could not record login time for '{}': {}", username, e);
    }
    log::info!("Moderator '{}' logged in", username);
    redirect(local_path(login_data.next.as_deref()).unwrap_or(AFTER_LOGIN))
}

async fn handle_logout(session: Session) -> impl Responder {
    session.purge();
    redirect(AFTER_LOGIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_stay_on_this_site() {
        assert_eq!(local_path(Some("/comments/3/approve/")), Some("/comments/3/approve/"));
        assert_eq!(local_path(Some("//evil.example/")), None);
        assert_eq!(local_path(Some("/\\evil.example/")), None);
        assert_eq!(local_path(Some("https://evil.example/")), None);
        assert_eq!(local_path(None), None);
    }
}
