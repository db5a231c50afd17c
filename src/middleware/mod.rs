use crate::models::db_operations::users_db_operations;
use crate::DbPool;
use actix_session::{Session, SessionExt};
use actix_web::{dev, web, FromRequest, HttpRequest};
use serde::Serialize;
use std::future::{ready, Ready};

pub const SESSION_USERNAME_KEY: &str = "username";
pub const SESSION_ROLE_KEY: &str = "role";

/// The request-scoped auth context handed to every retrieval and moderation
/// operation. Anonymous unless the session carries a logged-in moderator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Requester {
    pub username: Option<String>,
    pub role: Option<String>,
}

impl Requester {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn moderator(username: &str, role: &str) -> Self {
        Requester {
            username: Some(username.to_string()),
            role: Some(role.to_string()),
        }
    }

    pub fn from_session(session: &Session) -> Self {
        match (
            session.get::<String>(SESSION_USERNAME_KEY),
            session.get::<String>(SESSION_ROLE_KEY),
        ) {
            (Ok(Some(username)), Ok(Some(role))) => Requester::moderator(&username, &role),
            _ => Requester::anonymous(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some() && self.role.is_some()
    }

    /// Re-reads the session's account. Anything but an existing, active user
    /// comes back anonymous; the role is taken from the database.
    pub fn confirm_account(self, pool: &DbPool) -> Self {
        let username = match &self.username {
            Some(u) => u.clone(),
            None => return self,
        };
        let conn = match pool.get() {
            Ok(c) => c,
            Err(e) => {
                log::error!("Database pool error while checking session of '{}': {}", username, e);
                return Requester::anonymous();
            }
        };
        match users_db_operations::read_user_by_username(&conn, &username) {
            Ok(Some(user)) if user.is_active => Requester::moderator(&user.username, &user.role),
            Ok(Some(_)) => {
                log::warn!("Session of suspended account '{}' rejected", username);
                Requester::anonymous()
            }
            Ok(None) => {
                log::warn!("Session names unknown account '{}'", username);
                Requester::anonymous()
            }
            Err(e) => {
                log::error!("Could not load account '{}': {}", username, e);
                Requester::anonymous()
            }
        }
    }
}

// Never fails: a missing, unreadable or revoked session just means anonymous.
impl FromRequest for Requester {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let session = req.get_session();
        let claimed = Requester::from_session(&session);
        if !claimed.is_authenticated() {
            return ready(Ok(claimed));
        }

        let confirmed = match req.app_data::<web::Data<DbPool>>() {
            Some(pool) => claimed.confirm_account(pool),
            None => Requester::anonymous(),
        };
        if !confirmed.is_authenticated() {
            session.purge();
        }
        ready(Ok(confirmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_is_not_authenticated() {
        assert!(!Requester::anonymous().is_authenticated());
        assert!(Requester::moderator("mod", "moderator").is_authenticated());
    }

    #[test]
    fn only_active_accounts_survive_confirmation() {
        let pool = crate::setup::db_setup::setup_memory_pool().unwrap();
        {
            let conn = pool.get().unwrap();
            users_db_operations::create_user(&conn, "mod", "pw", "admin").unwrap();
        }

        // The role comes from the account, not from the cookie.
        let confirmed = Requester::moderator("mod", "moderator").confirm_account(&pool);
        assert_eq!(confirmed, Requester::moderator("mod", "admin"));

        let ghost = Requester::moderator("ghost", "moderator").confirm_account(&pool);
        assert!(!ghost.is_authenticated());

        users_db_operations::set_user_active(&pool.get().unwrap(), "mod", false).unwrap();
        let suspended = Requester::moderator("mod", "admin").confirm_account(&pool);
        assert_eq!(suspended, Requester::anonymous());

        assert_eq!(Requester::anonymous().confirm_account(&pool), Requester::anonymous());
    }

    #[actix_web::test]
    async fn request_without_session_is_anonymous() {
        let req = actix_web::test::TestRequest::default().to_http_request();
        let requester = Requester::extract(&req).await.unwrap();
        assert_eq!(requester, Requester::anonymous());
    }
}
