//! Session-based authentication.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use model::entities::user;
use sea_orm::EntityTrait;
use tower_sessions::Session;
use tracing::{debug, warn};

use crate::schemas::AppState;

/// Session key holding the id of the logged-in user.
pub const USER_ID_KEY: &str = "user_id";

pub const LOGIN_PATH: &str = "/login";

/// The authenticated user, available to protected handlers as an `Extension`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
}

impl From<user::Model> for CurrentUser {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Route layer for pages that need a logged-in user.
///
/// Anonymous requests (and sessions pointing at a deleted user) are sent to
/// the login page with the original path in `next`.
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut req: Request,
    next: Next,
) -> Response {
    let user_id = match session.get::<i32>(USER_ID_KEY).await {
        Ok(user_id) => user_id,
        Err(err) => {
            warn!("Failed to read session: {}", err);
            None
        }
    };

    let user = match user_id {
        Some(id) => match user::Entity::find_by_id(id).one(&state.db).await {
            Ok(user) => user,
            Err(err) => {
                warn!("Failed to load user {} for session: {}", id, err);
                None
            }
        },
        None => None,
    };

    match user {
        Some(user) => {
            req.extensions_mut().insert(CurrentUser::from(user));
            next.run(req).await
        }
        None => {
            let target = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            debug!("Anonymous request to {}, redirecting to login", target);
            Redirect::to(&login_redirect(target)).into_response()
        }
    }
}

pub fn login_redirect(next: &str) -> String {
    format!("{}?next={}", LOGIN_PATH, urlencoding::encode(next))
}

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
}

/// Checks a password against a stored hash; malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Accepts only same-site absolute paths as a post-login target.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|target| {
        target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
    })
}
