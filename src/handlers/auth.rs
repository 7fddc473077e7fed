use axum::{
    extract::{Form, Query, State},
    response::{Html, Redirect},
};
use model::entities::user;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{debug, info, instrument, trace, warn};

use crate::auth::{LOGIN_PATH, USER_ID_KEY, login_redirect, safe_next, verify_password};
use crate::error::AppResult;
use crate::flash;
use crate::schemas::AppState;
use crate::views;

/// Where a fresh login lands when no usable `next` was given.
pub const DEFAULT_LANDING: &str = "/projects/";

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

pub async fn home() -> Redirect {
    Redirect::to(DEFAULT_LANDING)
}

#[instrument(skip(session))]
pub async fn login_page(session: Session, Query(query): Query<LoginQuery>) -> AppResult<Html<String>> {
    trace!("Entering login_page function");
    let messages = flash::take(&session).await?;
    let next = safe_next(query.next.as_deref());
    Ok(Html(views::login_page(&messages, next)))
}

#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Redirect> {
    trace!("Entering login function");
    let next = safe_next(form.next.as_deref()).map(str::to_string);

    let user = user::Entity::find()
        .filter(user::Column::Username.eq(form.username.trim()))
        .one(&state.db)
        .await?;

    let user = match user {
        Some(user) if verify_password(&form.password, &user.password_hash) => user,
        _ => {
            warn!("Failed login attempt for '{}'", form.username);
            flash::error(&session, "Invalid username or password.").await?;
            let back = match next {
                Some(next) => login_redirect(&next),
                None => LOGIN_PATH.to_string(),
            };
            return Ok(Redirect::to(&back));
        }
    };

    session.cycle_id().await?;
    session.insert(USER_ID_KEY, user.id).await?;
    info!("User {} logged in", user.username);

    let target = next.unwrap_or_else(|| DEFAULT_LANDING.to_string());
    debug!("Redirecting {} to {}", user.username, target);
    Ok(Redirect::to(&target))
}

#[instrument(skip(session))]
pub async fn logout(session: Session) -> AppResult<Redirect> {
    trace!("Entering logout function");
    session.flush().await?;
    info!("Session flushed");
    Ok(Redirect::to(LOGIN_PATH))
}
