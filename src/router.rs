use crate::auth::require_auth;
use crate::handlers::{
    auth::{home, login, login_page, logout},
    dashboard::dashboard,
    health::health_check,
    projects::{create_project, list_projects},
    tasks::{create_task, get_task, list_tasks, task_form_redirect},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tower_sessions::{cookie::SameSite, MemoryStore, SessionManagerLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub const SESSION_COOKIE_NAME: &str = "tasktracker_session";

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_same_site(SameSite::Lax)
        .with_secure(state.settings.session_secure);

    // Everything here needs a logged-in user
    let protected = Router::new()
        .route("/projects/", get(list_projects).post(create_project))
        .route(
            "/projects/:project_id/tasks/",
            get(task_form_redirect).post(create_task),
        )
        .route("/tasks/", get(list_tasks))
        .route("/tasks/:task_id/", get(get_task))
        .route("/dashboard/", get(dashboard))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
        .merge(protected)
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(session_layer)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
