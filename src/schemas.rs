use crate::config::Settings;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Settings the server was started with
    pub settings: Settings,
}

/// Error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::tasks::list_tasks,
        crate::handlers::tasks::get_task,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            crate::handlers::tasks::TaskSummary,
            crate::handlers::tasks::TaskDetail,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "tasks", description = "Task listing endpoints"),
    ),
    info(
        title = "Task Tracker API",
        description = "JSON endpoints of the multi-user project and task tracker",
        version = "0.1.0",
    )
)]
pub struct ApiDoc;
