use std::collections::HashMap;

use axum::{
    extract::{Extension, Form, Query, State},
    response::{Html, Redirect},
};
use model::access::{owned_project_tasks, owned_projects};
use model::entities::{project, task};
use model::validation::ValidationError;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{debug, error, info, instrument, trace, warn};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::flash;
use crate::schemas::AppState;
use crate::views;

pub const PROJECTS_PATH: &str = "/projects/";

#[derive(Debug, Deserialize)]
pub struct ProjectForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ProjectSearch {
    pub search: Option<String>,
}

/// A project form after trimming, ready to persist.
#[derive(Debug, Validate)]
pub struct NewProject {
    #[validate(length(max = 100, message = "Project name must be at most 100 characters."))]
    pub name: String,
    pub description: Option<String>,
}

impl NewProject {
    pub fn parse(form: ProjectForm) -> Result<Self, ValidationError> {
        let name = form.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::new("name", "Project name is required"));
        }
        let description = Some(form.description.trim().to_string()).filter(|d| !d.is_empty());

        let project = Self { name, description };
        if let Err(errors) = project.validate() {
            let message = errors
                .field_errors()
                .get("name")
                .and_then(|errs| errs.first())
                .and_then(|err| err.message.as_ref())
                .map(|message| message.to_string())
                .unwrap_or_else(|| format!("Project name must be at most {} characters.", project::NAME_MAX_LEN));
            return Err(ValidationError::new("name", message));
        }
        Ok(project)
    }
}

/// Flashes the outcome of a form submission and sends the browser back to the
/// project list. Errors without a user-facing message propagate.
pub(crate) async fn finish_form(session: &Session, outcome: AppResult<&str>) -> AppResult<Redirect> {
    match outcome {
        Ok(message) => flash::success(session, message).await?,
        Err(err) => match err.user_message() {
            Some(message) => {
                debug!("Form rejected: {}", message);
                flash::error(session, message).await?
            }
            None => return Err(err),
        },
    }
    Ok(Redirect::to(PROJECTS_PATH))
}

/// Escapes `%`, `_` and the escape character itself for a LIKE pattern.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[instrument(skip(state, session))]
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Query(query): Query<ProjectSearch>,
) -> AppResult<Html<String>> {
    trace!("Entering list_projects function");
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty());

    let mut select = owned_projects(user.id);
    if let Some(term) = search {
        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
        select = select.filter(
            Expr::expr(Func::lower(Expr::col((project::Entity, project::Column::Name))))
                .like(LikeExpr::new(pattern).escape('\\')),
        );
    }
    let projects = select
        .order_by_desc(project::Column::CreatedAt)
        .order_by_desc(project::Column::Id)
        .all(&state.db)
        .await?;
    debug!("Found {} projects for user {}", projects.len(), user.id);

    let mut tasks_by_project: HashMap<i32, Vec<task::Model>> = HashMap::new();
    for task in owned_project_tasks(user.id)
        .order_by_asc(task::Column::Id)
        .all(&state.db)
        .await?
    {
        tasks_by_project.entry(task.project_id).or_default().push(task);
    }

    let rows: Vec<(project::Model, Vec<task::Model>)> = projects
        .into_iter()
        .map(|project| {
            let tasks = tasks_by_project.remove(&project.id).unwrap_or_default();
            (project, tasks)
        })
        .collect();

    let messages = flash::take(&session).await?;
    Ok(Html(views::projects_page(&user, &messages, &rows, search)))
}

/// Persists a project for `owner_id`, enforcing per-owner name uniqueness.
pub async fn insert_project<C>(db: &C, owner_id: i32, new: NewProject) -> AppResult<project::Model>
where
    C: ConnectionTrait,
{
    let existing = owned_projects(owner_id)
        .filter(project::Column::Name.eq(new.name.as_str()))
        .count(db)
        .await?;
    if existing > 0 {
        return Err(AppError::Conflict(
            "You already have a project with this name.".to_string(),
        ));
    }

    let name = new.name.clone();
    let result = project::ActiveModel {
        name: Set(new.name),
        description: Set(new.description),
        owner_id: Set(owner_id),
        ..Default::default()
    }
    .insert(db)
    .await;

    match result {
        Ok(project) => Ok(project),
        Err(err) => Err(map_insert_error(err, owner_id, &name)),
    }
}

fn map_insert_error(err: DbErr, owner_id: i32, name: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            warn!(
                "Concurrent duplicate project '{}' for owner {}: {}",
                name, owner_id, detail
            );
            AppError::Conflict("Duplicate project name for this user.".to_string())
        }
        _ => {
            error!("Failed to create project '{}' for owner {}: {}", name, owner_id, err);
            AppError::Database(err)
        }
    }
}

async fn submit_project<C>(db: &C, owner_id: i32, form: ProjectForm) -> AppResult<project::Model>
where
    C: ConnectionTrait,
{
    let new = NewProject::parse(form)?;
    insert_project(db, owner_id, new).await
}

#[instrument(skip(state, session))]
pub async fn create_project(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Form(form): Form<ProjectForm>,
) -> AppResult<Redirect> {
    trace!("Entering create_project function");

    let outcome = submit_project(&state.db, user.id, form)
        .await
        .map(|project| {
            info!(
                "Project created successfully with ID: {}, name: {}",
                project.id, project.name
            );
            "Project created successfully!"
        });

    finish_form(&session, outcome).await
}
