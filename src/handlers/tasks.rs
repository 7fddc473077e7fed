use axum::{
    extract::{Extension, Form, FromRequest, Path, Query, Request, State},
    response::{Json, Redirect},
};
use chrono::{DateTime, NaiveDate, Utc};
use model::access::{can_view_task, ensure_project_owner, visible_tasks};
use model::entities::{project, task, task::TaskStatus, user};
use model::validation::{TaskFields, ValidationError, validate_task};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{debug, info, instrument, trace};
use utoipa::{IntoParams, ToSchema};

use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::handlers::projects::{PROJECTS_PATH, finish_form};
use crate::schemas::{AppState, ErrorResponse};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw task form fields as posted by the browser.
#[derive(Debug, Default, Deserialize)]
pub struct TaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub assignee_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: i32,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<i32>,
}

impl TaskForm {
    /// Converts and checks every field; the assignee's existence is checked
    /// separately since it needs the database.
    pub fn parse(self, today: NaiveDate) -> Result<NewTask, ValidationError> {
        let priority = match self.priority.trim() {
            "" => return Err(ValidationError::new("priority", "Priority is required.")),
            raw => raw
                .parse::<i32>()
                .map_err(|_| ValidationError::new("priority", "Priority must be a whole number."))?,
        };

        let status = match self.status.trim() {
            "" => TaskStatus::default(),
            raw => raw
                .parse::<TaskStatus>()
                .map_err(|err| ValidationError::new("status", format!("{err}.")))?,
        };

        let due_date = match self.due_date.trim() {
            "" => None,
            raw => Some(
                NaiveDate::parse_from_str(raw, DATE_FORMAT)
                    .map_err(|_| ValidationError::new("due_date", "Enter a valid date."))?,
            ),
        };

        let assignee_id = match self.assignee_id.trim() {
            "" => None,
            raw => Some(
                raw.parse::<i32>()
                    .map_err(|_| ValidationError::new("assignee", "Select a valid assignee."))?,
            ),
        };

        let title = self.title.trim().to_string();
        let description = Some(self.description.trim().to_string()).filter(|d| !d.is_empty());

        validate_task(
            &TaskFields {
                title: &title,
                status,
                priority,
                due_date,
            },
            today,
        )?;

        Ok(NewTask {
            title,
            description,
            status,
            priority,
            due_date,
            assignee_id,
        })
    }
}

/// Loads a project the user owns: 404 when it does not exist, 403 when it
/// belongs to someone else.
pub async fn find_owned_project<C>(db: &C, user_id: i32, project_id: i32) -> AppResult<project::Model>
where
    C: ConnectionTrait,
{
    let project = project::Entity::find_by_id(project_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))?;
    ensure_project_owner(user_id, &project)?;
    Ok(project)
}

pub async fn insert_task<C>(db: &C, project: &project::Model, new: NewTask) -> AppResult<task::Model>
where
    C: ConnectionTrait,
{
    if let Some(assignee_id) = new.assignee_id {
        if user::Entity::find_by_id(assignee_id).one(db).await?.is_none() {
            return Err(ValidationError::new("assignee", "Select a valid assignee.").into());
        }
    }

    let task = task::ActiveModel {
        project_id: Set(project.id),
        title: Set(new.title),
        description: Set(new.description),
        status: Set(new.status),
        priority: Set(new.priority),
        due_date: Set(new.due_date),
        assignee_id: Set(new.assignee_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(task)
}

async fn submit_task<C>(db: &C, project: &project::Model, form: TaskForm) -> AppResult<task::Model>
where
    C: ConnectionTrait,
{
    let new = form.parse(Utc::now().date_naive())?;
    insert_task(db, project, new).await
}

/// Creates a task under a project owned by the requester.
#[instrument(skip(state, session, req))]
pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Path(project_id): Path<i32>,
    req: Request,
) -> AppResult<Redirect> {
    trace!("Entering create_task function");
    let project = find_owned_project(&state.db, user.id, project_id).await?;

    let Form(form) = Form::<TaskForm>::from_request(req, &state)
        .await
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    debug!("Creating task '{}' in project {}", form.title, project.id);

    let outcome = submit_task(&state.db, &project, form).await.map(|task| {
        info!(
            "Task created successfully with ID: {}, project: {}",
            task.id, task.project_id
        );
        "Task created successfully!"
    });

    finish_form(&session, outcome).await
}

/// GET on the task creation URL: nothing to render, back to the project list.
#[instrument(skip(state))]
pub async fn task_form_redirect(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(project_id): Path<i32>,
) -> AppResult<Redirect> {
    find_owned_project(&state.db, user.id, project_id).await?;
    Ok(Redirect::to(PROJECTS_PATH))
}

/// Query parameters of the task list. Empty values are ignored.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskListQuery {
    /// Exact status: `todo`, `in_progress` or `done`
    pub status: Option<String>,
    /// Exact project id
    pub project_id: Option<String>,
    /// Due on or before this date (`YYYY-MM-DD`)
    pub due_before: Option<String>,
}

/// Parsed task list filters.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TaskFilters {
    pub status: Option<StatusFilter>,
    pub project_id: Option<i32>,
    pub due_before: Option<NaiveDate>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum StatusFilter {
    Is(TaskStatus),
    /// A status value no task can have.
    Unknown,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl TaskListQuery {
    pub fn filters(&self) -> AppResult<TaskFilters> {
        let status = non_empty(&self.status).map(|raw| match raw.parse::<TaskStatus>() {
            Ok(status) => StatusFilter::Is(status),
            Err(_) => StatusFilter::Unknown,
        });

        let project_id = non_empty(&self.project_id)
            .map(|raw| {
                raw.parse::<i32>()
                    .map_err(|_| AppError::BadRequest(format!("Invalid project_id '{}'", raw)))
            })
            .transpose()?;

        let due_before = non_empty(&self.due_before)
            .map(|raw| {
                NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
                    AppError::BadRequest(format!("Invalid due_before '{}', expected YYYY-MM-DD", raw))
                })
            })
            .transpose()?;

        Ok(TaskFilters {
            status,
            project_id,
            due_before,
        })
    }
}

/// One row of the task list
#[derive(Debug, Serialize, ToSchema)]
pub struct TaskSummary {
    pub title: String,
    #[schema(value_type = String, example = "todo")]
    pub status: TaskStatus,
    /// 1 (highest) to 5 (lowest)
    pub priority: i32,
}

impl From<task::Model> for TaskSummary {
    fn from(model: task::Model) -> Self {
        Self {
            title: model.title,
            status: model.status,
            priority: model.priority,
        }
    }
}

/// Full task record
#[derive(Debug, Serialize, ToSchema)]
pub struct TaskDetail {
    pub id: i32,
    pub project_id: i32,
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "in_progress")]
    pub status: TaskStatus,
    pub priority: i32,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<task::Model> for TaskDetail {
    fn from(model: task::Model) -> Self {
        Self {
            id: model.id,
            project_id: model.project_id,
            title: model.title,
            description: model.description,
            status: model.status,
            priority: model.priority,
            due_date: model.due_date,
            assignee_id: model.assignee_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Tasks visible to `user_id`, narrowed by `filters`, ordered by id.
pub async fn filtered_tasks<C>(db: &C, user_id: i32, filters: &TaskFilters) -> AppResult<Vec<task::Model>>
where
    C: ConnectionTrait,
{
    let mut select = visible_tasks(user_id);
    match filters.status {
        Some(StatusFilter::Is(status)) => select = select.filter(task::Column::Status.eq(status)),
        Some(StatusFilter::Unknown) => return Ok(Vec::new()),
        None => {}
    }
    if let Some(project_id) = filters.project_id {
        select = select.filter(task::Column::ProjectId.eq(project_id));
    }
    if let Some(due_before) = filters.due_before {
        select = select.filter(task::Column::DueDate.lte(due_before));
    }
    Ok(select.order_by_asc(task::Column::Id).all(db).await?)
}

/// List tasks visible to the current user
#[utoipa::path(
    get,
    path = "/tasks/",
    tag = "tasks",
    params(TaskListQuery),
    responses(
        (status = 200, description = "Tasks the user owns or is assigned to", body = Vec<TaskSummary>),
        (status = 302, description = "Not logged in; redirect to the login page"),
        (status = 400, description = "Malformed filter value", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<TaskListQuery>,
) -> AppResult<Json<Vec<TaskSummary>>> {
    trace!("Entering list_tasks function");
    let filters = query.filters()?;
    let tasks = filtered_tasks(&state.db, user.id, &filters).await?;
    debug!("Returning {} tasks for user {}", tasks.len(), user.id);
    Ok(Json(tasks.into_iter().map(TaskSummary::from).collect()))
}

/// Get one task
#[utoipa::path(
    get,
    path = "/tasks/{task_id}/",
    tag = "tasks",
    params(
        ("task_id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task found", body = TaskDetail),
        (status = 403, description = "Task is not visible to the user", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(task_id): Path<i32>,
) -> AppResult<Json<TaskDetail>> {
    trace!("Entering get_task function");
    let (task, project) = task::Entity::find_by_id(task_id)
        .find_also_related(project::Entity)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task {} not found", task_id)))?;

    let owner_id = project
        .map(|project| project.owner_id)
        .ok_or_else(|| AppError::NotFound(format!("Project of task {} not found", task_id)))?;
    if !can_view_task(user.id, &task, owner_id) {
        return Err(AppError::Forbidden);
    }
    Ok(Json(TaskDetail::from(task)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn form(priority: &str, status: &str, due_date: &str) -> TaskForm {
        TaskForm {
            title: "Write report".to_string(),
            priority: priority.to_string(),
            status: status.to_string(),
            due_date: due_date.to_string(),
            ..TaskForm::default()
        }
    }

    #[test]
    fn parse_applies_defaults() {
        let task = form("2", "", "").parse(today()).unwrap();
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, 2);
        assert_eq!(task.due_date, None);
        assert_eq!(task.assignee_id, None);
        assert_eq!(task.description, None);
    }

    #[test]
    fn parse_rejects_bad_priority() {
        assert_eq!(form("", "", "").parse(today()).unwrap_err().field, "priority");
        assert_eq!(
            form("high", "", "").parse(today()).unwrap_err().message,
            "Priority must be a whole number."
        );
        assert_eq!(
            form("6", "", "").parse(today()).unwrap_err().message,
            "Priority must be between 1 (highest) and 5 (lowest)."
        );
    }

    #[test]
    fn parse_rejects_unknown_status_and_bad_date() {
        assert_eq!(form("3", "blocked", "").parse(today()).unwrap_err().field, "status");
        assert_eq!(
            form("3", "todo", "15/06/2024").parse(today()).unwrap_err().message,
            "Enter a valid date."
        );
    }

    #[test]
    fn parse_rejects_completed_task_due_later() {
        let err = form("3", "done", "2024-06-16").parse(today()).unwrap_err();
        assert_eq!(err.message, "Completed tasks cannot have a future due date.");
        assert!(form("3", "done", "2024-06-15").parse(today()).is_ok());
    }

    #[test]
    fn parse_rejects_non_numeric_assignee() {
        let mut raw = form("3", "", "");
        raw.assignee_id = "rahul".to_string();
        assert_eq!(raw.parse(today()).unwrap_err().field, "assignee");
    }

    #[test]
    fn list_filters_ignore_empty_values() {
        let query = TaskListQuery {
            status: Some(String::new()),
            project_id: Some(" ".to_string()),
            due_before: None,
        };
        assert_eq!(query.filters().unwrap(), TaskFilters::default());
    }

    #[test]
    fn list_filters_parse_and_reject() {
        let query = TaskListQuery {
            status: Some("nonsense".to_string()),
            project_id: Some("4".to_string()),
            due_before: Some("2024-06-30".to_string()),
        };
        let filters = query.filters().unwrap();
        assert_eq!(filters.status, Some(StatusFilter::Unknown));
        assert_eq!(filters.project_id, Some(4));
        assert_eq!(filters.due_before, NaiveDate::from_ymd_opt(2024, 6, 30));

        let bad_project = TaskListQuery {
            project_id: Some("four".to_string()),
            ..TaskListQuery::default()
        };
        assert!(matches!(bad_project.filters(), Err(AppError::BadRequest(_))));

        let bad_date = TaskListQuery {
            due_before: Some("June".to_string()),
            ..TaskListQuery::default()
        };
        assert!(matches!(bad_date.filters(), Err(AppError::BadRequest(_))));
    }
}
