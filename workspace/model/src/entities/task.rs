use super::{project, user};
use crate::validation::{self, TaskFields};
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Workflow state of a task.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, DeriveActiveEnum, Serialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    #[sea_orm(string_value = "todo")]
    Todo,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "done")]
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    /// Human readable label used by the HTML views.
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "Todo",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }

    /// Statuses that still need work.
    pub fn is_open(&self) -> bool {
        !matches!(self, TaskStatus::Done)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a [`TaskStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A unit of work belonging to a project.
///
/// Every insert and update goes through [`ActiveModelBehavior::before_save`],
/// which runs [`validation::validate_task`] and refuses the write on failure.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub project_id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub status: TaskStatus,
    /// 1 is the highest priority, 5 the lowest.
    pub priority: i32,
    pub due_date: Option<Date>,
    /// Cleared when the assigned user is deleted.
    pub assignee_id: Option<i32>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AssigneeId",
        to = "super::user::Column::Id"
    )]
    Assignee,
}

impl Related<project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignee.def()
    }
}

impl Model {
    pub fn fields(&self) -> TaskFields<'_> {
        TaskFields {
            title: &self.title,
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
        }
    }
}

fn current<V>(value: &ActiveValue<V>) -> Option<&V>
where
    V: Into<Value>,
{
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(v),
        ActiveValue::NotSet => None,
    }
}

/// Fills every field an update leaves `NotSet` with the stored value, so
/// partial updates are validated against the row they will produce.
async fn fill_from_stored<C>(model: &mut ActiveModel, db: &C) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let id = *current(&model.id)
        .ok_or_else(|| DbErr::Custom("task id is not set".to_string()))?;
    let stored = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("task {id}")))?;

    if model.title.is_not_set() {
        model.title = ActiveValue::Unchanged(stored.title);
    }
    if model.status.is_not_set() {
        model.status = ActiveValue::Unchanged(stored.status);
    }
    if model.priority.is_not_set() {
        model.priority = ActiveValue::Unchanged(stored.priority);
    }
    if model.due_date.is_not_set() {
        model.due_date = ActiveValue::Unchanged(stored.due_date);
    }
    Ok(())
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            fill_from_stored(&mut self, db).await?;
        }

        let title = current(&self.title)
            .ok_or_else(|| DbErr::Custom("task title is not set".to_string()))?;
        let priority = current(&self.priority)
            .ok_or_else(|| DbErr::Custom("task priority is not set".to_string()))?;
        let fields = TaskFields {
            title,
            status: current(&self.status).copied().unwrap_or_default(),
            priority: *priority,
            due_date: current(&self.due_date).copied().flatten(),
        };

        if let Err(err) = validation::validate_task(&fields, Utc::now().date_naive()) {
            tracing::warn!(field = err.field, "refusing to save task: {}", err.message);
            return Err(DbErr::Custom(err.to_string()));
        }

        let now = Utc::now();
        if insert {
            if let ActiveValue::NotSet = self.status {
                self.status = Set(TaskStatus::default());
            }
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}
