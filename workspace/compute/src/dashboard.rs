//! Aggregates shown on a user's dashboard.
//!
//! Everything here is scoped to the projects the user owns; tasks merely
//! assigned to the user in someone else's project are not counted.

use std::collections::HashMap;

use chrono::NaiveDate;
use model::access::{owned_project_tasks, owned_projects};
use model::entities::task::{self, TaskStatus};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, Iterable, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use tracing::{debug, instrument, trace};

use crate::error::Result;

/// How many upcoming tasks the dashboard lists.
pub const UPCOMING_LIMIT: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingTask {
    pub id: i32,
    pub title: String,
    pub status: TaskStatus,
    pub priority: i32,
    pub due_date: NaiveDate,
    pub project_id: i32,
    pub project_name: String,
}

/// The soonest-due open tasks, or an explicit marker that there are none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpcomingTasks {
    Scheduled(Vec<UpcomingTask>),
    NothingUpcoming,
}

impl UpcomingTasks {
    fn from_tasks(tasks: Vec<UpcomingTask>) -> Self {
        if tasks.is_empty() {
            UpcomingTasks::NothingUpcoming
        } else {
            UpcomingTasks::Scheduled(tasks)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub projects_count: u64,
    pub total_tasks: u64,
    /// Only statuses with at least one task, in workflow order.
    pub status_counts: Vec<StatusCount>,
    pub upcoming: UpcomingTasks,
}

/// Builds the dashboard for the projects owned by `owner_id`.
#[instrument(skip(db))]
pub async fn dashboard_summary<C>(db: &C, owner_id: i32) -> Result<DashboardSummary>
where
    C: ConnectionTrait,
{
    let projects: HashMap<i32, String> = owned_projects(owner_id)
        .all(db)
        .await?
        .into_iter()
        .map(|project| (project.id, project.name))
        .collect();
    trace!("Owner {} has {} projects", owner_id, projects.len());

    let total_tasks = owned_project_tasks(owner_id).count(db).await?;
    let mut status_counts: Vec<StatusCount> = owned_project_tasks(owner_id)
        .select_only()
        .column(task::Column::Status)
        .column_as(Expr::col((task::Entity, task::Column::Id)).count(), "count")
        .group_by(task::Column::Status)
        .into_tuple::<(TaskStatus, i64)>()
        .all(db)
        .await?
        .into_iter()
        .map(|(status, count)| StatusCount {
            status,
            count: count as u64,
        })
        .collect();
    status_counts.sort_by_key(|entry| entry.status);

    let upcoming = owned_project_tasks(owner_id)
        .filter(task::Column::Status.is_in(TaskStatus::iter().filter(TaskStatus::is_open)))
        .filter(task::Column::DueDate.is_not_null())
        .order_by_asc(task::Column::DueDate)
        .order_by_asc(task::Column::Id)
        .limit(UPCOMING_LIMIT)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|task| {
            let due_date = task.due_date?;
            Some(UpcomingTask {
                id: task.id,
                project_name: projects.get(&task.project_id).cloned().unwrap_or_default(),
                title: task.title,
                status: task.status,
                priority: task.priority,
                due_date,
                project_id: task.project_id,
            })
        })
        .collect();

    let summary = DashboardSummary {
        projects_count: projects.len() as u64,
        total_tasks,
        status_counts,
        upcoming: UpcomingTasks::from_tasks(upcoming),
    };
    debug!(
        "Dashboard for owner {}: {} projects, {} tasks",
        owner_id, summary.projects_count, summary.total_tasks
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use model::entities::{project, user};
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");
        Migrator::up(&db, None).await.expect("Failed to run migrations");
        db
    }

    async fn user(db: &DatabaseConnection, username: &str) -> user::Model {
        user::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(String::new()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    async fn project(db: &DatabaseConnection, owner: &user::Model, name: &str) -> project::Model {
        project::ActiveModel {
            name: Set(name.to_string()),
            description: Set(None),
            owner_id: Set(owner.id),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    async fn task(
        db: &DatabaseConnection,
        project: &project::Model,
        title: &str,
        status: TaskStatus,
        due_date: Option<NaiveDate>,
    ) -> task::Model {
        task::ActiveModel {
            project_id: Set(project.id),
            title: Set(title.to_string()),
            description: Set(None),
            status: Set(status),
            priority: Set(3),
            due_date: Set(due_date),
            assignee_id: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    fn date(day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 5, day)
    }

    #[tokio::test]
    async fn test_empty_dashboard_reports_nothing_upcoming() {
        let db = setup_db().await;
        let owner = user(&db, "solo").await;

        let summary = dashboard_summary(&db, owner.id).await.unwrap();
        assert_eq!(summary.projects_count, 0);
        assert_eq!(summary.total_tasks, 0);
        assert!(summary.status_counts.is_empty());
        assert_eq!(summary.upcoming, UpcomingTasks::NothingUpcoming);
    }

    #[tokio::test]
    async fn test_done_and_undated_tasks_are_not_upcoming() {
        let db = setup_db().await;
        let owner = user(&db, "owner").await;
        let p = project(&db, &owner, "Chores").await;
        task(&db, &p, "Finished", TaskStatus::Done, date(1)).await;
        task(&db, &p, "Someday", TaskStatus::Todo, None).await;

        let summary = dashboard_summary(&db, owner.id).await.unwrap();
        assert_eq!(summary.projects_count, 1);
        assert_eq!(summary.total_tasks, 2);
        assert_eq!(
            summary.status_counts,
            vec![
                StatusCount { status: TaskStatus::Todo, count: 1 },
                StatusCount { status: TaskStatus::Done, count: 1 },
            ]
        );
        assert_eq!(summary.upcoming, UpcomingTasks::NothingUpcoming);
    }

    #[tokio::test]
    async fn test_counts_and_upcoming_order() {
        let db = setup_db().await;
        let owner = user(&db, "owner").await;
        let other = user(&db, "other").await;
        let work = project(&db, &owner, "Work").await;
        let home = project(&db, &owner, "Home").await;
        let foreign = project(&db, &other, "Elsewhere").await;

        task(&db, &work, "Late", TaskStatus::InProgress, date(9)).await;
        task(&db, &work, "Soon", TaskStatus::Todo, date(2)).await;
        task(&db, &home, "Sooner", TaskStatus::Todo, date(1)).await;
        task(&db, &home, "Mid", TaskStatus::InProgress, date(5)).await;
        task(&db, &home, "Also mid", TaskStatus::Todo, date(5)).await;
        task(&db, &work, "Latest", TaskStatus::Todo, date(20)).await;
        task(&db, &work, "Shipped", TaskStatus::Done, date(1)).await;
        task(&db, &foreign, "Not mine", TaskStatus::Todo, date(1)).await;

        let summary = dashboard_summary(&db, owner.id).await.unwrap();
        assert_eq!(summary.projects_count, 2);
        assert_eq!(summary.total_tasks, 7);
        assert_eq!(
            summary.status_counts,
            vec![
                StatusCount { status: TaskStatus::Todo, count: 4 },
                StatusCount { status: TaskStatus::InProgress, count: 2 },
                StatusCount { status: TaskStatus::Done, count: 1 },
            ]
        );

        let UpcomingTasks::Scheduled(upcoming) = summary.upcoming else {
            panic!("expected upcoming tasks");
        };
        let titles: Vec<&str> = upcoming.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Sooner", "Soon", "Mid", "Also mid", "Late"]);
        assert_eq!(upcoming[0].project_name, "Home");
        assert_eq!(upcoming.len() as u64, UPCOMING_LIMIT);
    }
}
