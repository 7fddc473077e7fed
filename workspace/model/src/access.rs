//! Who may see or change what.
//!
//! A project is visible to its owner only. A task is visible to the owner of
//! its project and to its assignee. Only the owner of a project may add tasks
//! to it. The query helpers below express the same rules as SQL conditions so
//! listings never have to re-derive them.

use crate::entities::{project, task};
use sea_orm::{ColumnTrait, Condition, EntityTrait, JoinType, QueryFilter, QuerySelect, RelationTrait, Select};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The resource exists but the user is not allowed to act on it.
    #[error("Not allowed")]
    Forbidden,
}

pub fn can_view_project(user_id: i32, project: &project::Model) -> bool {
    project.owner_id == user_id
}

/// `project_owner_id` is the owner of the project `task` belongs to.
pub fn can_view_task(user_id: i32, task: &task::Model, project_owner_id: i32) -> bool {
    project_owner_id == user_id || task.assignee_id == Some(user_id)
}

/// Adding tasks to a project is reserved to its owner.
pub fn ensure_project_owner(user_id: i32, project: &project::Model) -> Result<(), AccessError> {
    if can_view_project(user_id, project) {
        Ok(())
    } else {
        Err(AccessError::Forbidden)
    }
}

/// Condition matching the tasks `user_id` may see.
///
/// Only meaningful on a query that joins `projects`, see [`visible_tasks`].
pub fn task_visibility_condition(user_id: i32) -> Condition {
    Condition::any()
        .add(project::Column::OwnerId.eq(user_id))
        .add(task::Column::AssigneeId.eq(user_id))
}

/// Every task `user_id` may see. Each task appears once: the join follows
/// the task's single owning project.
pub fn visible_tasks(user_id: i32) -> Select<task::Entity> {
    task::Entity::find()
        .join(JoinType::InnerJoin, task::Relation::Project.def())
        .filter(task_visibility_condition(user_id))
}

/// Every task in a project owned by `user_id`.
pub fn owned_project_tasks(user_id: i32) -> Select<task::Entity> {
    task::Entity::find()
        .join(JoinType::InnerJoin, task::Relation::Project.def())
        .filter(project::Column::OwnerId.eq(user_id))
}

/// Every project owned by `user_id`.
pub fn owned_projects(user_id: i32) -> Select<project::Entity> {
    project::Entity::find().filter(project::Column::OwnerId.eq(user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::task::TaskStatus;
    use chrono::{TimeZone, Utc};

    fn project(owner_id: i32) -> project::Model {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        project::Model {
            id: 10,
            name: "Roadmap".to_string(),
            description: None,
            owner_id,
            created_at: created,
            updated_at: created,
        }
    }

    fn task(assignee_id: Option<i32>) -> task::Model {
        let created = Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap();
        task::Model {
            id: 100,
            project_id: 10,
            title: "Draft".to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: 3,
            due_date: None,
            assignee_id,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn owner_sees_project_others_do_not() {
        let p = project(1);
        assert!(can_view_project(1, &p));
        assert!(!can_view_project(2, &p));
    }

    #[test]
    fn only_owner_may_add_tasks() {
        let p = project(1);
        assert_eq!(ensure_project_owner(1, &p), Ok(()));
        assert_eq!(ensure_project_owner(2, &p), Err(AccessError::Forbidden));
    }

    #[test]
    fn project_owner_sees_unassigned_task() {
        assert!(can_view_task(1, &task(None), 1));
    }

    #[test]
    fn assignee_sees_task_in_foreign_project() {
        assert!(can_view_task(2, &task(Some(2)), 1));
    }

    #[test]
    fn stranger_sees_nothing() {
        assert!(!can_view_task(3, &task(Some(2)), 1));
        assert!(!can_view_task(3, &task(None), 1));
    }
}
