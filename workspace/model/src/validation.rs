//! Field rules a task must satisfy before it is written to the store.
//!
//! The rules are pure: callers pass the date they consider "today" so the
//! same candidate always produces the same verdict. The task entity runs
//! [`validate_task`] from its `before_save` hook, so there is no persist path
//! that skips these checks.

use crate::entities::task::TaskStatus;
use chrono::NaiveDate;
use thiserror::Error;

/// Highest priority a task may carry.
pub const PRIORITY_MIN: i32 = 1;
/// Lowest priority a task may carry.
pub const PRIORITY_MAX: i32 = 5;
/// Maximum length of a task title, in characters.
pub const TITLE_MAX_LEN: usize = 120;

/// The task attributes the rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskFields<'a> {
    pub title: &'a str,
    pub status: TaskStatus,
    pub priority: i32,
    pub due_date: Option<NaiveDate>,
}

/// A rule violation, tagged with the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn check_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::new("title", "Title is required."));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(ValidationError::new(
            "title",
            format!("Title must be at most {TITLE_MAX_LEN} characters."),
        ));
    }
    Ok(())
}

pub fn check_priority(priority: i32) -> Result<(), ValidationError> {
    if !(PRIORITY_MIN..=PRIORITY_MAX).contains(&priority) {
        return Err(ValidationError::new(
            "priority",
            "Priority must be between 1 (highest) and 5 (lowest).",
        ));
    }
    Ok(())
}

/// A finished task may not be due after `today`.
pub fn check_due_date(
    status: TaskStatus,
    due_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    match due_date {
        Some(due) if status == TaskStatus::Done && due > today => Err(ValidationError::new(
            "due_date",
            "Completed tasks cannot have a future due date.",
        )),
        _ => Ok(()),
    }
}

/// Runs every task rule, reporting the first violation.
pub fn validate_task(fields: &TaskFields<'_>, today: NaiveDate) -> Result<(), ValidationError> {
    check_title(fields.title)?;
    check_priority(fields.priority)?;
    check_due_date(fields.status, fields.due_date, today)
}
