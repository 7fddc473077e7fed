pub mod dashboard;
pub mod error;

pub use dashboard::{
    DashboardSummary, StatusCount, UPCOMING_LIMIT, UpcomingTask, UpcomingTasks, dashboard_summary,
};
pub use error::{ComputeError, Result};
