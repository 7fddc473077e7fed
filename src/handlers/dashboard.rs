use axum::{
    extract::{Extension, State},
    response::Html,
};
use compute::dashboard_summary;
use tracing::{debug, instrument, trace};

use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::schemas::AppState;
use crate::views;

/// Summary of the requester's own projects.
#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Html<String>> {
    trace!("Entering dashboard function");
    let summary = dashboard_summary(&state.db, user.id).await?;
    debug!(
        "Rendering dashboard for {}: {} projects, {} tasks",
        user.username, summary.projects_count, summary.total_tasks
    );
    Ok(Html(views::dashboard_page(&user, &summary)))
}
