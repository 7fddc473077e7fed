//! Server-rendered HTML pages.

use compute::{DashboardSummary, UpcomingTasks};
use model::entities::{project, task, task::TaskStatus};
use model::validation::TITLE_MAX_LEN;
use sea_orm::Iterable;

use crate::auth::CurrentUser;
use crate::flash::FlashMessage;

/// Escapes text for use inside HTML element content and quoted attributes.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn flash_list(messages: &[FlashMessage]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let mut html = String::from("<ul class=\"messages\">");
    for message in messages {
        html.push_str(&format!(
            "<li class=\"{}\">{}</li>",
            message.level.css_class(),
            escape_html(&message.message)
        ));
    }
    html.push_str("</ul>");
    html
}

fn layout(title: &str, user: Option<&CurrentUser>, messages: &[FlashMessage], body: &str) -> String {
    let nav = match user {
        Some(user) => format!(
            r#"<nav>
    <a href="/projects/">Projects</a>
    <a href="/dashboard/">Dashboard</a>
    <span class="user">{}</span>
    <form method="post" action="/logout"><button type="submit">Log out</button></form>
</nav>"#,
            escape_html(&user.username)
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{title} | Task Tracker</title>
</head>
<body>
{nav}
<main>
<h1>{title}</h1>
{messages}
{body}
</main>
</body>
</html>"#,
        title = escape_html(title),
        nav = nav,
        messages = flash_list(messages),
        body = body,
    )
}

pub fn login_page(messages: &[FlashMessage], next: Option<&str>) -> String {
    let next_field = next
        .map(|next| {
            format!(
                r#"<input type="hidden" name="next" value="{}">"#,
                escape_html(next)
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"<form method="post" action="/login">
    {next_field}
    <label>Username <input type="text" name="username" required></label>
    <label>Password <input type="password" name="password" required></label>
    <button type="submit">Log in</button>
</form>"#
    );
    layout("Log in", None, messages, &body)
}

fn task_form(project: &project::Model) -> String {
    let mut statuses = String::new();
    for status in TaskStatus::iter() {
        let selected = if status == TaskStatus::default() {
            " selected"
        } else {
            ""
        };
        statuses.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            status.as_str(),
            selected,
            status.label()
        ));
    }

    format!(
        r#"<form method="post" action="/projects/{id}/tasks/" class="task-form">
    <label>Title <input type="text" name="title" maxlength="{title_max}" required></label>
    <label>Description <textarea name="description"></textarea></label>
    <label>Priority <input type="number" name="priority" min="1" max="5" value="3" required></label>
    <label>Status <select name="status">{statuses}</select></label>
    <label>Due date <input type="date" name="due_date"></label>
    <label>Assignee id <input type="number" name="assignee_id"></label>
    <button type="submit">Add task</button>
</form>"#,
        id = project.id,
        title_max = TITLE_MAX_LEN,
    )
}

pub fn projects_page(
    user: &CurrentUser,
    messages: &[FlashMessage],
    projects: &[(project::Model, Vec<task::Model>)],
    search: Option<&str>,
) -> String {
    let mut body = format!(
        r#"<form method="get" action="/projects/" class="search">
    <input type="search" name="search" value="{}" placeholder="Search projects">
    <button type="submit">Search</button>
</form>
<form method="post" action="/projects/" class="project-form">
    <label>Name <input type="text" name="name" maxlength="{}" required></label>
    <label>Description <textarea name="description"></textarea></label>
    <button type="submit">Create project</button>
</form>
"#,
        escape_html(search.unwrap_or_default()),
        project::NAME_MAX_LEN
    );

    if projects.is_empty() {
        body.push_str("<p class=\"empty\">No projects yet.</p>");
    }

    for (project, tasks) in projects {
        body.push_str(&format!(
            r#"<section class="project" id="project-{}">
<h2>{}</h2>
"#,
            project.id,
            escape_html(&project.name)
        ));
        if let Some(description) = &project.description {
            body.push_str(&format!("<p>{}</p>\n", escape_html(description)));
        }
        if !tasks.is_empty() {
            body.push_str("<ul class=\"tasks\">");
            for task in tasks {
                body.push_str(&format!(
                    "<li>{} <span class=\"status\">{}</span> <span class=\"priority\">P{}</span></li>",
                    escape_html(&task.title),
                    task.status.label(),
                    task.priority
                ));
            }
            body.push_str("</ul>\n");
        }
        body.push_str(&task_form(project));
        body.push_str("\n</section>\n");
    }

    layout("Projects", Some(user), messages, &body)
}

pub fn dashboard_page(user: &CurrentUser, summary: &DashboardSummary) -> String {
    let mut body = format!(
        r#"<dl class="totals">
    <dt>Projects</dt><dd id="projects-count">{}</dd>
    <dt>Tasks</dt><dd id="total-tasks">{}</dd>
</dl>
"#,
        summary.projects_count, summary.total_tasks
    );

    body.push_str("<h2>By status</h2>\n<ul class=\"status-counts\">");
    for entry in &summary.status_counts {
        body.push_str(&format!("<li>{}: {}</li>", entry.status.label(), entry.count));
    }
    body.push_str("</ul>\n<h2>Upcoming</h2>\n");

    match &summary.upcoming {
        UpcomingTasks::Scheduled(tasks) => {
            body.push_str("<ol class=\"upcoming\">");
            for task in tasks {
                body.push_str(&format!(
                    "<li>{} <span class=\"due\">{}</span> <span class=\"project\">{}</span> <span class=\"status\">{}</span></li>",
                    escape_html(&task.title),
                    task.due_date.format("%Y-%m-%d"),
                    escape_html(&task.project_name),
                    task.status.label()
                ));
            }
            body.push_str("</ol>");
        }
        UpcomingTasks::NothingUpcoming => body.push_str("<p class=\"empty\">No upcoming tasks!</p>"),
    }

    layout("Dashboard", Some(user), &[], &body)
}
