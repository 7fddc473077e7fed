#[cfg(test)]
pub mod test_utils {
    use crate::auth::CurrentUser;
    use crate::config::Settings;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::http::StatusCode;
    use axum_test::{TestServer, TestServerConfig};
    use chrono::{Days, NaiveDate, Utc};
    use migration::{Migrator, MigratorTrait};
    use model::entities::{project, task, task::TaskStatus, user};
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
    use tracing_subscriber::EnvFilter;

    pub const TEST_PASSWORD: &str = "test123";

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Install a stderr subscriber once; level comes from RUST_LOG, WARN otherwise.
    pub fn init_test_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Insert a user with [`TEST_PASSWORD`], hashed at the cheapest bcrypt cost.
    pub async fn create_user(db: &DatabaseConnection, username: &str) -> CurrentUser {
        let hash = bcrypt::hash(TEST_PASSWORD, 4).expect("Failed to hash password");
        user::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(hash),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test user")
        .into()
    }

    pub async fn create_project(db: &DatabaseConnection, owner: &CurrentUser, name: &str) -> project::Model {
        project::ActiveModel {
            name: Set(name.to_string()),
            description: Set(None),
            owner_id: Set(owner.id),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test project")
    }

    pub struct TaskSeed<'a> {
        pub title: &'a str,
        pub status: TaskStatus,
        pub priority: i32,
        pub due_date: Option<NaiveDate>,
        pub assignee: Option<&'a CurrentUser>,
    }

    impl<'a> TaskSeed<'a> {
        pub fn new(title: &'a str) -> Self {
            Self {
                title,
                status: TaskStatus::Todo,
                priority: 3,
                due_date: None,
                assignee: None,
            }
        }
    }

    pub async fn create_task(db: &DatabaseConnection, project: &project::Model, seed: TaskSeed<'_>) -> task::Model {
        task::ActiveModel {
            project_id: Set(project.id),
            title: Set(seed.title.to_string()),
            description: Set(None),
            status: Set(seed.status),
            priority: Set(seed.priority),
            due_date: Set(seed.due_date),
            assignee_id: Set(seed.assignee.map(|user| user.id)),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test task")
    }

    pub fn days_from_today(days: u64) -> NaiveDate {
        Utc::now()
            .date_naive()
            .checked_add_days(Days::new(days))
            .expect("date in range")
    }

    /// A running app over its own in-memory database, with a cookie jar.
    pub struct TestApp {
        pub server: TestServer,
        pub db: DatabaseConnection,
    }

    impl TestApp {
        pub async fn new() -> Self {
            init_test_tracing();
            let db = setup_test_db().await;
            let state = AppState {
                db: db.clone(),
                settings: Settings {
                    database_url: "sqlite::memory:".to_string(),
                    ..Settings::default()
                },
            };
            let config = TestServerConfig {
                save_cookies: true,
                ..TestServerConfig::default()
            };
            let server = TestServer::new_with_config(create_router(state), config)
                .expect("Failed to start test server");
            Self { server, db }
        }

        /// Log in through the form; the session cookie is kept for later requests.
        pub async fn login(&self, username: &str) {
            let response = self
                .server
                .post("/login")
                .form(&[("username", username), ("password", TEST_PASSWORD)])
                .await;
            response.assert_status(StatusCode::SEE_OTHER);
            assert_ne!(location(&response), "/login", "login as {username} failed");
        }

        pub async fn logout(&self) {
            self.server.post("/logout").await.assert_status(StatusCode::SEE_OTHER);
        }
    }

    pub fn location(response: &axum_test::TestResponse) -> String {
        response
            .header("location")
            .to_str()
            .expect("location header is ASCII")
            .to_string()
    }
}
