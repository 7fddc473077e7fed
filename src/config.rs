use anyhow::Result;
use sea_orm::{Database, DatabaseConnection};
use serde::Deserialize;

use crate::schemas::AppState;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://tasktracker.db?mode=rwc";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Runtime settings.
///
/// Resolved from built-in defaults, an optional `config/tasktracker.*` file,
/// and `TASKTRACKER__*` environment variables, in that order. Command line
/// flags are applied on top with [`Settings::with_overrides`].
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    /// Mark the session cookie `Secure`; enable when served over HTTPS.
    #[serde(default)]
    pub session_secure: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            session_secure: false,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        config::Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("session_secure", false)?
            .add_source(config::File::with_name("config/tasktracker").required(false))
            .add_source(config::Environment::with_prefix("TASKTRACKER").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn with_overrides(mut self, database_url: Option<String>, bind_address: Option<String>) -> Self {
        if let Some(database_url) = database_url {
            self.database_url = database_url;
        }
        if let Some(bind_address) = bind_address {
            self.bind_address = bind_address;
        }
        self
    }
}

pub async fn connect(database_url: &str) -> Result<DatabaseConnection> {
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;
    Ok(db)
}

/// Initialize application state from resolved settings
pub async fn initialize_app_state(settings: Settings) -> Result<AppState> {
    let db = connect(&settings.database_url).await?;
    Ok(AppState { db, settings })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_given_values() {
        let settings = Settings::default().with_overrides(None, Some("127.0.0.1:8080".to_string()));
        assert_eq!(settings.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(settings.bind_address, "127.0.0.1:8080");
        assert!(!settings.session_secure);

        let settings = settings.with_overrides(Some("sqlite::memory:".to_string()), None);
        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.bind_address, "127.0.0.1:8080");
    }
}
