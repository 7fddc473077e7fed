//! One-shot messages carried in the session from a form submission to the
//! page the browser is redirected to.

use serde::{Deserialize, Serialize};
use tower_sessions::{Session, session};

const FLASH_KEY: &str = "_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

impl Level {
    pub fn css_class(&self) -> &'static str {
        match self {
            Level::Success => "flash-success",
            Level::Error => "flash-error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: Level,
    pub message: String,
}

pub async fn push(
    session: &Session,
    level: Level,
    message: impl Into<String>,
) -> Result<(), session::Error> {
    let mut pending: Vec<FlashMessage> = session.get(FLASH_KEY).await?.unwrap_or_default();
    pending.push(FlashMessage {
        level,
        message: message.into(),
    });
    session.insert(FLASH_KEY, pending).await
}

pub async fn success(session: &Session, message: impl Into<String>) -> Result<(), session::Error> {
    push(session, Level::Success, message).await
}

pub async fn error(session: &Session, message: impl Into<String>) -> Result<(), session::Error> {
    push(session, Level::Error, message).await
}

/// Removes and returns every pending message.
pub async fn take(session: &Session) -> Result<Vec<FlashMessage>, session::Error> {
    Ok(session
        .remove::<Vec<FlashMessage>>(FLASH_KEY)
        .await?
        .unwrap_or_default())
}
