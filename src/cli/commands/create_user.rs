use anyhow::{Result, bail};
use model::entities::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use tracing::{info, trace};

use crate::auth::hash_password;
use crate::config::connect;

pub async fn create_user(database_url: &str, username: &str, password: &str) -> Result<()> {
    trace!("Entering create_user function");
    let username = username.trim();
    if username.is_empty() {
        bail!("Username must not be empty");
    }
    if password.is_empty() {
        bail!("Password must not be empty");
    }

    let db = connect(database_url).await?;
    let taken = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .count(&db)
        .await?;
    if taken > 0 {
        bail!("User '{}' already exists", username);
    }

    let user = user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set(hash_password(password)?),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    info!("Created user '{}' with ID {}", user.username, user.id);
    Ok(())
}
