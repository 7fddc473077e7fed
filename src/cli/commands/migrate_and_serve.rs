use anyhow::Result;
use tracing::{debug, info, trace};

use super::initdb::apply_migrations;
use super::serve::run_server;
use crate::config::{Settings, connect};

pub async fn migrate_and_serve(settings: Settings) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");
    debug!("Database URL: {}", settings.database_url);
    debug!("Bind address: {}", settings.bind_address);

    {
        let db = connect(&settings.database_url).await?;
        apply_migrations(&db).await?;
    }

    run_server(settings).await
}
