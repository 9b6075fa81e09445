use std::sync::Arc;

use tracing::info;

use super::{config::Config, database::Database, error::AppError};

pub struct State {
    pub config: Config,
    pub database: Database,
}

impl State {
    pub fn new(config: Config) -> Result<Arc<Self>, AppError> {
        info!("Opening database at {}", config.database_path.display());
        let database = Database::open(&config.database_path)?;

        Ok(Self::with_database(config, database))
    }

    pub fn with_database(config: Config, database: Database) -> Arc<Self> {
        Arc::new(Self { config, database })
    }
}
