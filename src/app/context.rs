use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{Result, SkimmerError};
use crate::config::Config;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::store::SqliteStore;
use crate::sync::FeedManager;

pub struct AppContext {
    pub config: Config,
    pub manager: FeedManager<SqliteStore>,
}

impl AppContext {
    /// Opens the store and runs first-run initialization. A failed
    /// initialization is logged; the context is still usable.
    pub async fn new(config: Config) -> Result<Self> {
        let db_path = match &config.database_path {
            Some(p) => p.clone(),
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        Self::with_store(config, store).await
    }

    pub async fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Self::with_store(config, store).await
    }

    async fn with_store(config: Config, store: Arc<SqliteStore>) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> =
            Arc::new(HttpFetcher::new(&config.user_agent, config.fetch_timeout())?);
        let manager = FeedManager::with_options(store, fetcher, config.manager_options());

        if let Err(e) = manager.init_db().await {
            tracing::error!("Database initialization failed: {}", e);
        }

        Ok(Self { config, manager })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| SkimmerError::Config("Could not find data directory".into()))?;
        let skimmer_dir = data_dir.join("skimmer");
        std::fs::create_dir_all(&skimmer_dir)?;
        Ok(skimmer_dir.join("feeds.db"))
    }
}
