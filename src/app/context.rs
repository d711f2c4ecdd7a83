use std::sync::Arc;
use std::time::Duration;

use crate::app::Result;
use crate::config::Config;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::orchestrator::Orchestrator;
use crate::store::{SqliteStore, Store};

/// Wires the pipeline together. Every component receives its
/// collaborators explicitly; nothing reaches into ambient state, which is
/// what lets tests swap in an in-memory store and a stub fetcher.
pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub orchestrator: Orchestrator,
    pub config: Config,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = config.resolve_db_path()?;
        let store = Arc::new(SqliteStore::new(&db_path)?);
        Ok(Self::wire(store, config))
    }

    pub fn in_memory() -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Ok(Self::wire(store, Config::default()))
    }

    fn wire(store: Arc<SqliteStore>, config: Config) -> Self {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::with_timeout(
            Duration::from_secs(config.fetch_timeout_secs),
        ));
        let orchestrator = Orchestrator::with_workers(
            store.clone() as Arc<dyn Store + Send + Sync>,
            fetcher.clone(),
            config.workers,
        );

        Self {
            store,
            fetcher,
            orchestrator,
            config,
        }
    }
}
