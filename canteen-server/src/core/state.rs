//! Shared server state

use super::Config;
use crate::catalog::CatalogService;
use crate::orders::OrderManager;
use crate::store::CanteenStore;
use std::path::Path;
use std::sync::Arc;

/// State handed to every HTTP handler
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub store: CanteenStore,
    pub manager: OrderManager,
    pub catalog: CatalogService,
}

impl ServerState {
    /// Open the store under the configured work directory and wire up the
    /// services
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let db_path = Path::new(&config.work_dir).join("canteen.redb");
        let store = CanteenStore::open(&db_path)?;
        let manager = OrderManager::new(store.clone(), config.pickup);
        let catalog = CatalogService::new(store.clone());
        tracing::info!(db = %db_path.display(), "Server state initialized");
        Ok(Self {
            config: Arc::new(config.clone()),
            store,
            manager,
            catalog,
        })
    }
}
