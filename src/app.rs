//! Application wiring.

use std::sync::Arc;

use tracing::{info, warn};

use dms_cache::CacheManager;
use dms_core::config::AppConfig;
use dms_core::error::AppError;
use dms_core::result::AppResult;
use dms_core::traits::cache::CacheProvider;
use dms_database::{DatabasePool, EntityStore, MemoryEntityStore, PgEntityStore};
use dms_service::{
    CopyService, FolderService, InvalidatingStore, LifecycleService, LockService,
    NotificationPropagator, ProjectGuards, TreeService,
};

/// Every folder service, sharing one store, cache, and set of project guards.
#[derive(Debug, Clone)]
pub struct App {
    /// Loaded configuration.
    pub config: AppConfig,
    /// The store every service reads and writes, with cache invalidation applied.
    pub store: Arc<dyn EntityStore>,
    /// Response cache signalled on folder writes.
    pub cache: Arc<dyn CacheProvider>,
    /// Per-project write serialisation.
    pub guards: ProjectGuards,
    /// Paths, aggregates, and validation.
    pub tree: TreeService,
    /// Create, rename, move, describe.
    pub folders: FolderService,
    /// Delete, restore, destroy.
    pub lifecycle: LifecycleService,
    /// Deep copies.
    pub copier: CopyService,
    /// Folder and file locks.
    pub locks: LockService,
    /// Notification inheritance.
    pub notifications: NotificationPropagator,
    pool: Option<DatabasePool>,
}

impl App {
    /// Connects the configured store and cache and wires the services.
    pub async fn build(config: AppConfig) -> AppResult<Self> {
        info!(
            store = %config.database.provider,
            cache = %config.cache.provider,
            "Initializing application"
        );

        let cache: Arc<dyn CacheProvider> = Arc::new(CacheManager::new(&config.cache)?);

        match config.database.provider.as_str() {
            "postgres" => {
                let pool = DatabasePool::connect(&config.database).await?;
                let store = PgEntityStore::new(pool.pool().clone());
                let mut app = Self::with_store(config, store, cache);
                app.pool = Some(pool);
                Ok(app)
            }
            "memory" => {
                warn!("Using the in-memory store; nothing is persisted");
                Ok(Self::with_store(config, MemoryEntityStore::new(), cache))
            }
            other => Err(AppError::configuration(format!(
                "Unknown database provider: {other}"
            ))),
        }
    }

    /// Wires the services over an already constructed store.
    pub fn with_store<S: EntityStore>(
        config: AppConfig,
        store: S,
        cache: Arc<dyn CacheProvider>,
    ) -> Self {
        let store: Arc<dyn EntityStore> = Arc::new(InvalidatingStore::new(store, cache.clone()));
        let guards = ProjectGuards::new();

        let tree = TreeService::new(store.clone(), &config.dms);
        let locks = LockService::new(store.clone(), tree.clone(), guards.clone());
        let folders = FolderService::new(store.clone(), tree.clone(), guards.clone(), &config.dms);
        let lifecycle =
            LifecycleService::new(store.clone(), tree.clone(), locks.clone(), guards.clone());
        let copier = CopyService::new(store.clone(), tree.clone(), guards.clone(), &config.dms);
        let notifications = NotificationPropagator::new(store.clone(), &config.dms);

        Self {
            config,
            store,
            cache,
            guards,
            tree,
            folders,
            lifecycle,
            copier,
            locks,
            notifications,
            pool: None,
        }
    }

    /// The PostgreSQL pool, when the store is backed by one.
    pub fn pool(&self) -> Option<&DatabasePool> {
        self.pool.as_ref()
    }

    /// Closes the pool, if any.
    pub async fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
