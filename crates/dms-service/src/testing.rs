//! Shared fixtures for the service unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use dms_core::config::DmsConfig;
use dms_core::error::AppError;
use dms_core::result::AppResult;
use dms_core::traits::cache::CacheProvider;
use dms_core::types::{ProjectId, UserId};
use dms_database::{EntityStore, MemoryEntityStore};
use dms_entity::file::{CreateFile, DmsFile};
use dms_entity::folder::{CreateFolder, Folder, NotificationSetting};
use dms_entity::link::{CreateLink, Link, LinkTarget};
use dms_entity::project::Project;

use crate::context::RequestContext;
use crate::folder::{CopyService, FolderService, LifecycleService, TreeService};
use crate::guard::ProjectGuards;
use crate::invalidation::InvalidatingStore;
use crate::lock::LockService;
use crate::notification::NotificationPropagator;

/// Cache that records every invalidated key.
#[derive(Debug, Default)]
pub(crate) struct RecordingCache {
    keys: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingCache {
    /// A cache whose invalidations always fail after being recorded.
    pub(crate) fn failing() -> Self {
        Self {
            keys: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }

    pub(crate) fn clear(&self) {
        self.keys.lock().unwrap().clear();
    }
}

#[async_trait]
impl CacheProvider for RecordingCache {
    async fn delete(&self, key: &str) -> AppResult<()> {
        self.keys.lock().unwrap().push(key.to_string());
        if self.fail {
            return Err(AppError::cache("cache unreachable"));
        }
        Ok(())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(!self.fail)
    }
}

/// A memory-backed project with every service wired up.
pub(crate) struct Fixture {
    pub memory: MemoryEntityStore,
    pub cache: Arc<RecordingCache>,
    pub store: Arc<dyn EntityStore>,
    pub project: Project,
    pub ctx: RequestContext,
    pub config: DmsConfig,
    pub guards: ProjectGuards,
}

impl Fixture {
    pub(crate) async fn new() -> Self {
        Self::with_config(DmsConfig::default()).await
    }

    pub(crate) async fn with_config(config: DmsConfig) -> Self {
        let memory = MemoryEntityStore::new();
        let project = Project {
            id: ProjectId::new(),
            name: "Alpha".to_string(),
            notification_default: false,
            dms_enabled: true,
        };
        memory.insert_project(project.clone()).await;

        let cache = Arc::new(RecordingCache::default());
        let store: Arc<dyn EntityStore> =
            Arc::new(InvalidatingStore::new(memory.clone(), cache.clone()));

        Self {
            memory,
            cache,
            store,
            project,
            ctx: RequestContext::member(UserId::new()),
            config,
            guards: ProjectGuards::new(),
        }
    }

    pub(crate) fn tree(&self) -> TreeService {
        TreeService::new(self.store.clone(), &self.config)
    }

    pub(crate) fn folders(&self) -> FolderService {
        FolderService::new(
            self.store.clone(),
            self.tree(),
            self.guards.clone(),
            &self.config,
        )
    }

    pub(crate) fn locks(&self) -> LockService {
        LockService::new(self.store.clone(), self.tree(), self.guards.clone())
    }

    pub(crate) fn lifecycle(&self) -> LifecycleService {
        LifecycleService::new(
            self.store.clone(),
            self.tree(),
            self.locks(),
            self.guards.clone(),
        )
    }

    pub(crate) fn copier(&self) -> CopyService {
        CopyService::new(
            self.store.clone(),
            self.tree(),
            self.guards.clone(),
            &self.config,
        )
    }

    pub(crate) fn notifications(&self) -> NotificationPropagator {
        NotificationPropagator::new(self.store.clone(), &self.config)
    }

    /// Inserts a folder directly, bypassing validation.
    pub(crate) async fn folder(&self, parent: Option<&Folder>, title: &str) -> Folder {
        self.store
            .insert_folder(&CreateFolder {
                project_id: self.project.id,
                parent_id: parent.map(|p| p.id),
                title: title.to_string(),
                description: None,
                user_id: self.ctx.user_id,
                notification: NotificationSetting::Inherit,
            })
            .await
            .unwrap()
    }

    pub(crate) async fn file(&self, folder: &Folder, name: &str, size_bytes: i64) -> DmsFile {
        self.store
            .insert_file(&CreateFile {
                project_id: folder.project_id,
                folder_id: Some(folder.id),
                name: name.to_string(),
                description: None,
                size_bytes,
                user_id: self.ctx.user_id,
            })
            .await
            .unwrap()
    }

    pub(crate) async fn link(&self, folder: &Folder, target: LinkTarget, name: &str) -> Link {
        self.store
            .insert_link(&CreateLink {
                project_id: folder.project_id,
                folder_id: Some(folder.id),
                target,
                name: name.to_string(),
                user_id: self.ctx.user_id,
            })
            .await
            .unwrap()
    }

    /// Re-reads a folder.
    pub(crate) async fn reload(&self, folder: &Folder) -> Folder {
        self.store.find_folder(folder.id).await.unwrap().unwrap()
    }
}
