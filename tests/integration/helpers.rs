//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use dms::App;
use dms_core::config::AppConfig;
use dms_core::result::AppResult;
use dms_core::traits::cache::CacheProvider;
use dms_core::types::{ProjectId, UserId};
use dms_database::{EntityStore, MemoryEntityStore};
use dms_entity::file::{CreateFile, DmsFile};
use dms_entity::folder::Folder;
use dms_entity::link::{CreateLink, Link, LinkTarget};
use dms_entity::project::{Membership, Permission, Project, Role};
use dms_service::RequestContext;

/// Response cache that only records invalidated keys.
#[derive(Debug, Default)]
pub struct RecordingCache {
    keys: Mutex<Vec<String>>,
}

impl RecordingCache {
    /// Keys invalidated so far, in order.
    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }

    /// Forget recorded keys.
    pub fn clear(&self) {
        self.keys.lock().unwrap().clear();
    }
}

#[async_trait]
impl CacheProvider for RecordingCache {
    async fn delete(&self, key: &str) -> AppResult<()> {
        self.keys.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

/// Test application context
pub struct TestApp {
    /// The wired services
    pub app: App,
    /// Direct handle on the backing store for seeding
    pub memory: MemoryEntityStore,
    /// Invalidations seen by the services
    pub cache: Arc<RecordingCache>,
    /// A module-enabled project
    pub project: Project,
    /// The acting member
    pub ctx: RequestContext,
}

impl TestApp {
    /// Create a new test application over the memory store
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    /// Create a new test application with custom settings
    pub async fn with_config(config: AppConfig) -> Self {
        let memory = MemoryEntityStore::new();
        let cache = Arc::new(RecordingCache::default());
        let app = App::with_store(config, memory.clone(), cache.clone());

        let project = Project {
            id: ProjectId::new(),
            name: "Alpha".to_string(),
            notification_default: false,
            dms_enabled: true,
        };
        memory.insert_project(project.clone()).await;

        Self {
            app,
            memory,
            cache,
            project,
            ctx: RequestContext::member(UserId::new()),
        }
    }

    /// Seed a project
    pub async fn create_project(&self, name: &str, dms_enabled: bool) -> Project {
        let project = Project {
            id: ProjectId::new(),
            name: name.to_string(),
            notification_default: false,
            dms_enabled,
        };
        self.memory.insert_project(project.clone()).await;
        project
    }

    /// Give `user_id` one role with `permissions` in `project`
    pub async fn add_member(&self, project: &Project, user_id: UserId, permissions: &[Permission]) {
        self.memory
            .insert_membership(Membership {
                project_id: project.id,
                user_id,
                roles: vec![Role {
                    name: "Member".to_string(),
                    permissions: permissions.to_vec(),
                }],
            })
            .await;
    }

    /// Create a folder through the folder service
    pub async fn folder(&self, parent: Option<&Folder>, title: &str) -> Folder {
        let project_id = parent.map_or(self.project.id, |p| p.project_id);
        self.app
            .folders
            .create_folder(&self.ctx, project_id, parent.map(|p| p.id), title, None)
            .await
            .expect("Failed to create folder")
    }

    /// Seed a file
    pub async fn file(&self, folder: &Folder, name: &str, size_bytes: i64) -> DmsFile {
        self.app
            .store
            .insert_file(&CreateFile {
                project_id: folder.project_id,
                folder_id: Some(folder.id),
                name: name.to_string(),
                description: None,
                size_bytes,
                user_id: self.ctx.user_id,
            })
            .await
            .expect("Failed to create file")
    }

    /// Seed a link
    pub async fn link(&self, folder: &Folder, target: LinkTarget, name: &str) -> Link {
        self.app
            .store
            .insert_link(&CreateLink {
                project_id: folder.project_id,
                folder_id: Some(folder.id),
                target,
                name: name.to_string(),
                user_id: self.ctx.user_id,
            })
            .await
            .expect("Failed to create link")
    }

    /// Re-read a folder that must still exist
    pub async fn reload(&self, folder: &Folder) -> Folder {
        self.app
            .folders
            .get_folder(folder.id)
            .await
            .expect("Folder disappeared")
    }
}
