//! Integration tests for tree placement, paths, and aggregates.

mod helpers;

use dms_core::error::ErrorKind;
use dms_database::EntityStore;
use dms_entity::DeletedState;
use dms_entity::link::LinkTarget;

#[tokio::test]
async fn test_move_into_descendant_fails() {
    let app = helpers::TestApp::new().await;
    let a = app.folder(None, "A").await;
    let b = app.folder(Some(&a), "B").await;
    let c = app.folder(Some(&b), "C").await;

    let err = app
        .app
        .folders
        .move_folder(&app.ctx, a.id, Some(c.id))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(app.reload(&a).await.parent_id, None);
    assert_eq!(app.app.tree.path_str(&c).await.unwrap(), "A/B/C");
}

#[tokio::test]
async fn test_move_into_itself_fails() {
    let app = helpers::TestApp::new().await;
    let a = app.folder(None, "A").await;

    let err = app
        .app
        .folders
        .move_folder(&app.ctx, a.id, Some(a.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_sibling_titles_unique_only_among_active() {
    let app = helpers::TestApp::new().await;
    let p = app.folder(None, "P").await;
    let q = app.folder(None, "Q").await;
    let reports = app.folder(Some(&p), "Reports").await;
    let folders = &app.app.folders;

    let err = folders
        .create_folder(&app.ctx, app.project.id, Some(p.id), "Reports", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    folders
        .create_folder(&app.ctx, app.project.id, Some(q.id), "Reports", None)
        .await
        .unwrap();

    app.app.lifecycle.delete(&app.ctx, reports.id, false).await.unwrap();
    folders
        .create_folder(&app.ctx, app.project.id, Some(p.id), "Reports", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_moved_folder_keeps_unique_title() {
    let app = helpers::TestApp::new().await;
    let p = app.folder(None, "P").await;
    let q = app.folder(None, "Q").await;
    app.folder(Some(&p), "Reports").await;
    let other = app.folder(Some(&q), "Reports").await;

    let err = app
        .app
        .folders
        .move_folder(&app.ctx, other.id, Some(p.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(app.reload(&other).await.parent_id, Some(q.id));
}

#[tokio::test]
async fn test_deep_aggregates_ignore_deleted_subtree() {
    let app = helpers::TestApp::new().await;
    let a = app.folder(None, "A").await;
    let b = app.folder(Some(&a), "B").await;
    app.file(&a, "plan.pdf", 10).await;
    app.file(&b, "draft.pdf", 5).await;

    let stats = app.app.tree.deep_stats(&a).await.unwrap();
    assert_eq!(stats.size_bytes, 15);
    assert_eq!(stats.file_count, 2);
    assert_eq!(stats.folder_count, 1);

    let mut hidden = b.clone();
    hidden.deleted = DeletedState::Deleted;
    app.app.store.update_folder(&hidden).await.unwrap();

    let a = app.reload(&a).await;
    assert_eq!(app.app.tree.deep_size(&a).await.unwrap(), 10);
    assert_eq!(app.app.tree.deep_file_count(&a).await.unwrap(), 1);
    assert_eq!(app.app.tree.deep_folder_count(&a).await.unwrap(), 0);
}

#[tokio::test]
async fn test_links_count_toward_aggregates() {
    let app = helpers::TestApp::new().await;
    let a = app.folder(None, "A").await;
    let target = app.folder(None, "Target").await;
    let file = app.file(&target, "manual.pdf", 3).await;
    app.link(&a, LinkTarget::Folder(target.id), "to target").await;
    app.link(&a, LinkTarget::File(file.id), "to manual").await;
    app.link(&a, LinkTarget::Url("https://example.com".into()), "site")
        .await;

    let stats = app.app.tree.deep_stats(&a).await.unwrap();
    assert_eq!(stats.folder_count, 1);
    assert_eq!(stats.file_count, 2);
    assert_eq!(stats.size_bytes, 0);
    assert_eq!(app.app.tree.item_count(&a).await.unwrap(), 3);
}

#[tokio::test]
async fn test_directory_tree_lists_project() {
    let app = helpers::TestApp::new().await;
    let a = app.folder(None, "A").await;
    let b = app.folder(Some(&a), "B").await;
    app.folder(None, "C").await;

    let labels: Vec<String> = app
        .app
        .tree
        .directory_tree(app.project.id, None)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.label)
        .collect();
    assert_eq!(labels, vec!["Documents", "...A", "......B", "...C"]);

    let labels: Vec<String> = app
        .app
        .tree
        .directory_tree(app.project.id, Some(a.id))
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.label)
        .collect();
    assert_eq!(labels, vec!["Documents", "...C"]);

    let subtree = app.app.tree.folder_tree(&a).await.unwrap();
    assert_eq!(subtree.len(), 2);
    assert_eq!(subtree[1].folder_id, Some(b.id));
}

#[tokio::test]
async fn test_notification_inherits_through_ancestors() {
    let app = helpers::TestApp::new().await;
    let a = app.folder(None, "A").await;
    let b = app.folder(Some(&a), "B").await;
    let c = app.folder(Some(&b), "C").await;
    let notifications = &app.app.notifications;

    assert!(!notifications.should_notify(&c).await.unwrap());

    notifications
        .activate_notifications(&app.ctx, a.id)
        .await
        .unwrap();
    assert!(notifications.should_notify(&c).await.unwrap());

    notifications
        .deactivate_notifications(&app.ctx, a.id)
        .await
        .unwrap();
    assert!(!notifications.should_notify(&c).await.unwrap());
}
