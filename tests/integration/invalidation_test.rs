//! Integration tests for response cache invalidation.

mod helpers;

use dms_core::error::ErrorKind;
use dms_database::EntityStore;

#[tokio::test]
async fn test_create_signals_parent_listing_once() {
    let app = helpers::TestApp::new().await;
    let parent = app.folder(None, "Parent").await;
    app.cache.clear();

    app.folder(Some(&parent), "Child").await;

    assert_eq!(
        app.cache.keys(),
        vec![format!("PROPFIND/{}/{}", app.project.id, parent.id)]
    );
}

#[tokio::test]
async fn test_root_create_uses_project_key() {
    let app = helpers::TestApp::new().await;

    app.folder(None, "Top").await;

    assert_eq!(app.cache.keys(), vec![format!("PROPFIND/{}", app.project.id)]);
}

#[tokio::test]
async fn test_update_and_destroy_signal_once_each() {
    let app = helpers::TestApp::new().await;
    let parent = app.folder(None, "Parent").await;
    let child = app.folder(Some(&parent), "Child").await;
    let key = format!("PROPFIND/{}/{}", app.project.id, parent.id);

    app.cache.clear();
    app.app
        .folders
        .rename_folder(&app.ctx, child.id, "Renamed")
        .await
        .unwrap();
    assert_eq!(app.cache.keys(), vec![key.clone()]);

    app.cache.clear();
    app.app
        .lifecycle
        .delete(&app.ctx, child.id, true)
        .await
        .unwrap();
    assert_eq!(app.cache.keys(), vec![key]);
}

#[tokio::test]
async fn test_failed_validation_sends_nothing() {
    let app = helpers::TestApp::new().await;
    app.folder(None, "Taken").await;
    app.cache.clear();

    let err = app
        .app
        .folders
        .create_folder(&app.ctx, app.project.id, None, "Taken", None)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(app.cache.keys().is_empty());
}

#[tokio::test]
async fn test_reads_send_nothing() {
    let app = helpers::TestApp::new().await;
    let a = app.folder(None, "A").await;
    app.cache.clear();

    app.app.tree.deep_stats(&a).await.unwrap();
    app.app.tree.directory_tree(app.project.id, None).await.unwrap();
    app.app.tree.path_of(&a).await.unwrap();

    assert!(app.cache.keys().is_empty());
}

#[tokio::test]
async fn test_permanent_delete_signals_deleted_descendant_listings() {
    let app = helpers::TestApp::new().await;
    let parent = app.folder(None, "Parent").await;
    let child = app.folder(Some(&parent), "Child").await;
    let grandchild = app.folder(Some(&child), "Grandchild").await;
    app.app
        .lifecycle
        .delete(&app.ctx, grandchild.id, false)
        .await
        .unwrap();
    app.app
        .lifecycle
        .delete(&app.ctx, child.id, false)
        .await
        .unwrap();
    app.cache.clear();

    app.app
        .lifecycle
        .delete(&app.ctx, parent.id, true)
        .await
        .unwrap();

    let mut keys = app.cache.keys();
    keys.sort();
    let mut expected = vec![
        format!("PROPFIND/{}", app.project.id),
        format!("PROPFIND/{}/{}", app.project.id, parent.id),
        format!("PROPFIND/{}/{}", app.project.id, child.id),
    ];
    expected.sort();
    assert_eq!(keys, expected);
    assert!(app.memory.find_folder(grandchild.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_move_signals_old_and_new_parent() {
    let app = helpers::TestApp::new().await;
    let from = app.folder(None, "From").await;
    let to = app.folder(None, "To").await;
    let child = app.folder(Some(&from), "Child").await;
    app.cache.clear();

    app.app
        .folders
        .move_folder(&app.ctx, child.id, Some(to.id))
        .await
        .unwrap();

    assert_eq!(
        app.cache.keys(),
        vec![
            format!("PROPFIND/{}/{}", app.project.id, to.id),
            format!("PROPFIND/{}/{}", app.project.id, from.id),
        ]
    );
}
