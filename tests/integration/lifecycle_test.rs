//! Integration tests for delete, restore, and locks.

mod helpers;

use dms_core::error::ErrorKind;
use dms_core::types::UserId;
use dms_database::EntityStore;
use dms_entity::DeletedState;
use dms_entity::link::LinkTarget;
use dms_service::{DeleteOutcome, RequestContext};

#[tokio::test]
async fn test_soft_delete_and_restore() {
    let app = helpers::TestApp::new().await;
    let a = app.folder(None, "A").await;
    let lifecycle = &app.app.lifecycle;

    lifecycle.delete(&app.ctx, a.id, false).await.unwrap();
    let deleted = app.reload(&a).await;
    assert!(deleted.is_deleted());
    assert!(
        app.app
            .folders
            .list_children(app.project.id, None)
            .await
            .unwrap()
            .is_empty()
    );

    let restored = lifecycle.restore(&app.ctx, a.id).await.unwrap();
    assert!(restored.is_active());
    assert_eq!(restored.title, "A");
}

#[tokio::test]
async fn test_restore_needs_active_parent() {
    let app = helpers::TestApp::new().await;
    let a = app.folder(None, "A").await;
    let b = app.folder(Some(&a), "B").await;
    let lifecycle = &app.app.lifecycle;

    lifecycle.delete(&app.ctx, b.id, false).await.unwrap();
    lifecycle.delete(&app.ctx, a.id, false).await.unwrap();

    let err = lifecycle.restore(&app.ctx, b.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidParent);
    assert!(app.reload(&b).await.is_deleted());
}

#[tokio::test]
async fn test_delete_refuses_non_empty_folder() {
    let app = helpers::TestApp::new().await;
    let a = app.folder(None, "A").await;
    app.folder(Some(&a), "B").await;

    for permanent in [false, true] {
        let err = app
            .app
            .lifecycle
            .delete(&app.ctx, a.id, permanent)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotEmpty);
        assert!(app.reload(&a).await.is_active());
    }
}

#[tokio::test]
async fn test_locked_folder_cannot_be_deleted() {
    let app = helpers::TestApp::new().await;
    let a = app.folder(None, "A").await;
    let b = app.folder(Some(&a), "B").await;
    let lock = app.app.locks.lock_folder(&app.ctx, a.id, None).await.unwrap();

    let err = app
        .app
        .lifecycle
        .delete(&app.ctx, b.id, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Locked);

    app.app.locks.unlock(&app.ctx, lock.id).await.unwrap();
    app.app.lifecycle.delete(&app.ctx, b.id, false).await.unwrap();
}

#[tokio::test]
async fn test_only_holder_or_admin_unlocks() {
    let app = helpers::TestApp::new().await;
    let a = app.folder(None, "A").await;
    let lock = app.app.locks.lock_folder(&app.ctx, a.id, None).await.unwrap();

    let stranger = RequestContext::member(UserId::new());
    let err = app.app.locks.unlock(&stranger, lock.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let admin = RequestContext::admin(UserId::new());
    app.app.locks.unlock(&admin, lock.id).await.unwrap();
    assert!(!app.app.locks.is_locked(&a).await.unwrap());
}

#[tokio::test]
async fn test_permanent_delete_removes_subtree() {
    let app = helpers::TestApp::new().await;
    let a = app.folder(None, "A").await;
    let b = app.folder(Some(&a), "B").await;
    app.file(&b, "old.pdf", 4).await;
    let elsewhere = app.folder(None, "Elsewhere").await;
    app.link(&elsewhere, LinkTarget::Folder(b.id), "to b").await;

    // Hide the only child so A counts as empty.
    let mut hidden = b.clone();
    hidden.deleted = DeletedState::Deleted;
    app.app.store.update_folder(&hidden).await.unwrap();

    let outcome = app.app.lifecycle.delete(&app.ctx, a.id, true).await.unwrap();
    let DeleteOutcome::Destroyed { summary } = outcome else {
        panic!("expected a destroy");
    };
    assert_eq!(summary.folders, 2);
    assert_eq!(summary.files, 1);
    assert_eq!(summary.links, 1);
    assert!(app.app.folders.get_folder(a.id).await.is_err());
    assert!(app.app.folders.get_folder(b.id).await.is_err());
    assert_eq!(app.memory.link_count().await, 0);
}
