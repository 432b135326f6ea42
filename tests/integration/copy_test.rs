//! Integration tests for deep copies.

mod helpers;

use dms_core::error::ErrorKind;
use dms_core::types::{CustomFieldId, UserId};
use dms_database::EntityStore;
use dms_entity::Visibility;
use dms_entity::custom::CreateCustomValue;
use dms_entity::link::{LinkKind, LinkTarget};
use dms_entity::project::Permission;
use dms_service::RequestContext;

#[tokio::test]
async fn test_copy_reproduces_subtree_for_actor() {
    let app = helpers::TestApp::new().await;
    let src = app.folder(None, "Src").await;
    let sub = app.folder(Some(&src), "Sub").await;
    app.file(&src, "a.pdf", 7).await;
    app.file(&sub, "b.pdf", 3).await;
    app.link(&sub, LinkTarget::Url("https://example.com".into()), "site")
        .await;
    let dest = app.folder(None, "Dest").await;

    let copier = RequestContext::member(UserId::new());
    let report = app
        .app
        .copier
        .copy_to(&copier, src.id, app.project.id, Some(dest.id))
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.folders, 2);
    assert_eq!(report.files, 2);
    assert_eq!(report.links, 1);
    assert_eq!(report.folder.parent_id, Some(dest.id));
    assert_eq!(report.folder.user_id, copier.user_id);
    assert_ne!(report.folder.id, src.id);

    let copied_sub = app
        .app
        .tree
        .find_by_title(app.project.id, Some(report.folder.id), "Sub")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(copied_sub.user_id, copier.user_id);

    let links = app
        .app
        .store
        .folder_links(app.project.id, Some(copied_sub.id), LinkKind::Url, Visibility::Active)
        .await
        .unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].target, LinkTarget::Url("https://example.com".into()));

    let stats = app.app.tree.deep_stats(&report.folder).await.unwrap();
    assert_eq!(stats.size_bytes, 10);
    assert_eq!(app.app.tree.path_str(&copied_sub).await.unwrap(), "Dest/Src/Sub");
}

#[tokio::test]
async fn test_custom_values_are_independent_copies() {
    let app = helpers::TestApp::new().await;
    let src = app.folder(None, "Src").await;
    let field = CustomFieldId::new();
    let original = app
        .app
        .store
        .insert_custom_value(&CreateCustomValue {
            custom_field_id: field,
            folder_id: src.id,
            value: Some("Confidential".to_string()),
        })
        .await
        .unwrap();
    let dest = app.folder(None, "Dest").await;

    let report = app
        .app
        .copier
        .copy_to(&app.ctx, src.id, app.project.id, Some(dest.id))
        .await
        .unwrap();
    assert_eq!(report.custom_values, 1);

    let copied = app.app.folders.custom_values(report.folder.id).await.unwrap();
    assert_eq!(copied.len(), 1);
    assert_ne!(copied[0].id, original.id);
    assert_eq!(copied[0].folder_id, report.folder.id);
    assert_eq!(
        app.app
            .folders
            .custom_value(report.folder.id, field)
            .await
            .unwrap()
            .as_deref(),
        Some("Confidential")
    );
}

#[tokio::test]
async fn test_copy_into_own_subtree_stops() {
    let app = helpers::TestApp::new().await;
    let src = app.folder(None, "Src").await;
    let inner = app.folder(Some(&src), "Inner").await;

    let report = app
        .app
        .copier
        .copy_to(&app.ctx, src.id, app.project.id, Some(inner.id))
        .await
        .unwrap();

    assert_eq!(report.folder.parent_id, Some(inner.id));
    assert_eq!(report.folders, 2);
}

#[tokio::test]
async fn test_copy_root_title_collision() {
    let app = helpers::TestApp::new().await;
    let src = app.folder(None, "Src").await;

    let err = app
        .app
        .copier
        .copy_to(&app.ctx, src.id, app.project.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_copy_targets_follow_roles() {
    let app = helpers::TestApp::new().await;
    let beta = app.create_project("Beta", true).await;
    let gamma = app.create_project("Gamma", true).await;
    let disabled = app.create_project("Delta", false).await;

    let user = UserId::new();
    let both = [Permission::FolderManipulation, Permission::FileManipulation];
    app.add_member(&beta, user, &both).await;
    app.add_member(&gamma, user, &[Permission::FolderManipulation])
        .await;
    app.add_member(&disabled, user, &both).await;

    let targets = app
        .app
        .copier
        .allowed_target_projects(&RequestContext::member(user))
        .await
        .unwrap();
    let names: Vec<&str> = targets.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Beta"]);

    let admin_targets = app
        .app
        .copier
        .allowed_target_projects(&RequestContext::admin(UserId::new()))
        .await
        .unwrap();
    let names: Vec<&str> = admin_targets.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
}

#[tokio::test]
async fn test_copy_to_other_project() {
    let app = helpers::TestApp::new().await;
    let beta = app.create_project("Beta", true).await;
    let src = app.folder(None, "Src").await;
    app.folder(Some(&src), "Sub").await;

    let report = app
        .app
        .copier
        .copy_to(&app.ctx, src.id, beta.id, None)
        .await
        .unwrap();

    assert_eq!(report.folder.project_id, beta.id);
    assert_eq!(report.folder.parent_id, None);
    let roots = app.app.folders.list_children(beta.id, None).await.unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(app.app.tree.deep_folder_count(&roots[0]).await.unwrap(), 1);
}
