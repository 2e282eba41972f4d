//! Integration tests for page locking and the derived editability rule.

mod common;

use common::*;

#[tokio::test]
async fn test_lock_then_unlock_restores_unlocked_state() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_studio().await;
    let project = db.get_or_create_project(&client()).await?;
    let page = db
        .save_page(project.id, 1, &project_details_page(Some("p"), None, None), &PageDefaults::default())
        .await?;

    db.lock_page(page.id, &manager()).await?;
    let locked = db.get_page_by_id(page.id).await?.expect("page should exist");
    assert!(locked.is_locked);
    assert_eq!(locked.locked_by.as_deref(), Some("u-manager"));
    assert_eq!(locked.locked_by_name.as_deref(), Some("Meera Joshi"));
    assert!(locked.locked_at.is_some());

    db.unlock_page(page.id).await?;
    let unlocked = db.get_page_by_id(page.id).await?.expect("page should exist");
    assert!(!unlocked.is_locked);
    assert!(unlocked.locked_by.is_none());
    assert!(unlocked.locked_by_name.is_none());
    assert!(unlocked.locked_at.is_none());

    Ok(())
}

#[tokio::test]
async fn test_lock_only_affects_named_page() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_studio().await;
    let project = db.get_or_create_project(&client()).await?;
    let first = db
        .save_page(project.id, 1, &PageContent::default(), &PageDefaults::default())
        .await?;
    let second = db
        .save_page(project.id, 2, &PageContent::default(), &PageDefaults::default())
        .await?;

    db.lock_page(first.id, &employee()).await?;

    assert!(db.get_page_by_id(first.id).await?.unwrap().is_locked);
    assert!(!db.get_page_by_id(second.id).await?.unwrap().is_locked);

    Ok(())
}

#[tokio::test]
async fn test_editability_is_role_and_lock_dependent() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_studio().await;
    let project = db.get_or_create_project(&client()).await?;
    let page = db
        .save_page(project.id, 1, &PageContent::default(), &PageDefaults::default())
        .await?;
    db.lock_page(page.id, &manager()).await?;
    let page = db.get_page_by_id(page.id).await?.expect("page should exist");

    assert!(!is_page_editable(Role::Client, &page));
    assert!(is_page_editable(Role::Manager, &page));
    assert!(is_page_editable(Role::Employee, &page));

    db.unlock_page(page.id).await?;
    let page = db.get_page_by_id(page.id).await?.expect("page should exist");
    assert!(is_page_editable(Role::Client, &page));

    Ok(())
}

#[tokio::test]
async fn test_client_edit_rejected_on_locked_page_but_manager_succeeds() -> anyhow::Result<()> {
    let (mut workspace, _temp_dir) = open_test_workspace(Some(client())).await;
    let project = workspace.get_or_create_project(&client()).await?;
    let page = workspace
        .save_page(project.id, 3, &text_page("h", "b"))
        .await?;

    workspace.sign_in(manager());
    workspace.lock_page(page.id).await?;

    workspace.sign_in(client());
    let edit = text_page("client edit", "should not land");
    let result = workspace.save_page(project.id, 3, &edit).await;
    assert!(matches!(result, Err(WorkflowError::PageLocked)));

    // The identical edit from a manager succeeds despite the lock.
    workspace.sign_in(manager());
    let saved = workspace.save_page(project.id, 3, &edit).await?;
    assert_eq!(saved.content.heading.as_deref(), Some("client edit"));
    assert!(saved.is_locked);

    Ok(())
}

#[tokio::test]
async fn test_lock_without_user_is_silent_noop() -> anyhow::Result<()> {
    let (mut workspace, _temp_dir) = open_test_workspace(Some(client())).await;
    let project = workspace.get_or_create_project(&client()).await?;
    let page = workspace
        .save_page(project.id, 1, &PageContent::default())
        .await?;

    workspace.sign_out();
    workspace.lock_page(page.id).await?;

    let page = workspace
        .get_page(project.id, 1)
        .await?
        .expect("page should exist");
    assert!(!page.is_locked);

    Ok(())
}

#[tokio::test]
async fn test_client_may_not_lock_or_unlock() -> anyhow::Result<()> {
    let (mut workspace, _temp_dir) = open_test_workspace(Some(client())).await;
    let project = workspace.get_or_create_project(&client()).await?;
    let page = workspace
        .save_page(project.id, 1, &PageContent::default())
        .await?;

    assert!(matches!(
        workspace.lock_page(page.id).await,
        Err(WorkflowError::NotAuthorized)
    ));

    workspace.sign_in(manager());
    workspace.lock_page(page.id).await?;
    workspace.sign_in(client());
    assert!(matches!(
        workspace.unlock_page(page.id).await,
        Err(WorkflowError::NotAuthorized)
    ));

    Ok(())
}

#[tokio::test]
async fn test_lock_unknown_page_is_noop() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_studio().await;

    db.lock_page(uuid::Uuid::new_v4(), &manager()).await?;
    db.unlock_page(uuid::Uuid::new_v4()).await?;

    Ok(())
}
