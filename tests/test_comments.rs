//! Integration tests for page comment threads.

mod common;

use common::*;
use uuid::Uuid;

#[tokio::test]
async fn test_comments_return_in_insertion_order() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_studio().await;
    let project = db.get_or_create_project(&client()).await?;
    let page = db
        .save_page(project.id, 1, &PageContent::default(), &PageDefaults::default())
        .await?;

    // Added back to back, so timestamps may collide; insertion order must
    // still hold.
    for body in ["first", "second", "third"] {
        db.add_comment(
            page.id,
            &NewComment {
                author: &client(),
                body: body.to_string(),
                action_type: ActionType::Comment,
            },
        )
        .await?;
    }

    let comments = db.get_comments(page.id).await?;
    let bodies: Vec<&str> = comments.iter().map(|c| c.body.as_str()).collect();
    assert_eq!(bodies, vec!["first", "second", "third"]);

    Ok(())
}

#[tokio::test]
async fn test_comment_is_visible_immediately_with_author_fields() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_studio().await;
    let project = db.get_or_create_project(&client()).await?;
    let page = db
        .save_page(project.id, 1, &PageContent::default(), &PageDefaults::default())
        .await?;

    let created = db
        .add_comment(
            page.id,
            &NewComment {
                author: &employee(),
                body: "Please adjust the heading".to_string(),
                action_type: ActionType::Comment,
            },
        )
        .await?;

    let comments = db.get_comments(page.id).await?;
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].id, created.id);
    assert_eq!(comments[0].added_by, "u-employee");
    assert_eq!(comments[0].author_name, "Dev Patel");
    assert_eq!(comments[0].author_role, Role::Employee);
    assert_eq!(comments[0].action_type, ActionType::Comment);
    assert!(!comments[0].marked_done);

    Ok(())
}

#[tokio::test]
async fn test_mark_done_is_idempotent() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_studio().await;
    let project = db.get_or_create_project(&client()).await?;
    let page = db
        .save_page(project.id, 1, &PageContent::default(), &PageDefaults::default())
        .await?;
    let comment = db
        .add_comment(
            page.id,
            &NewComment {
                author: &client(),
                body: "fix this".to_string(),
                action_type: ActionType::Comment,
            },
        )
        .await?;

    for _ in 0..3 {
        db.mark_done(comment.id).await?;
        let comments = db.get_comments(page.id).await?;
        assert_eq!(comments.len(), 1);
        assert!(comments[0].marked_done);
    }

    Ok(())
}

#[tokio::test]
async fn test_mark_done_leaves_body_untouched() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_studio().await;
    let project = db.get_or_create_project(&client()).await?;
    let page = db
        .save_page(project.id, 1, &PageContent::default(), &PageDefaults::default())
        .await?;
    let comment = db
        .add_comment(
            page.id,
            &NewComment {
                author: &client(),
                body: "original text".to_string(),
                action_type: ActionType::Comment,
            },
        )
        .await?;

    db.mark_done(comment.id).await?;

    let comments = db.get_comments(page.id).await?;
    assert_eq!(comments[0].body, "original text");
    assert_eq!(comments[0].created_at, comment.created_at);

    Ok(())
}

#[tokio::test]
async fn test_empty_comment_body_is_permitted() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_studio().await;
    let project = db.get_or_create_project(&client()).await?;
    let page = db
        .save_page(project.id, 1, &PageContent::default(), &PageDefaults::default())
        .await?;

    db.add_comment(
        page.id,
        &NewComment {
            author: &client(),
            body: String::new(),
            action_type: ActionType::Comment,
        },
    )
    .await?;

    assert_eq!(db.get_comments(page.id).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_comment_on_nonexistent_page_is_rejected() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_studio().await;

    let result = db
        .add_comment(
            Uuid::new_v4(),
            &NewComment {
                author: &client(),
                body: "orphan".to_string(),
                action_type: ActionType::Comment,
            },
        )
        .await;
    assert!(result.is_err());

    Ok(())
}

#[tokio::test]
async fn test_comments_of_unknown_page_read_empty() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_studio().await;

    assert!(db.get_comments(Uuid::new_v4()).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_mark_done_on_unknown_comment_is_noop() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_studio().await;

    db.mark_done(Uuid::new_v4()).await?;

    Ok(())
}
