mod approval;
mod comment;
mod lock;
mod model;
mod page;
mod project;
mod state;

use std::{collections::HashMap, path::Path, path::PathBuf, sync::Arc};

use anyhow::Context;
use sqlx::{Connection, Row, sqlite::SqliteRow};
use state::StudioState;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

pub use approval::{ApprovalRepository, ApprovalStatus};
pub use comment::{ActionType, CommentRepository, NewComment, PageComment};
pub use lock::LockRepository;
pub use model::{Role, UserRef};
pub use page::{BrochurePage, PageContent, PageDefaults, PageRepository};
pub use project::{BrochureProject, ProjectRepository, ProjectStatus};

/// Attachments larger than this are refused before they reach the store.
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

const PAGE_COLUMNS: &str = "id, project_id, page_number, text_content, project_name, \
     description, company_name, about_us, email, heading, body_content, \
     approval_status, is_locked, locked_by, locked_by_name, locked_at, \
     created_at, updated_at";

const PROJECT_COLUMNS: &str = "id, client_id, client_name, status, created_at, updated_at";

const COMMENT_COLUMNS: &str =
    "id, page_id, added_by, author_name, author_role, body, marked_done, action_type, created_at";

/// Durable brochure store backed by a single studio file. Cheap to clone;
/// clones share the same open working directory and connection pool.
#[derive(Debug, Clone)]
pub struct StudioDb {
    state: Arc<StudioState>,
}

impl StudioDb {
    pub async fn new<P: AsRef<Path>>(studio_file: P) -> anyhow::Result<Self> {
        Ok(Self {
            state: Arc::new(StudioState::new(studio_file).await?),
        })
    }

    /// Explicitly checkpoint and re-pack the studio file.
    /// This is required when dropping in an async context (e.g., tests with
    /// #[tokio::test]).
    pub async fn save_studio(&self) -> anyhow::Result<()> {
        self.state.save_studio().await
    }

    /// Take a copy of an external file into the attachment store, returning
    /// the opaque reference to put into a page's image list. Size gating
    /// happens in the workflow layer, not here.
    pub async fn store_attachment<P: AsRef<Path>>(&self, source: P) -> anyhow::Result<String> {
        self.state.store_attachment(source).await
    }

    /// Resolve an attachment reference to its path in the open working
    /// directory.
    pub fn attachment_path(&self, reference: &str) -> PathBuf {
        self.state.attachment_path(reference)
    }
}

impl ProjectRepository for StudioDb {
    async fn get_or_create_project(&self, client: &UserRef) -> anyhow::Result<BrochureProject> {
        let mut conn = self.state.conn().await?;
        let existing = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM brochure_project \
             WHERE client_id = $1 ORDER BY created_at ASC LIMIT 1"
        ))
        .bind(&client.id)
        .fetch_optional(&mut **conn)
        .await?;
        if let Some(row) = existing {
            return project_from_row(&row);
        }

        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let now_str = format_ts(now)?;
        sqlx::query(
            "INSERT INTO brochure_project (id, client_id, client_name, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5)",
        )
        .bind(id.to_string())
        .bind(&client.id)
        .bind(&client.name)
        .bind(i64::from(ProjectStatus::Draft))
        .bind(&now_str)
        .execute(&mut **conn)
        .await?;
        Ok(BrochureProject {
            id,
            client_id: client.id.clone(),
            client_name: client.name.clone(),
            status: ProjectStatus::Draft,
            created_at: now,
            updated_at: now,
            _guard: (),
        })
    }

    async fn get_project_by_id(&self, id: Uuid) -> anyhow::Result<Option<BrochureProject>> {
        let mut conn = self.state.conn().await?;
        let row = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM brochure_project WHERE id = $1"
        ))
        .bind(id.to_string())
        .fetch_optional(&mut **conn)
        .await?;
        row.map(|row| project_from_row(&row)).transpose()
    }

    async fn get_projects(&self) -> anyhow::Result<Vec<BrochureProject>> {
        let mut conn = self.state.conn().await?;
        sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM brochure_project ORDER BY created_at ASC"
        ))
        .fetch_all(&mut **conn)
        .await?
        .iter()
        .map(project_from_row)
        .collect()
    }

    async fn get_projects_for_review(&self) -> anyhow::Result<Vec<BrochureProject>> {
        let mut conn = self.state.conn().await?;
        sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM brochure_project \
             WHERE status IN ($1, $2) ORDER BY created_at ASC"
        ))
        .bind(i64::from(ProjectStatus::ReadyForDesign))
        .bind(i64::from(ProjectStatus::InDesign))
        .fetch_all(&mut **conn)
        .await?
        .iter()
        .map(project_from_row)
        .collect()
    }

    async fn update_project_status(&self, id: Uuid, status: ProjectStatus) -> anyhow::Result<()> {
        let mut conn = self.state.conn().await?;
        sqlx::query("UPDATE brochure_project SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(i64::from(status))
            .bind(format_ts(OffsetDateTime::now_utc())?)
            .bind(id.to_string())
            .execute(&mut **conn)
            .await?;
        Ok(())
    }
}

impl PageRepository for StudioDb {
    async fn save_page(
        &self,
        project_id: Uuid,
        page_number: i64,
        content: &PageContent,
        defaults: &PageDefaults,
    ) -> anyhow::Result<BrochurePage> {
        let now_str = format_ts(OffsetDateTime::now_utc())?;
        let mut conn = self.state.conn().await?;
        let mut tx = conn.begin().await?;

        let existing: Option<String> =
            sqlx::query("SELECT id FROM brochure_page WHERE project_id = $1 AND page_number = $2")
                .bind(project_id.to_string())
                .bind(page_number)
                .fetch_optional(&mut *tx)
                .await?
                .map(|row| row.try_get("id"))
                .transpose()?;

        let page_id = match existing {
            Some(id) => {
                // Replace content only; approval and lock fields are
                // preserved across saves.
                sqlx::query(
                    "UPDATE brochure_page SET \
                        text_content = $1, project_name = $2, description = $3, \
                        company_name = $4, about_us = $5, email = $6, \
                        heading = $7, body_content = $8, updated_at = $9 \
                     WHERE id = $10",
                )
                .bind(&content.text_content)
                .bind(&content.project_name)
                .bind(&content.description)
                .bind(&content.company_name)
                .bind(&content.about_us)
                .bind(&content.email)
                .bind(&content.heading)
                .bind(&content.body_content)
                .bind(&now_str)
                .bind(&id)
                .execute(&mut *tx)
                .await?;
                id
            }
            None => {
                let id = Uuid::new_v4().to_string();
                let approval =
                    i64::from(defaults.approval_status.unwrap_or(ApprovalStatus::Pending));
                let is_locked = defaults.is_locked.unwrap_or(false) as i64;
                sqlx::query(
                    "INSERT INTO brochure_page \
                        (id, project_id, page_number, text_content, project_name, description, \
                         company_name, about_us, email, heading, body_content, \
                         approval_status, is_locked, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)",
                )
                .bind(&id)
                .bind(project_id.to_string())
                .bind(page_number)
                .bind(&content.text_content)
                .bind(&content.project_name)
                .bind(&content.description)
                .bind(&content.company_name)
                .bind(&content.about_us)
                .bind(&content.email)
                .bind(&content.heading)
                .bind(&content.body_content)
                .bind(approval)
                .bind(is_locked)
                .bind(&now_str)
                .execute(&mut *tx)
                .await?;
                id
            }
        };

        // Replace the ordered image reference list wholesale.
        sqlx::query("DELETE FROM page_image WHERE page_id = $1")
            .bind(&page_id)
            .execute(&mut *tx)
            .await?;
        for (position, reference) in content.images.iter().enumerate() {
            sqlx::query(
                "INSERT INTO page_image (page_id, position, attachment_ref) VALUES ($1, $2, $3)",
            )
            .bind(&page_id)
            .bind(position as i64)
            .bind(reference)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        drop(conn);

        self.get_page_by_id(parse_uuid(&page_id)?)
            .await?
            .context("page row missing immediately after save")
    }

    async fn get_pages(&self, project_id: Uuid) -> anyhow::Result<Vec<BrochurePage>> {
        let mut conn = self.state.conn().await?;
        let rows = sqlx::query(&format!(
            "SELECT {PAGE_COLUMNS} FROM brochure_page \
             WHERE project_id = $1 ORDER BY page_number ASC"
        ))
        .bind(project_id.to_string())
        .fetch_all(&mut **conn)
        .await?;

        let image_rows = sqlx::query(
            "SELECT pi.page_id, pi.attachment_ref FROM page_image pi \
             JOIN brochure_page p ON pi.page_id = p.id \
             WHERE p.project_id = $1 \
             ORDER BY pi.page_id ASC, pi.position ASC",
        )
        .bind(project_id.to_string())
        .fetch_all(&mut **conn)
        .await?;
        let mut images: HashMap<String, Vec<String>> = HashMap::new();
        for row in image_rows {
            let page_id: String = row.try_get("page_id")?;
            let reference: String = row.try_get("attachment_ref")?;
            images.entry(page_id).or_default().push(reference);
        }

        rows.into_iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                let page_images = images.remove(&id).unwrap_or_default();
                page_from_row(&row, page_images)
            })
            .collect()
    }

    async fn get_page(
        &self,
        project_id: Uuid,
        page_number: i64,
    ) -> anyhow::Result<Option<BrochurePage>> {
        let mut conn = self.state.conn().await?;
        let row = sqlx::query(&format!(
            "SELECT {PAGE_COLUMNS} FROM brochure_page \
             WHERE project_id = $1 AND page_number = $2"
        ))
        .bind(project_id.to_string())
        .bind(page_number)
        .fetch_optional(&mut **conn)
        .await?;
        let Some(row) = row else { return Ok(None) };
        let id: String = row.try_get("id")?;
        let images = load_page_images(&mut conn, &id).await?;
        Ok(Some(page_from_row(&row, images)?))
    }

    async fn get_page_by_id(&self, id: Uuid) -> anyhow::Result<Option<BrochurePage>> {
        let mut conn = self.state.conn().await?;
        let row = sqlx::query(&format!(
            "SELECT {PAGE_COLUMNS} FROM brochure_page WHERE id = $1"
        ))
        .bind(id.to_string())
        .fetch_optional(&mut **conn)
        .await?;
        let Some(row) = row else { return Ok(None) };
        let images = load_page_images(&mut conn, &id.to_string()).await?;
        Ok(Some(page_from_row(&row, images)?))
    }

    async fn total_pages(&self, project_id: Uuid) -> anyhow::Result<i64> {
        let mut conn = self.state.conn().await?;
        let row = sqlx::query(
            "SELECT COALESCE(MAX(page_number), 1) AS total FROM brochure_page \
             WHERE project_id = $1",
        )
        .bind(project_id.to_string())
        .fetch_one(&mut **conn)
        .await?;
        Ok(row.try_get("total")?)
    }
}

impl LockRepository for StudioDb {
    async fn lock_page(&self, page_id: Uuid, user: &UserRef) -> anyhow::Result<()> {
        let now_str = format_ts(OffsetDateTime::now_utc())?;
        let mut conn = self.state.conn().await?;
        sqlx::query(
            "UPDATE brochure_page SET \
                is_locked = 1, locked_by = $1, locked_by_name = $2, \
                locked_at = $3, updated_at = $3 \
             WHERE id = $4",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&now_str)
        .bind(page_id.to_string())
        .execute(&mut **conn)
        .await?;
        Ok(())
    }

    async fn unlock_page(&self, page_id: Uuid) -> anyhow::Result<()> {
        let now_str = format_ts(OffsetDateTime::now_utc())?;
        let mut conn = self.state.conn().await?;
        sqlx::query(
            "UPDATE brochure_page SET \
                is_locked = 0, locked_by = NULL, locked_by_name = NULL, \
                locked_at = NULL, updated_at = $1 \
             WHERE id = $2",
        )
        .bind(&now_str)
        .bind(page_id.to_string())
        .execute(&mut **conn)
        .await?;
        Ok(())
    }
}

impl CommentRepository for StudioDb {
    async fn add_comment(
        &self,
        page_id: Uuid,
        comment: &NewComment<'_>,
    ) -> anyhow::Result<PageComment> {
        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let mut conn = self.state.conn().await?;
        sqlx::query(
            "INSERT INTO page_comment \
                (id, page_id, added_by, author_name, author_role, body, \
                 marked_done, action_type, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $8)",
        )
        .bind(id.to_string())
        .bind(page_id.to_string())
        .bind(&comment.author.id)
        .bind(&comment.author.name)
        .bind(i64::from(comment.author.role))
        .bind(&comment.body)
        .bind(i64::from(comment.action_type))
        .bind(format_ts(now)?)
        .execute(&mut **conn)
        .await?;
        Ok(PageComment {
            id,
            page_id,
            added_by: comment.author.id.clone(),
            author_name: comment.author.name.clone(),
            author_role: comment.author.role,
            body: comment.body.clone(),
            marked_done: false,
            action_type: comment.action_type,
            created_at: now,
            _guard: (),
        })
    }

    async fn get_comments(&self, page_id: Uuid) -> anyhow::Result<Vec<PageComment>> {
        let mut conn = self.state.conn().await?;
        sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM page_comment \
             WHERE page_id = $1 ORDER BY created_at ASC, seq ASC"
        ))
        .bind(page_id.to_string())
        .fetch_all(&mut **conn)
        .await?
        .iter()
        .map(comment_from_row)
        .collect()
    }

    async fn mark_done(&self, comment_id: Uuid) -> anyhow::Result<()> {
        let mut conn = self.state.conn().await?;
        sqlx::query("UPDATE page_comment SET marked_done = 1 WHERE id = $1")
            .bind(comment_id.to_string())
            .execute(&mut **conn)
            .await?;
        Ok(())
    }
}

impl ApprovalRepository for StudioDb {
    async fn set_approval(&self, page_id: Uuid, status: ApprovalStatus) -> anyhow::Result<()> {
        let mut conn = self.state.conn().await?;
        sqlx::query("UPDATE brochure_page SET approval_status = $1, updated_at = $2 WHERE id = $3")
            .bind(i64::from(status))
            .bind(format_ts(OffsetDateTime::now_utc())?)
            .bind(page_id.to_string())
            .execute(&mut **conn)
            .await?;
        Ok(())
    }
}

impl crate::core::autosave::SaveSink for StudioDb {
    fn persist(
        &self,
        project_id: Uuid,
        page_number: i64,
        content: PageContent,
    ) -> impl Future<Output = anyhow::Result<()>> + Send {
        let db = self.clone();
        async move {
            db.save_page(project_id, page_number, &content, &PageDefaults::default())
                .await?;
            Ok(())
        }
    }
}

async fn load_page_images(
    conn: &mut state::DbConnGuard<'_>,
    page_id: &str,
) -> anyhow::Result<Vec<String>> {
    sqlx::query(
        "SELECT attachment_ref FROM page_image WHERE page_id = $1 ORDER BY position ASC",
    )
    .bind(page_id)
    .fetch_all(&mut ***conn)
    .await?
    .iter()
    .map(|row| Ok(row.try_get("attachment_ref")?))
    .collect()
}

fn project_from_row(row: &SqliteRow) -> anyhow::Result<BrochureProject> {
    let id: String = row.try_get("id")?;
    let status: i64 = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(BrochureProject {
        id: parse_uuid(&id)?,
        client_id: row.try_get("client_id")?,
        client_name: row.try_get("client_name")?,
        status: ProjectStatus::try_from(status)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
        _guard: (),
    })
}

fn page_from_row(row: &SqliteRow, images: Vec<String>) -> anyhow::Result<BrochurePage> {
    let id: String = row.try_get("id")?;
    let project_id: String = row.try_get("project_id")?;
    let approval_status: i64 = row.try_get("approval_status")?;
    let is_locked: i64 = row.try_get("is_locked")?;
    let locked_at: Option<String> = row.try_get("locked_at")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(BrochurePage {
        id: parse_uuid(&id)?,
        project_id: parse_uuid(&project_id)?,
        page_number: row.try_get("page_number")?,
        content: PageContent {
            text_content: row.try_get("text_content")?,
            project_name: row.try_get("project_name")?,
            description: row.try_get("description")?,
            company_name: row.try_get("company_name")?,
            about_us: row.try_get("about_us")?,
            email: row.try_get("email")?,
            heading: row.try_get("heading")?,
            body_content: row.try_get("body_content")?,
            images,
        },
        approval_status: ApprovalStatus::try_from(approval_status)?,
        is_locked: is_locked != 0,
        locked_by: row.try_get("locked_by")?,
        locked_by_name: row.try_get("locked_by_name")?,
        locked_at: locked_at.as_deref().map(parse_ts).transpose()?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
        _guard: (),
    })
}

fn comment_from_row(row: &SqliteRow) -> anyhow::Result<PageComment> {
    let id: String = row.try_get("id")?;
    let page_id: String = row.try_get("page_id")?;
    let author_role: i64 = row.try_get("author_role")?;
    let marked_done: i64 = row.try_get("marked_done")?;
    let action_type: i64 = row.try_get("action_type")?;
    let created_at: String = row.try_get("created_at")?;
    Ok(PageComment {
        id: parse_uuid(&id)?,
        page_id: parse_uuid(&page_id)?,
        added_by: row.try_get("added_by")?,
        author_name: row.try_get("author_name")?,
        author_role: Role::try_from(author_role)?,
        body: row.try_get("body")?,
        marked_done: marked_done != 0,
        action_type: ActionType::try_from(action_type)?,
        created_at: parse_ts(&created_at)?,
        _guard: (),
    })
}

fn format_ts(ts: OffsetDateTime) -> anyhow::Result<String> {
    Ok(ts.format(&Rfc3339)?)
}

fn parse_ts(value: &str) -> anyhow::Result<OffsetDateTime> {
    Ok(OffsetDateTime::parse(value, &Rfc3339)?)
}

fn parse_uuid(value: &str) -> anyhow::Result<Uuid> {
    Ok(Uuid::parse_str(value)?)
}
