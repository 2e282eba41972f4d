//! The operation surface the rest of the application calls. Holds the store,
//! the autosave coordinator and the (optional) authenticated user, and
//! applies the access policy uniformly before any mutation reaches the
//! store.

use std::path::Path;

use anyhow::Context;
use thiserror::Error;
use uuid::Uuid;

use crate::core::{
    access,
    autosave::AutosaveCoordinator,
    db::{
        ActionType, ApprovalRepository, ApprovalStatus, BrochurePage, BrochureProject,
        CommentRepository, LockRepository, MAX_ATTACHMENT_BYTES, NewComment, PageComment,
        PageContent, PageDefaults, PageRepository, ProjectRepository, ProjectStatus, Role,
        StudioDb, UserRef,
    },
    progress,
};

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The acting user's role does not grant this operation.
    #[error("operation not permitted for this role")]
    NotAuthorized,
    /// A client tried to edit a page a reviewer has locked.
    #[error("page is locked for client edits")]
    PageLocked,
    #[error("attachment is {size} bytes, limit is {limit}")]
    AttachmentTooLarge { size: u64, limit: u64 },
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// One open brochure studio file plus a session. Mutations are gated on the
/// session user's role; reads never are.
pub struct BrochureWorkspace {
    db: StudioDb,
    autosave: AutosaveCoordinator<StudioDb>,
    user: Option<UserRef>,
}

impl BrochureWorkspace {
    /// Open (or create) a studio file. `user` is the authenticated-user
    /// descriptor from the host's session provider; pass None for an
    /// unauthenticated session.
    pub async fn open<P: AsRef<Path>>(
        studio_file: P,
        user: Option<UserRef>,
    ) -> anyhow::Result<Self> {
        let db = StudioDb::new(studio_file).await?;
        let autosave = AutosaveCoordinator::new(db.clone());
        Ok(Self { db, autosave, user })
    }

    pub fn db(&self) -> &StudioDb {
        &self.db
    }

    pub fn user(&self) -> Option<&UserRef> {
        self.user.as_ref()
    }

    pub fn sign_in(&mut self, user: UserRef) {
        self.user = Some(user);
    }

    pub fn sign_out(&mut self) {
        self.user = None;
    }

    /// Checkpoint and re-pack the studio file.
    pub async fn save_studio(&self) -> Result<(), WorkflowError> {
        Ok(self.db.save_studio().await?)
    }

    pub async fn get_or_create_project(
        &self,
        client: &UserRef,
    ) -> Result<BrochureProject, WorkflowError> {
        Ok(self.db.get_or_create_project(client).await?)
    }

    pub async fn get_project(&self, id: Uuid) -> Result<Option<BrochureProject>, WorkflowError> {
        Ok(self.db.get_project_by_id(id).await?)
    }

    pub async fn get_projects_for_review(&self) -> Result<Vec<BrochureProject>, WorkflowError> {
        Ok(self.db.get_projects_for_review().await?)
    }

    /// Client hand-off: the draft is ready for the design team.
    pub async fn submit_for_design(&self, project_id: Uuid) -> Result<(), WorkflowError> {
        if self.user.is_none() {
            return Err(WorkflowError::NotAuthorized);
        }
        Ok(self
            .db
            .update_project_status(project_id, ProjectStatus::ReadyForDesign)
            .await?)
    }

    /// Reviewer-driven lifecycle moves (in_design, completed, ...).
    pub async fn update_project_status(
        &self,
        project_id: Uuid,
        status: ProjectStatus,
    ) -> Result<(), WorkflowError> {
        let Some(user) = &self.user else {
            return Err(WorkflowError::NotAuthorized);
        };
        if !access::can_review(user.role) {
            return Err(WorkflowError::NotAuthorized);
        }
        Ok(self.db.update_project_status(project_id, status).await?)
    }

    /// Immediate save of a page's content, subject to the editability rule.
    pub async fn save_page(
        &self,
        project_id: Uuid,
        page_number: i64,
        content: &PageContent,
    ) -> Result<BrochurePage, WorkflowError> {
        self.ensure_page_editable(project_id, page_number).await?;
        Ok(self
            .db
            .save_page(project_id, page_number, content, &PageDefaults::default())
            .await?)
    }

    /// Debounced save: the content reaches the store once the edit burst for
    /// this page settles for the quiet window. The editability rule is
    /// checked at enqueue time; the lock is a cooperative signal, not a
    /// store-level mutex.
    pub async fn queue_autosave(
        &self,
        project_id: Uuid,
        page_number: i64,
        content: PageContent,
    ) -> Result<(), WorkflowError> {
        self.ensure_page_editable(project_id, page_number).await?;
        self.autosave.update(project_id, page_number, content);
        Ok(())
    }

    pub async fn get_pages(&self, project_id: Uuid) -> Result<Vec<BrochurePage>, WorkflowError> {
        Ok(self.db.get_pages(project_id).await?)
    }

    pub async fn get_page(
        &self,
        project_id: Uuid,
        page_number: i64,
    ) -> Result<Option<BrochurePage>, WorkflowError> {
        Ok(self.db.get_page(project_id, page_number).await?)
    }

    pub async fn total_pages(&self, project_id: Uuid) -> Result<i64, WorkflowError> {
        Ok(self.db.total_pages(project_id).await?)
    }

    /// Reviewer-imposed hold on a page. Silently does nothing without an
    /// authenticated user.
    pub async fn lock_page(&self, page_id: Uuid) -> Result<(), WorkflowError> {
        let Some(user) = &self.user else {
            return Ok(());
        };
        if !access::can_review(user.role) {
            return Err(WorkflowError::NotAuthorized);
        }
        Ok(self.db.lock_page(page_id, user).await?)
    }

    /// Releases a hold. Silently does nothing without an authenticated user.
    pub async fn unlock_page(&self, page_id: Uuid) -> Result<(), WorkflowError> {
        let Some(user) = &self.user else {
            return Ok(());
        };
        if !access::can_review(user.role) {
            return Err(WorkflowError::NotAuthorized);
        }
        Ok(self.db.unlock_page(page_id).await?)
    }

    /// Records the reviewer's verdict. When a comment is supplied, a
    /// system-composed approval action comment is appended; without one only
    /// the status changes. Silently does nothing without an authenticated
    /// user.
    pub async fn set_approval(
        &self,
        page_id: Uuid,
        status: ApprovalStatus,
        comment: Option<&str>,
    ) -> Result<(), WorkflowError> {
        let Some(user) = &self.user else {
            return Ok(());
        };
        if !access::can_review(user.role) {
            return Err(WorkflowError::NotAuthorized);
        }
        self.db.set_approval(page_id, status).await?;
        if let Some(comment) = comment {
            let body = match status {
                ApprovalStatus::Approved => {
                    format!("Page has been approved by {}: {}", user.name, comment)
                }
                _ => format!("Page requires changes - {}: {}", user.name, comment),
            };
            self.db
                .add_comment(
                    page_id,
                    &NewComment {
                        author: user,
                        body,
                        action_type: ActionType::Approval,
                    },
                )
                .await?;
        }
        Ok(())
    }

    /// Appends an ordinary comment authored by the session user.
    pub async fn add_comment(
        &self,
        page_id: Uuid,
        body: &str,
    ) -> Result<PageComment, WorkflowError> {
        let Some(user) = &self.user else {
            return Err(WorkflowError::NotAuthorized);
        };
        Ok(self
            .db
            .add_comment(
                page_id,
                &NewComment {
                    author: user,
                    body: body.to_string(),
                    action_type: ActionType::Comment,
                },
            )
            .await?)
    }

    pub async fn get_comments(&self, page_id: Uuid) -> Result<Vec<PageComment>, WorkflowError> {
        Ok(self.db.get_comments(page_id).await?)
    }

    pub async fn mark_comment_done(&self, comment_id: Uuid) -> Result<(), WorkflowError> {
        Ok(self.db.mark_done(comment_id).await?)
    }

    pub async fn progress(&self, project_id: Uuid) -> Result<u32, WorkflowError> {
        let pages = self.db.get_pages(project_id).await?;
        Ok(progress::completion_percentage(&pages))
    }

    /// Copies a local file into the attachment store and queues the page's
    /// updated image list through the autosave path. Files over the 5 MiB
    /// limit are refused.
    pub async fn attach_image<P: AsRef<Path>>(
        &self,
        project_id: Uuid,
        page_number: i64,
        source: P,
    ) -> Result<String, WorkflowError> {
        self.ensure_page_editable(project_id, page_number).await?;

        let size = tokio::fs::metadata(source.as_ref())
            .await
            .with_context(|| format!("Failed to stat attachment {:?}", source.as_ref()))?
            .len();
        if size > MAX_ATTACHMENT_BYTES {
            return Err(WorkflowError::AttachmentTooLarge {
                size,
                limit: MAX_ATTACHMENT_BYTES,
            });
        }

        let reference = self.db.store_attachment(source).await?;
        let mut content = self
            .db
            .get_page(project_id, page_number)
            .await?
            .map(|page| page.content)
            .unwrap_or_default();
        content.images.push(reference.clone());
        self.autosave.update(project_id, page_number, content);
        Ok(reference)
    }

    /// A reviewer may always edit; a client only when the page is absent or
    /// unlocked. No session means no edits.
    async fn ensure_page_editable(
        &self,
        project_id: Uuid,
        page_number: i64,
    ) -> Result<(), WorkflowError> {
        let Some(user) = &self.user else {
            return Err(WorkflowError::NotAuthorized);
        };
        if user.role != Role::Client {
            return Ok(());
        }
        match self.db.get_page(project_id, page_number).await? {
            Some(page) if !access::is_page_editable(user.role, &page) => {
                Err(WorkflowError::PageLocked)
            }
            _ => Ok(()),
        }
    }
}
