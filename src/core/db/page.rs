use std::future::Future;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::core::db::approval::ApprovalStatus;

/// Content bag of a single brochure page. Which fields a page actually uses
/// depends on its page number (page 1 carries the project details, page 2 the
/// company information, later pages free-form heading/body content); unused
/// fields simply stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    pub text_content: Option<String>,
    pub project_name: Option<String>,
    pub description: Option<String>,
    pub company_name: Option<String>,
    pub about_us: Option<String>,
    pub email: Option<String>,
    pub heading: Option<String>,
    pub body_content: Option<String>,
    /// Opaque attachment references, in display order. The underlying bytes
    /// are owned by the attachment store, not by the page.
    pub images: Vec<String>,
}

/// One numbered unit of content within a brochure project.
/// (project_id, page_number) is unique within the store.
#[derive(Debug, Clone)]
pub struct BrochurePage {
    pub id: Uuid,
    pub project_id: Uuid,
    pub page_number: i64,
    pub content: PageContent,
    pub approval_status: ApprovalStatus,
    pub is_locked: bool,
    pub locked_by: Option<String>,
    pub locked_by_name: Option<String>,
    pub locked_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub(super) _guard: (),
}

/// Initial approval/lock values applied when save_page creates a page.
/// Ignored when the page already exists: updates replace content only and
/// preserve the stored approval and lock fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageDefaults {
    pub approval_status: Option<ApprovalStatus>,
    pub is_locked: Option<bool>,
}

pub trait PageRepository {
    /// Upserts by (project_id, page_number): replaces content and bumps
    /// updated_at if the page exists, otherwise creates it (approval_status
    /// defaults to Pending, is_locked to false unless overridden by
    /// `defaults`). Pages are never required to be contiguous.
    fn save_page(
        &self,
        project_id: Uuid,
        page_number: i64,
        content: &PageContent,
        defaults: &PageDefaults,
    ) -> impl Future<Output = anyhow::Result<BrochurePage>>;
    /// All pages of the project, ascending by page_number. Recomputed on
    /// every call; an unknown project id yields an empty list.
    fn get_pages(&self, project_id: Uuid) -> impl Future<Output = anyhow::Result<Vec<BrochurePage>>>;
    fn get_page(
        &self,
        project_id: Uuid,
        page_number: i64,
    ) -> impl Future<Output = anyhow::Result<Option<BrochurePage>>>;
    fn get_page_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = anyhow::Result<Option<BrochurePage>>>;
    /// Highest page_number present, or 1 if the project has no pages yet.
    fn total_pages(&self, project_id: Uuid) -> impl Future<Output = anyhow::Result<i64>>;
}
