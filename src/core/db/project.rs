use std::future::Future;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::core::db::model::UserRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStatus {
    Draft,
    ReadyForDesign,
    InDesign,
    Completed,
}

/// One client's multi-page brochure document collaboration unit.
#[derive(Debug, Clone)]
pub struct BrochureProject {
    pub id: Uuid,
    pub client_id: String,
    pub client_name: String,
    pub status: ProjectStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub(super) _guard: (),
}

pub trait ProjectRepository {
    /// Returns the client's existing brochure project, or creates a new draft
    /// one. A client owns at most one brochure project.
    fn get_or_create_project(
        &self,
        client: &UserRef,
    ) -> impl Future<Output = anyhow::Result<BrochureProject>>;
    fn get_project_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = anyhow::Result<Option<BrochureProject>>>;
    fn get_projects(&self) -> impl Future<Output = anyhow::Result<Vec<BrochureProject>>>;
    /// Projects whose status is ReadyForDesign or InDesign.
    fn get_projects_for_review(
        &self,
    ) -> impl Future<Output = anyhow::Result<Vec<BrochureProject>>>;
    fn update_project_status(
        &self,
        id: Uuid,
        status: ProjectStatus,
    ) -> impl Future<Output = anyhow::Result<()>>;
}

impl TryFrom<i64> for ProjectStatus {
    type Error = anyhow::Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ProjectStatus::Draft),
            1 => Ok(ProjectStatus::ReadyForDesign),
            2 => Ok(ProjectStatus::InDesign),
            3 => Ok(ProjectStatus::Completed),
            _ => Err(anyhow::anyhow!("Invalid ProjectStatus value: {}", value)),
        }
    }
}

impl From<ProjectStatus> for i64 {
    fn from(status: ProjectStatus) -> Self {
        match status {
            ProjectStatus::Draft => 0,
            ProjectStatus::ReadyForDesign => 1,
            ProjectStatus::InDesign => 2,
            ProjectStatus::Completed => 3,
        }
    }
}
