use std::future::Future;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::core::db::model::{Role, UserRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    /// An ordinary reader-authored comment.
    Comment,
    /// A system-composed record of an approval decision.
    Approval,
}

/// Append-only page comment. Immutable once created except for the
/// marked_done flag.
#[derive(Debug, Clone)]
pub struct PageComment {
    pub id: Uuid,
    pub page_id: Uuid,
    pub added_by: String,
    pub author_name: String,
    pub author_role: Role,
    pub body: String,
    pub marked_done: bool,
    pub action_type: ActionType,
    pub created_at: OffsetDateTime,
    pub(super) _guard: (),
}

#[derive(Debug, Clone)]
pub struct NewComment<'a> {
    pub author: &'a UserRef,
    pub body: String,
    pub action_type: ActionType,
}

pub trait CommentRepository {
    /// Appends an immutable comment with a store-assigned id and the current
    /// timestamp; it is visible to reads as soon as this returns. Empty
    /// bodies are permitted. The page must exist.
    fn add_comment(
        &self,
        page_id: Uuid,
        comment: &NewComment<'_>,
    ) -> impl Future<Output = anyhow::Result<PageComment>>;
    /// All comments of the page, ascending by timestamp with insertion order
    /// as the tiebreak for equal timestamps.
    fn get_comments(
        &self,
        page_id: Uuid,
    ) -> impl Future<Output = anyhow::Result<Vec<PageComment>>>;
    /// Flips marked_done to true. Idempotent; unknown ids are a no-op.
    fn mark_done(&self, comment_id: Uuid) -> impl Future<Output = anyhow::Result<()>>;
}

impl TryFrom<i64> for ActionType {
    type Error = anyhow::Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ActionType::Comment),
            1 => Ok(ActionType::Approval),
            _ => Err(anyhow::anyhow!("Invalid ActionType value: {}", value)),
        }
    }
}

impl From<ActionType> for i64 {
    fn from(action_type: ActionType) -> Self {
        match action_type {
            ActionType::Comment => 0,
            ActionType::Approval => 1,
        }
    }
}
