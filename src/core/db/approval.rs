use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reviewer's verdict on a page's readiness. Pending is the initial state;
/// approved and rejected may be re-entered freely (a rejected page can later
/// be approved and vice versa, with no transition guard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

pub trait ApprovalRepository {
    /// Updates the page's approval status. Approval and lock state are
    /// independent axes; this never touches the lock fields. Unknown page
    /// ids are a no-op.
    fn set_approval(
        &self,
        page_id: Uuid,
        status: ApprovalStatus,
    ) -> impl Future<Output = anyhow::Result<()>>;
}

impl TryFrom<i64> for ApprovalStatus {
    type Error = anyhow::Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ApprovalStatus::Pending),
            1 => Ok(ApprovalStatus::Approved),
            2 => Ok(ApprovalStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid ApprovalStatus value: {}", value)),
        }
    }
}

impl From<ApprovalStatus> for i64 {
    fn from(status: ApprovalStatus) -> Self {
        match status {
            ApprovalStatus::Pending => 0,
            ApprovalStatus::Approved => 1,
            ApprovalStatus::Rejected => 2,
        }
    }
}
