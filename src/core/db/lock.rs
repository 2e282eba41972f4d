use std::future::Future;

use uuid::Uuid;

use crate::core::db::model::UserRef;

/// Per-page cooperative lock. Locking is a reviewer-imposed hold that blocks
/// the owning client's edit path; it is not a mutual-exclusion primitive and
/// never blocks the store itself. Role gating lives in the workflow layer,
/// not here.
pub trait LockRepository {
    /// Sets is_locked and stamps locked_by/locked_by_name/locked_at from the
    /// acting user. Unknown page ids are a no-op.
    fn lock_page(
        &self,
        page_id: Uuid,
        user: &UserRef,
    ) -> impl Future<Output = anyhow::Result<()>>;
    /// Clears is_locked and all lock-audit fields. Unknown page ids are a
    /// no-op.
    fn unlock_page(&self, page_id: Uuid) -> impl Future<Output = anyhow::Result<()>>;
}
