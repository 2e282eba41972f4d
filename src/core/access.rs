//! Centralized capability checks. Every mutating workflow operation funnels
//! through these predicates instead of scattering role branches across
//! callers.

use crate::core::db::{BrochurePage, Role};

/// Managers and employees review brochures: they may lock, unlock and
/// approve pages.
pub fn can_review(role: Role) -> bool {
    matches!(role, Role::Manager | Role::Employee)
}

/// A page is editable by a client iff it is not locked; reviewers may always
/// edit regardless of lock state. Derived, never stored.
pub fn is_page_editable(role: Role, page: &BrochurePage) -> bool {
    can_review(role) || !page.is_locked
}
