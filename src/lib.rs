pub mod core;

pub use crate::core::access::{can_review, is_page_editable};
pub use crate::core::autosave::{AutosaveCoordinator, SaveSink};
pub use crate::core::db::{
    ActionType, ApprovalRepository, ApprovalStatus, BrochurePage, BrochureProject,
    CommentRepository, LockRepository, MAX_ATTACHMENT_BYTES, NewComment, PageComment, PageContent,
    PageDefaults, PageRepository, ProjectRepository, ProjectStatus, Role, StudioDb, UserRef,
};
pub use crate::core::progress::completion_percentage;
pub use crate::core::workflow::{BrochureWorkspace, WorkflowError};
