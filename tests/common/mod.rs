#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from brochurekit for tests
pub use brochurekit::{
    ActionType, ApprovalRepository, ApprovalStatus, AutosaveCoordinator, BrochurePage,
    BrochureProject, BrochureWorkspace, CommentRepository, LockRepository, MAX_ATTACHMENT_BYTES,
    NewComment, PageComment, PageContent, PageDefaults, PageRepository, ProjectRepository,
    ProjectStatus, Role, SaveSink, StudioDb, UserRef, WorkflowError, can_review,
    completion_percentage, is_page_editable,
};
