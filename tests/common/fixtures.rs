use brochurekit::{BrochureWorkspace, PageContent, Role, StudioDb, UserRef};

pub fn manager() -> UserRef {
    UserRef {
        id: "u-manager".to_string(),
        name: "Meera Joshi".to_string(),
        role: Role::Manager,
    }
}

pub fn employee() -> UserRef {
    UserRef {
        id: "u-employee".to_string(),
        name: "Dev Patel".to_string(),
        role: Role::Employee,
    }
}

pub fn client() -> UserRef {
    UserRef {
        id: "u-client".to_string(),
        name: "Priya Sharma".to_string(),
        role: Role::Client,
    }
}

/// Creates a StudioDb with a temporary studio file.
/// Returns both the db and the temp directory (which must be kept alive).
pub async fn create_test_studio() -> (StudioDb, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("test.brochure");
    let db = StudioDb::new(&path)
        .await
        .expect("Failed to create test studio");
    (db, dir)
}

/// Opens a workspace on a fresh studio file for the given session user.
pub async fn open_test_workspace(
    user: Option<UserRef>,
) -> (BrochureWorkspace, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("test.brochure");
    let workspace = BrochureWorkspace::open(&path, user)
        .await
        .expect("Failed to open test workspace");
    (workspace, dir)
}

/// Content for a free-form page (page numbers 3 and up).
pub fn text_page(heading: &str, body: &str) -> PageContent {
    PageContent {
        heading: Some(heading.to_string()),
        body_content: Some(body.to_string()),
        ..Default::default()
    }
}

/// Content for page 1 (project details).
pub fn project_details_page(
    project_name: Option<&str>,
    description: Option<&str>,
    company_name: Option<&str>,
) -> PageContent {
    PageContent {
        project_name: project_name.map(str::to_string),
        description: description.map(str::to_string),
        company_name: company_name.map(str::to_string),
        ..Default::default()
    }
}

/// Content for page 2 (company information).
pub fn company_info_page(about_us: Option<&str>, email: Option<&str>) -> PageContent {
    PageContent {
        about_us: about_us.map(str::to_string),
        email: email.map(str::to_string),
        ..Default::default()
    }
}
