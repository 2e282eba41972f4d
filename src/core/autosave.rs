use std::{collections::HashMap, future::Future, sync::Mutex, time::Duration};

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::core::db::PageContent;

/// Persistence boundary the coordinator writes through once a burst of edits
/// settles. Implemented by the store; tests substitute a recorder.
pub trait SaveSink: Clone + Send + Sync + 'static {
    fn persist(
        &self,
        project_id: Uuid,
        page_number: i64,
        content: PageContent,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Trailing-edge debounce over page content updates: each update (re)arms a
/// deferred persist for its (project_id, page_number) key, and only the last
/// update of a burst reaches the sink, one quiet window after the burst
/// settles. Keys are independent of one another.
///
/// Must be used from within a tokio runtime. Persist failures are logged and
/// dropped; there is no retry policy.
pub struct AutosaveCoordinator<S: SaveSink> {
    sink: S,
    quiet_window: Duration,
    pending: Mutex<HashMap<(Uuid, i64), JoinHandle<()>>>,
}

impl<S: SaveSink> AutosaveCoordinator<S> {
    pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_secs(1);

    pub fn new(sink: S) -> Self {
        Self::with_quiet_window(sink, Self::DEFAULT_QUIET_WINDOW)
    }

    pub fn with_quiet_window(sink: S, quiet_window: Duration) -> Self {
        Self {
            sink,
            quiet_window,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Accept one content update. Any persist still pending for the same key
    /// is cancelled and replaced.
    pub fn update(&self, project_id: Uuid, page_number: i64, content: PageContent) {
        let sink = self.sink.clone();
        let quiet_window = self.quiet_window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet_window).await;
            if let Err(err) = sink.persist(project_id, page_number, content).await {
                tracing::warn!(%project_id, page_number, "autosave persist failed: {err:#}");
            }
        });

        let mut pending = self.pending.lock().expect("autosave registry poisoned");
        if let Some(previous) = pending.insert((project_id, page_number), handle) {
            previous.abort();
        }
    }
}

impl<S: SaveSink> Drop for AutosaveCoordinator<S> {
    fn drop(&mut self) {
        // Pending saves die with the coordinator, matching the debounce
        // contract: an unsettled burst was never promised to persist.
        if let Ok(pending) = self.pending.lock() {
            for handle in pending.values() {
                handle.abort();
            }
        }
    }
}
