use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use super::{ArchiveError, Result, SnapshotService};

#[derive(Default)]
struct MockState {
    calls: Vec<String>,
    empty: HashSet<String>,
    failing: HashSet<String>,
}

/// Snapshot service double. Successful captures return
/// `https://archive.ph/mock<n>`, numbered by call order.
#[derive(Default)]
pub struct MockSnapshotService {
    state: Mutex<MockState>,
}

impl MockSnapshotService {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Answer captures of `url` with an empty result
    pub fn respond_empty(&self, url: &str) {
        self.state().empty.insert(url.to_string());
    }

    /// Answer captures of `url` with an error
    pub fn respond_error(&self, url: &str) {
        self.state().failing.insert(url.to_string());
    }

    /// URLs captured so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }
}

#[async_trait]
impl SnapshotService for MockSnapshotService {
    async fn capture(&self, url: &str) -> Result<Option<String>> {
        let mut state = self.state();
        state.calls.push(url.to_string());

        if state.failing.contains(url) {
            return Err(ArchiveError::RequestFailed("connection reset".to_string()));
        }
        if state.empty.contains(url) {
            return Ok(None);
        }
        Ok(Some(format!("https://archive.ph/mock{}", state.calls.len())))
    }
}
