use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{deserialize_state, serialize_state, ReviewState, StateError};

/// Single owner of the mutable `ReviewState`.
///
/// Transitions are pure functions over an immutable snapshot; the store
/// serializes their application behind one lock and persists the blob
/// after every change, so concurrent per-file completions cannot lose
/// updates.
pub struct StateStore {
    path: PathBuf,
    state: Mutex<Option<ReviewState>>,
}

impl StateStore {
    /// Open a store backed by `path`, loading any persisted state. An
    /// absent or unreadable blob is a cold start.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = load_from(&path);
        if state.is_some() {
            debug!(path = %path.display(), "loaded persisted review state");
        }
        StateStore {
            path,
            state: Mutex::new(state),
        }
    }

    /// Snapshot of the current state.
    pub async fn snapshot(&self) -> Option<ReviewState> {
        self.state.lock().await.clone()
    }

    /// Replace the state wholesale (new review or superseding commit).
    pub async fn replace(&self, state: ReviewState) {
        let mut guard = self.state.lock().await;
        persist(&self.path, &state);
        *guard = Some(state);
    }

    /// Apply a pure transition to the current snapshot, store the result,
    /// and persist it. The transition runs under the lock, one at a time.
    pub async fn apply<F>(&self, transition: F) -> Result<ReviewState, StateError>
    where
        F: FnOnce(&ReviewState) -> Result<ReviewState, StateError>,
    {
        let mut guard = self.state.lock().await;
        let current = guard
            .as_ref()
            .ok_or_else(|| StateError::NotFound("no active review state".to_string()))?;
        let next = transition(current)?;
        persist(&self.path, &next);
        *guard = Some(next.clone());
        Ok(next)
    }
}

fn load_from(path: &Path) -> Option<ReviewState> {
    let raw = std::fs::read_to_string(path).ok()?;
    deserialize_state(&raw)
}

fn persist(path: &Path, state: &ReviewState) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }
    // A failed write must not abort the run; the next transition will
    // try again and resume degrades to cold start at worst.
    if let Err(err) = std::fs::write(path, serialize_state(state)) {
        warn!(path = %path.display(), error = %err, "failed to persist review state");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{create_review_state, update_file_status, FileStatus};

    #[tokio::test]
    async fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = StateStore::open(&path);
        assert!(store.snapshot().await.is_none());

        let state = create_review_state("abc", &["a.ts".to_string()]);
        store.replace(state.clone()).await;

        // A fresh store sees the persisted blob.
        let reopened = StateStore::open(&path);
        assert_eq!(reopened.snapshot().await, Some(state));
    }

    #[tokio::test]
    async fn test_apply_persists_transition() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = StateStore::open(&path);
        store
            .replace(create_review_state("abc", &["a.ts".to_string()]))
            .await;
        store
            .apply(|s| update_file_status(s, "a.ts", FileStatus::Reviewed, None))
            .await
            .unwrap();

        let reopened = StateStore::open(&path);
        let state = reopened.snapshot().await.unwrap();
        assert_eq!(state.completed_files, 1);
    }

    #[tokio::test]
    async fn test_apply_without_state_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path().join("state.json"));
        let result = store.apply(|s| Ok(s.clone())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_cold_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not valid json").unwrap();

        let store = StateStore::open(&path);
        assert!(store.snapshot().await.is_none());
    }
}
