pub mod resume;
pub mod store;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema version of the persisted blob. Deserialization requires an
/// exact match; anything else degrades to cold start.
pub const STATE_VERSION: &str = "1.0";

#[derive(Debug, Error)]
pub enum StateError {
    #[error("File not found in review state: {0}")]
    NotFound(String),

    #[error("Failed to persist review state: {0}")]
    Persist(#[from] std::io::Error),
}

/// Per-file progress through the review pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Summarizing,
    Summarized,
    Reviewing,
    Reviewed,
    Failed,
    Skipped,
}

/// Pipeline stage governing which statuses count as "to process".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewPhase {
    Summarizing,
    Reviewing,
}

/// One file's entry in the persisted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReviewStatus {
    pub filename: String,
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_confidence: Option<f64>,
    pub updated_at: String,
}

/// Persisted progress for one commit under review.
///
/// Immutable value: every mutation goes through the pure transition
/// functions below, which return a new state. A state is never deleted,
/// only superseded by a fresh one for a new commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub version: String,
    pub started_at: String,
    pub updated_at: String,
    pub commit_id: String,
    pub total_files: usize,
    pub completed_files: usize,
    pub failed_files: usize,
    pub skipped_files: usize,
    pub phase: ReviewPhase,
    pub files: Vec<FileReviewStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Optional metadata attached to a status transition.
#[derive(Debug, Clone, Default)]
pub struct StatusMeta {
    pub error: Option<String>,
    pub skip_reason: Option<String>,
    pub skip_confidence: Option<f64>,
}

impl StatusMeta {
    pub fn error(message: impl Into<String>) -> Self {
        StatusMeta {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn skip(reason: impl Into<String>, confidence: f64) -> Self {
        StatusMeta {
            skip_reason: Some(reason.into()),
            skip_confidence: Some(confidence),
            ..Default::default()
        }
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

// Counter membership: completed covers reviewed and skipped files,
// skipped is a subset of completed.
fn counts_completed(status: FileStatus) -> bool {
    matches!(status, FileStatus::Reviewed | FileStatus::Skipped)
}

fn counts_failed(status: FileStatus) -> bool {
    matches!(status, FileStatus::Failed)
}

fn counts_skipped(status: FileStatus) -> bool {
    matches!(status, FileStatus::Skipped)
}

/// Fresh state for a commit: all files pending, counters zero, phase
/// summarizing.
pub fn create_review_state(commit_id: &str, files: &[String]) -> ReviewState {
    let timestamp = now();
    ReviewState {
        version: STATE_VERSION.to_string(),
        started_at: timestamp.clone(),
        updated_at: timestamp.clone(),
        commit_id: commit_id.to_string(),
        total_files: files.len(),
        completed_files: 0,
        failed_files: 0,
        skipped_files: 0,
        phase: ReviewPhase::Summarizing,
        files: files
            .iter()
            .map(|filename| FileReviewStatus {
                filename: filename.clone(),
                status: FileStatus::Pending,
                error: None,
                skip_reason: None,
                skip_confidence: None,
                updated_at: timestamp.clone(),
            })
            .collect(),
        last_error: None,
    }
}

/// Move one file to a new status, recomputing the counters from the old
/// status's membership to the new one. Counters clamp at zero.
pub fn update_file_status(
    state: &ReviewState,
    filename: &str,
    status: FileStatus,
    meta: Option<StatusMeta>,
) -> Result<ReviewState, StateError> {
    let index = state
        .files
        .iter()
        .position(|f| f.filename == filename)
        .ok_or_else(|| StateError::NotFound(filename.to_string()))?;

    let mut next = state.clone();
    let timestamp = now();
    let old_status = next.files[index].status;

    let adjust = |counter: usize, was: bool, is: bool| -> usize {
        let counter = if was { counter.saturating_sub(1) } else { counter };
        if is {
            counter + 1
        } else {
            counter
        }
    };
    next.completed_files = adjust(
        next.completed_files,
        counts_completed(old_status),
        counts_completed(status),
    );
    next.failed_files = adjust(
        next.failed_files,
        counts_failed(old_status),
        counts_failed(status),
    );
    next.skipped_files = adjust(
        next.skipped_files,
        counts_skipped(old_status),
        counts_skipped(status),
    );

    let entry = &mut next.files[index];
    entry.status = status;
    entry.updated_at = timestamp.clone();
    if let Some(meta) = meta {
        if meta.error.is_some() {
            entry.error = meta.error;
        }
        if meta.skip_reason.is_some() {
            entry.skip_reason = meta.skip_reason;
        }
        if meta.skip_confidence.is_some() {
            entry.skip_confidence = meta.skip_confidence;
        }
    }
    next.updated_at = timestamp;
    Ok(next)
}

/// Forward-only phase transition: once reviewing, always reviewing.
pub fn update_phase(state: &ReviewState, phase: ReviewPhase) -> ReviewState {
    let mut next = state.clone();
    if next.phase == ReviewPhase::Summarizing && phase == ReviewPhase::Reviewing {
        next.phase = ReviewPhase::Reviewing;
        next.updated_at = now();
    }
    next
}

/// Record a run-level error on the state.
pub fn record_error(state: &ReviewState, error: &str) -> ReviewState {
    let mut next = state.clone();
    next.last_error = Some(error.to_string());
    next.updated_at = now();
    next
}

/// Statuses eligible for processing in a phase. The reviewing phase
/// deliberately excludes failed files: a failed review re-enters only
/// through an external retry trigger.
pub fn eligible_statuses(phase: ReviewPhase) -> &'static [FileStatus] {
    match phase {
        ReviewPhase::Summarizing => &[
            FileStatus::Pending,
            FileStatus::Failed,
            FileStatus::Summarizing,
        ],
        ReviewPhase::Reviewing => &[FileStatus::Summarized, FileStatus::Reviewing],
    }
}

/// Files still to process in the state's current phase, in stored order.
pub fn get_files_to_process(state: &ReviewState) -> Vec<&FileReviewStatus> {
    let eligible = eligible_statuses(state.phase);
    state
        .files
        .iter()
        .filter(|f| eligible.contains(&f.status))
        .collect()
}

/// A run is complete when every file has either completed or failed.
/// Failed files count toward completion by definition: this governs when
/// resume considers a run done.
pub fn is_review_complete(state: &ReviewState) -> bool {
    state.completed_files + state.failed_files == state.total_files
}

/// Serialize to the persisted JSON blob.
pub fn serialize_state(state: &ReviewState) -> String {
    // ReviewState contains no non-string map keys, so this cannot fail.
    serde_json::to_string(state).unwrap_or_default()
}

/// Deserialize a persisted blob. Returns `None` (cold start) for invalid
/// JSON, missing fields, or a version other than "1.0" — never an error.
pub fn deserialize_state(raw: &str) -> Option<ReviewState> {
    serde_json::from_str::<ReviewState>(raw)
        .ok()
        .filter(|state| state.version == STATE_VERSION)
}

/// Two states describe the same review when both are present, share a
/// commit id, and cover the same set of filenames.
pub fn is_same_review(a: Option<&ReviewState>, b: Option<&ReviewState>) -> bool {
    let (Some(a), Some(b)) = (a, b) else {
        return false;
    };
    if a.commit_id != b.commit_id || a.files.len() != b.files.len() {
        return false;
    }
    let names: std::collections::HashSet<&str> =
        a.files.iter().map(|f| f.filename.as_str()).collect();
    b.files.iter().all(|f| names.contains(f.filename.as_str()))
}
