use super::{eligible_statuses, get_files_to_process, ReviewPhase, ReviewState};
use crate::pr::types::FileDiff;

/// Narrow the run's file list to what a phase still has to do.
///
/// No persisted state means a cold start: everything is processed. With
/// state, the file list is intersected with the filenames eligible for
/// `phase`, preserving the input order.
pub fn filter_files_for_resume<'a>(
    all_files: &'a [FileDiff],
    state: Option<&ReviewState>,
    phase: ReviewPhase,
) -> Vec<&'a FileDiff> {
    let Some(state) = state else {
        return all_files.iter().collect();
    };

    let eligible = eligible_statuses(phase);
    let remaining: std::collections::HashSet<&str> = state
        .files
        .iter()
        .filter(|f| eligible.contains(&f.status))
        .map(|f| f.filename.as_str())
        .collect();

    all_files
        .iter()
        .filter(|f| remaining.contains(f.filename.as_str()))
        .collect()
}

/// Whether a prior run should be continued: resume must be enabled, state
/// must exist, and the state's current phase must still have work.
pub fn should_resume_review(enabled: bool, state: Option<&ReviewState>) -> bool {
    if !enabled {
        return false;
    }
    match state {
        Some(state) => !get_files_to_process(state).is_empty(),
        None => false,
    }
}
