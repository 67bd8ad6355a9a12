/// Metadata about a pull request fetched from the GitHub API.
/// Not Deserialize — PullRequest is constructed manually from the GitHub
/// API JSON response plus the parsed per-file diff.
#[derive(Debug, Clone)]
pub struct PullRequest {
    /// PR number (e.g., 42)
    pub number: u64,
    /// PR title
    pub title: String,
    /// Author's GitHub login
    pub author: String,
    /// Head commit SHA the review is pinned to
    pub head_sha: String,
    /// Total files changed
    pub files_changed: usize,
    /// Total lines added
    pub additions: usize,
    /// Total lines deleted
    pub deletions: usize,
    /// Per-file diffs, in source order
    pub files: Vec<FileDiff>,
}

/// A single file within the PR diff. The raw `patch` text (hunk headers
/// and body lines, nothing else) feeds the hunk decomposer.
#[derive(Debug, Clone)]
pub struct FileDiff {
    /// File path (e.g., "src/auth/config.rs")
    pub filename: String,
    /// Raw unified-diff hunk text for this file
    pub patch: String,
    /// Lines added in this file
    pub additions: usize,
    /// Lines deleted in this file
    pub deletions: usize,
    /// Whether this is a new file
    pub is_new: bool,
    /// Whether this file was deleted
    pub is_deleted: bool,
}

/// Represents the parsed components of a GitHub PR URL.
#[derive(Debug, Clone)]
pub struct PrUrl {
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
}

/// A final, patch-mapped review comment ready to hand to the posting
/// collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewComment {
    pub filename: String,
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
}
