pub mod diff;
pub mod types;

pub use types::{FileDiff, PrUrl, PullRequest, ReviewComment};

use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Invalid PR URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to parse diff: {0}")]
    DiffParse(String),

    #[error("GitHub token not found in config or environment")]
    MissingToken,
}

/// Parse a GitHub PR URL into its component parts.
/// Expected format: https://github.com/{owner}/{repo}/pull/{number}
pub fn parse_pr_url(url: &str) -> Result<PrUrl, PrError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| PrError::InvalidUrl(url.to_string()))?;

    if parsed.host_str() != Some("github.com") {
        return Err(PrError::InvalidUrl(url.to_string()));
    }

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(|| PrError::InvalidUrl(url.to_string()))?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() != 4 || segments[2] != "pull" {
        return Err(PrError::InvalidUrl(url.to_string()));
    }

    let pr_number = segments[3]
        .parse::<u64>()
        .map_err(|_| PrError::InvalidUrl(url.to_string()))?;

    Ok(PrUrl {
        owner: segments[0].to_string(),
        repo: segments[1].to_string(),
        pr_number,
    })
}

/// Source-control collaborator: fetches PR metadata and diffs, posts
/// review comments.
pub struct GithubClient {
    client: reqwest::Client,
    token: String,
}

impl GithubClient {
    pub fn new(token: String) -> Self {
        GithubClient {
            client: reqwest::Client::new(),
            token,
        }
    }

    fn pull_url(&self, pr_url: &PrUrl) -> String {
        format!(
            "https://api.github.com/repos/{}/{}/pulls/{}",
            pr_url.owner, pr_url.repo, pr_url.pr_number
        )
    }

    /// Fetch a complete PullRequest (metadata + parsed per-file diff)
    /// from the GitHub API.
    #[instrument(skip(self), fields(owner = %pr_url.owner, repo = %pr_url.repo, pr = pr_url.pr_number))]
    pub async fn fetch_pull_request(&self, pr_url: &PrUrl) -> Result<PullRequest, PrError> {
        #[derive(serde::Deserialize)]
        struct User {
            login: String,
        }

        #[derive(serde::Deserialize)]
        struct Head {
            sha: String,
        }

        #[derive(serde::Deserialize)]
        struct PullResponse {
            number: u64,
            title: String,
            user: User,
            head: Head,
            changed_files: usize,
            additions: usize,
            deletions: usize,
        }

        let base_url = self.pull_url(pr_url);

        debug!("fetching PR metadata from GitHub API");
        let response = self
            .client
            .get(&base_url)
            .header("User-Agent", "pr-reviewer")
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?;

        let metadata = response.json::<PullResponse>().await?;
        debug!(title = %metadata.title, changed_files = metadata.changed_files, "received PR metadata");

        debug!("fetching PR diff from GitHub API");
        let diff_text = self
            .client
            .get(&base_url)
            .header("User-Agent", "pr-reviewer")
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github.diff")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(diff_bytes = diff_text.len(), "received PR diff");

        let files = diff::parse_diff(&diff_text)?;
        debug!(parsed_files = files.len(), "parsed diff");

        Ok(PullRequest {
            number: metadata.number,
            title: metadata.title,
            author: metadata.user.login,
            head_sha: metadata.head.sha,
            files_changed: metadata.changed_files,
            additions: metadata.additions,
            deletions: metadata.deletions,
            files,
        })
    }

    /// Fetch existing review comments, grouped per file as
    /// `(anchor line, "@author: body")` pairs for comment-chain context.
    #[instrument(skip(self), fields(pr = pr_url.pr_number))]
    pub async fn fetch_review_comments(
        &self,
        pr_url: &PrUrl,
    ) -> Result<std::collections::HashMap<String, Vec<(usize, String)>>, PrError> {
        #[derive(serde::Deserialize)]
        struct User {
            login: String,
        }

        #[derive(serde::Deserialize)]
        struct Comment {
            path: String,
            line: Option<usize>,
            body: String,
            user: User,
        }

        let comments = self
            .client
            .get(format!("{}/comments", self.pull_url(pr_url)))
            .header("User-Agent", "pr-reviewer")
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Comment>>()
            .await?;
        debug!(comments = comments.len(), "fetched existing review comments");

        let mut by_file: std::collections::HashMap<String, Vec<(usize, String)>> =
            std::collections::HashMap::new();
        for comment in comments {
            // Outdated comments lose their line anchor; nothing to attach
            // them to.
            let Some(line) = comment.line else { continue };
            by_file
                .entry(comment.path)
                .or_default()
                .push((line, format!("@{}: {}", comment.user.login, comment.body)));
        }
        Ok(by_file)
    }

    /// Post one line-range review comment on the PR's head commit.
    #[instrument(skip(self, comment), fields(pr = pr_url.pr_number, file = %comment.filename))]
    pub async fn post_review_comment(
        &self,
        pr_url: &PrUrl,
        commit_id: &str,
        comment: &ReviewComment,
    ) -> Result<(), PrError> {
        let mut payload = serde_json::json!({
            "body": comment.text,
            "commit_id": commit_id,
            "path": comment.filename,
            "line": comment.end_line,
            "side": "RIGHT",
        });
        if comment.start_line < comment.end_line {
            payload["start_line"] = serde_json::json!(comment.start_line);
            payload["start_side"] = serde_json::json!("RIGHT");
        }

        self.client
            .post(format!("{}/comments", self.pull_url(pr_url)))
            .header("User-Agent", "pr-reviewer")
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        debug!("posted review comment");
        Ok(())
    }

    /// Post a PR-level summary comment (issue comment endpoint).
    #[instrument(skip(self, body), fields(pr = pr_url.pr_number))]
    pub async fn post_summary_comment(&self, pr_url: &PrUrl, body: &str) -> Result<(), PrError> {
        let url = format!(
            "https://api.github.com/repos/{}/{}/issues/{}/comments",
            pr_url.owner, pr_url.repo, pr_url.pr_number
        );
        self.client
            .post(url)
            .header("User-Agent", "pr-reviewer")
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?
            .error_for_status()?;
        debug!("posted summary comment");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_pr_url() {
        let url = parse_pr_url("https://github.com/org/repo/pull/42").unwrap();
        assert_eq!(url.owner, "org");
        assert_eq!(url.repo, "repo");
        assert_eq!(url.pr_number, 42);
    }

    #[test]
    fn test_parse_invalid_pr_url() {
        assert!(parse_pr_url("https://example.com").is_err());
        assert!(parse_pr_url("not-a-url").is_err());
        assert!(parse_pr_url("https://github.com/org/repo/pulls/42").is_err());
    }
}
