pub mod mapper;
pub mod parser;
pub mod prompt;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::llm::{ChatModel, ChatOptions};
use crate::patch::pack::{estimate_tokens, pack_patches, patches_to_pack};
use crate::patch::{decompose_patch, Hunk};
use crate::pr::{FileDiff, GithubClient, PrUrl, PullRequest, ReviewComment};
use crate::retry::{
    calculate_backoff_delay, classify_error, retry_strategy, should_retry, RetryConfig,
};
use crate::state::resume::{filter_files_for_resume, should_resume_review};
use crate::state::store::StateStore;
use crate::state::{
    create_review_state, is_review_complete, is_same_review, record_error, update_file_status,
    update_phase, FileStatus, ReviewPhase, ReviewState, StatusMeta,
};

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Review state error: {0}")]
    State(#[from] crate::state::StateError),

    #[error("GitHub request failed: {0}")]
    Pr(#[from] crate::pr::PrError),
}

/// Knobs for one review run.
#[derive(Debug, Clone)]
pub struct ReviewOptions {
    /// Token budget for one outbound request (prompt + packed hunks).
    pub token_limit: usize,
    /// Concurrent LLM calls.
    pub llm_concurrency: usize,
    /// Concurrent GitHub calls.
    pub github_concurrency: usize,
    /// Continue a prior run for the same commit when possible.
    pub resume: bool,
    /// Per-call timeout on the provider; expiry classifies as timeout.
    pub request_timeout: Duration,
    pub chat: ChatOptions,
    pub retry: RetryConfig,
}

impl Default for ReviewOptions {
    fn default() -> Self {
        ReviewOptions {
            token_limit: 6000,
            llm_concurrency: 4,
            github_concurrency: 4,
            resume: true,
            request_timeout: Duration::from_secs(120),
            chat: ChatOptions::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// What a run produced, independent of whether comments were posted.
#[derive(Debug)]
pub struct RunOutcome {
    pub state: ReviewState,
    pub comments: Vec<ReviewComment>,
    pub summaries: HashMap<String, String>,
}

/// Drives the two-phase review over one pull request.
///
/// `github` is optional: without it (mock or dry-run) comments are
/// collected in the outcome instead of posted.
pub struct ReviewRunner {
    chat: Arc<dyn ChatModel>,
    github: Option<Arc<GithubClient>>,
    store: Arc<StateStore>,
    options: ReviewOptions,
}

impl ReviewRunner {
    pub fn new(
        chat: Arc<dyn ChatModel>,
        github: Option<Arc<GithubClient>>,
        store: Arc<StateStore>,
        options: ReviewOptions,
    ) -> Self {
        ReviewRunner {
            chat,
            github,
            store,
            options,
        }
    }

    pub async fn run(
        &self,
        pr: &PullRequest,
        pr_url: Option<&PrUrl>,
    ) -> Result<RunOutcome, ReviewError> {
        let filenames: Vec<String> = pr.files.iter().map(|f| f.filename.clone()).collect();
        let candidate = create_review_state(&pr.head_sha, &filenames);

        let prior = self.store.snapshot().await;
        let same = is_same_review(prior.as_ref(), Some(&candidate));
        let state = match prior {
            // A finished state for this commit means there is nothing left
            // to bill; re-running it is only allowed with resume disabled.
            Some(prior) if self.options.resume && same && is_review_complete(&prior) => {
                info!(commit = %prior.commit_id, "review for this commit is already complete");
                prior
            }
            Some(prior) if same && should_resume_review(self.options.resume, Some(&prior)) => {
                info!(
                    commit = %prior.commit_id,
                    completed = prior.completed_files,
                    "resuming prior review"
                );
                prior
            }
            // A state for another commit is superseded, never mutated.
            _ => {
                self.store.replace(candidate.clone()).await;
                candidate
            }
        };

        let mut summaries = HashMap::new();
        let state = if state.phase == ReviewPhase::Summarizing {
            summaries = self.run_summarize_phase(pr, &state).await;
            self.store
                .apply(|s| Ok(update_phase(s, ReviewPhase::Reviewing)))
                .await?
        } else {
            state
        };

        let comments = self.run_review_phase(pr, pr_url, &state, &summaries).await;

        let state = self.store.snapshot().await.unwrap_or(state);
        info!(
            complete = is_review_complete(&state),
            completed = state.completed_files,
            failed = state.failed_files,
            skipped = state.skipped_files,
            "review run finished"
        );

        Ok(RunOutcome {
            state,
            comments,
            summaries,
        })
    }

    /// Phase 1: one summary per file still pending (or failed earlier).
    async fn run_summarize_phase(
        &self,
        pr: &PullRequest,
        state: &ReviewState,
    ) -> HashMap<String, String> {
        let files = filter_files_for_resume(&pr.files, Some(state), ReviewPhase::Summarizing);
        info!(files = files.len(), "summarize phase");

        let llm_pool = Arc::new(Semaphore::new(self.options.llm_concurrency));
        let mut tasks: JoinSet<(String, Option<String>)> = JoinSet::new();

        for file in files {
            let file = file.clone();
            let chat = Arc::clone(&self.chat);
            let store = Arc::clone(&self.store);
            let pool = Arc::clone(&llm_pool);
            let options = self.options.clone();
            let filename = file.filename.clone();

            tasks.spawn(
                async move {
                    let summary = summarize_file(&*chat, &store, &pool, &file, &options).await;
                    (file.filename, summary)
                }
                .instrument(info_span!("summarize", file = %filename)),
            );
        }

        let mut summaries = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((filename, Some(summary))) => {
                    summaries.insert(filename, summary);
                }
                Ok((_, None)) => {}
                Err(err) => warn!(error = %err, "summarize task panicked"),
            }
        }
        summaries
    }

    /// Phase 2: line-range review comments for summarized files.
    async fn run_review_phase(
        &self,
        pr: &PullRequest,
        pr_url: Option<&PrUrl>,
        state: &ReviewState,
        summaries: &HashMap<String, String>,
    ) -> Vec<ReviewComment> {
        let files = filter_files_for_resume(&pr.files, Some(state), ReviewPhase::Reviewing);
        info!(files = files.len(), "review phase");

        let llm_pool = Arc::new(Semaphore::new(self.options.llm_concurrency));
        let github_pool = Arc::new(Semaphore::new(self.options.github_concurrency));
        let chains = Arc::new(self.fetch_comment_chains(pr_url, &github_pool).await);
        let summaries = Arc::new(summaries.clone());
        let mut tasks: JoinSet<Vec<ReviewComment>> = JoinSet::new();

        for file in files {
            let file = file.clone();
            let chat = Arc::clone(&self.chat);
            let github = self.github.clone();
            let store = Arc::clone(&self.store);
            let llm_pool = Arc::clone(&llm_pool);
            let github_pool = Arc::clone(&github_pool);
            let chains = Arc::clone(&chains);
            let summaries = Arc::clone(&summaries);
            let options = self.options.clone();
            let pr_title = pr.title.clone();
            let head_sha = pr.head_sha.clone();
            let pr_url = pr_url.cloned();
            let filename = file.filename.clone();

            tasks.spawn(
                async move {
                    review_file(
                        &*chat,
                        github.as_deref(),
                        &store,
                        &llm_pool,
                        &github_pool,
                        &file,
                        &pr_title,
                        &head_sha,
                        pr_url.as_ref(),
                        summaries.get(&file.filename).map(String::as_str),
                        chains.get(&file.filename),
                        &options,
                    )
                    .await
                }
                .instrument(info_span!("review", file = %filename)),
            );
        }

        let mut comments = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(file_comments) => comments.extend(file_comments),
                Err(err) => warn!(error = %err, "review task panicked"),
            }
        }
        comments
    }

    /// Existing review-comment threads, grouped per file, for the packer's
    /// comment-chain sections. Failures degrade to no chains.
    async fn fetch_comment_chains(
        &self,
        pr_url: Option<&PrUrl>,
        github_pool: &Semaphore,
    ) -> HashMap<String, Vec<(usize, String)>> {
        let (Some(github), Some(pr_url)) = (self.github.as_deref(), pr_url) else {
            return HashMap::new();
        };
        let _permit = github_pool.acquire().await.expect("pool never closed");
        match github.fetch_review_comments(pr_url).await {
            Ok(chains) => chains,
            Err(err) => {
                warn!(error = %err, "failed to fetch existing comment threads");
                HashMap::new()
            }
        }
    }
}

/// Classify a failed attempt and consult the retry policy. Returns the
/// backoff delay when the attempt should be retried, `None` to give up.
fn backoff_before_retry(
    attempt: u32,
    message: &str,
    retry: &RetryConfig,
    label: &str,
) -> Option<Duration> {
    let kind = classify_error(message);
    if !should_retry(attempt, kind, retry) {
        debug!(%kind, attempt, label, "giving up");
        return None;
    }
    let delay = calculate_backoff_delay(attempt, retry_strategy(kind).base_delay_ms);
    warn!(%kind, attempt, delay_ms = delay, error = %message, label, "retrying");
    Some(Duration::from_millis(delay))
}

/// One provider call with the configured timeout; expiry is reported in
/// timeout-classifiable words.
async fn chat_with_timeout(
    chat: &dyn ChatModel,
    prompt: &str,
    options: &ReviewOptions,
) -> Result<String, String> {
    match tokio::time::timeout(options.request_timeout, chat.chat(prompt, &options.chat)).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(err)) => Err(err.to_string()),
        Err(_) => Err(format!(
            "request timed out after {}s",
            options.request_timeout.as_secs()
        )),
    }
}

/// Provider call under the retry policy.
async fn chat_with_retry(
    chat: &dyn ChatModel,
    prompt: &str,
    options: &ReviewOptions,
) -> Result<String, String> {
    let mut attempt = 0u32;
    loop {
        match chat_with_timeout(chat, prompt, options).await {
            Ok(text) => return Ok(text),
            Err(message) => {
                match backoff_before_retry(attempt, &message, &options.retry, "chat") {
                    Some(delay) => {
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => return Err(message),
                }
            }
        }
    }
}

/// Comment post under the retry policy.
async fn post_with_retry(
    github: &GithubClient,
    pr_url: &PrUrl,
    commit_id: &str,
    comment: &ReviewComment,
    retry: &RetryConfig,
) -> Result<(), String> {
    let mut attempt = 0u32;
    loop {
        match github.post_review_comment(pr_url, commit_id, comment).await {
            Ok(()) => return Ok(()),
            Err(err) => {
                let message = err.to_string();
                match backoff_before_retry(attempt, &message, retry, "post comment") {
                    Some(delay) => {
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => return Err(message),
                }
            }
        }
    }
}

/// Decompose and budget one file. `Ok(None)` means the skip disposition
/// was recorded (nothing fits); `Err` means the state update failed.
async fn decompose_and_budget(
    store: &StateStore,
    filename: &str,
    patch: &str,
    base_tokens: usize,
    token_limit: usize,
) -> Result<Option<(Vec<Hunk>, usize)>, crate::state::StateError> {
    let hunks = decompose_patch(patch);
    let count = patches_to_pack(&hunks, base_tokens, token_limit);
    if count == 0 {
        // Not an error: the file is disposed as skipped for this phase.
        info!(file = %filename, hunks = hunks.len(), "diff too large for token budget, skipping");
        store
            .apply(|s| {
                update_file_status(
                    s,
                    filename,
                    FileStatus::Skipped,
                    Some(StatusMeta::skip("diff too large", 1.0)),
                )
            })
            .await?;
        return Ok(None);
    }
    Ok(Some((hunks, count)))
}

async fn summarize_file(
    chat: &dyn ChatModel,
    store: &StateStore,
    llm_pool: &Semaphore,
    file: &FileDiff,
    options: &ReviewOptions,
) -> Option<String> {
    let filename = file.filename.as_str();
    if mark_file(store, filename, FileStatus::Summarizing, None).await.is_err() {
        return None;
    }

    let base_tokens = estimate_tokens(&prompt::summarize_prompt(filename, ""));
    let budgeted =
        decompose_and_budget(store, filename, &file.patch, base_tokens, options.token_limit)
            .await
            .ok()?;
    let (hunks, count) = budgeted?;

    let packed = pack_patches(&hunks, &[], count, base_tokens, options.token_limit);
    let request = prompt::summarize_prompt(filename, &packed);

    let permit = llm_pool.acquire().await.expect("pool never closed");
    let result = chat_with_retry(chat, &request, options).await;
    drop(permit);

    match result {
        Ok(summary) => {
            mark_file(store, filename, FileStatus::Summarized, None).await.ok()?;
            Some(summary)
        }
        Err(message) => {
            warn!(file = %filename, error = %message, "summarize failed");
            fail_file(store, filename, &message).await;
            None
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn review_file(
    chat: &dyn ChatModel,
    github: Option<&GithubClient>,
    store: &StateStore,
    llm_pool: &Semaphore,
    github_pool: &Semaphore,
    file: &FileDiff,
    pr_title: &str,
    head_sha: &str,
    pr_url: Option<&PrUrl>,
    summary: Option<&str>,
    threads: Option<&Vec<(usize, String)>>,
    options: &ReviewOptions,
) -> Vec<ReviewComment> {
    let filename = file.filename.as_str();
    if mark_file(store, filename, FileStatus::Reviewing, None).await.is_err() {
        return Vec::new();
    }

    let base_tokens = prompt::base_prompt_tokens(pr_title, filename)
        + summary.map_or(0, estimate_tokens);
    let Ok(budgeted) =
        decompose_and_budget(store, filename, &file.patch, base_tokens, options.token_limit).await
    else {
        return Vec::new();
    };
    let Some((hunks, count)) = budgeted else {
        return Vec::new();
    };

    let chains = build_hunk_chains(&hunks, threads);
    let packed = pack_patches(&hunks, &chains, count, base_tokens, options.token_limit);
    let request = prompt::review_prompt(pr_title, filename, summary, &packed);

    let permit = llm_pool.acquire().await.expect("pool never closed");
    let result = chat_with_retry(chat, &request, options).await;
    drop(permit);

    let response = match result {
        Ok(response) => response,
        Err(message) => {
            warn!(file = %filename, error = %message, "review failed");
            fail_file(store, filename, &message).await;
            return Vec::new();
        }
    };

    let comments: Vec<ReviewComment> = parser::parse_review_response(&response, &hunks)
        .into_iter()
        .map(|review| ReviewComment {
            filename: filename.to_string(),
            start_line: review.start_line,
            end_line: review.end_line,
            text: review.comment,
        })
        .collect();
    debug!(file = %filename, comments = comments.len(), "parsed review response");

    if let (Some(github), Some(pr_url)) = (github, pr_url) {
        for comment in &comments {
            let permit = github_pool.acquire().await.expect("pool never closed");
            let posted = post_with_retry(github, pr_url, head_sha, comment, &options.retry).await;
            drop(permit);
            if let Err(message) = posted {
                warn!(file = %filename, error = %message, "failed to post review comment");
                fail_file(store, filename, &message).await;
                return comments;
            }
        }
    }

    let _ = mark_file(store, filename, FileStatus::Reviewed, None).await;
    comments
}

/// Attach existing comment-thread text to the hunk whose new range
/// contains the thread's anchor line.
fn build_hunk_chains(
    hunks: &[Hunk],
    threads: Option<&Vec<(usize, String)>>,
) -> Vec<Option<String>> {
    let Some(threads) = threads else {
        return vec![None; hunks.len()];
    };
    hunks
        .iter()
        .map(|hunk| {
            let texts: Vec<&str> = threads
                .iter()
                .filter(|(line, _)| *line >= hunk.new_start && *line <= hunk.new_end)
                .map(|(_, text)| text.as_str())
                .collect();
            if texts.is_empty() {
                None
            } else {
                Some(texts.join("\n"))
            }
        })
        .collect()
}

async fn mark_file(
    store: &StateStore,
    filename: &str,
    status: FileStatus,
    meta: Option<StatusMeta>,
) -> Result<ReviewState, crate::state::StateError> {
    store
        .apply(|s| update_file_status(s, filename, status, meta.clone()))
        .await
}

/// Record a per-file failure and surface it as the run's last error.
async fn fail_file(store: &StateStore, filename: &str, message: &str) {
    let result = store
        .apply(|s| {
            let next =
                update_file_status(s, filename, FileStatus::Failed, Some(StatusMeta::error(message)))?;
            Ok(record_error(&next, message))
        })
        .await;
    if let Err(err) = result {
        warn!(file = %filename, error = %err, "failed to record file failure");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StaticChatModel;

    fn file(filename: &str, patch: &str) -> FileDiff {
        FileDiff {
            filename: filename.to_string(),
            patch: patch.to_string(),
            additions: 0,
            deletions: 0,
            is_new: false,
            is_deleted: false,
        }
    }

    fn pull_request(files: Vec<FileDiff>) -> PullRequest {
        PullRequest {
            number: 7,
            title: "Add retry logic".to_string(),
            author: "alice".to_string(),
            head_sha: "abc123".to_string(),
            files_changed: files.len(),
            additions: 0,
            deletions: 0,
            files,
        }
    }

    const PATCH: &str = "@@ -1,2 +1,4 @@\n context\n+let added = 1;\n+let more = 2;\n context\n";

    fn runner(reply: &str, store: Arc<StateStore>) -> ReviewRunner {
        ReviewRunner::new(
            Arc::new(StaticChatModel::new(reply)),
            None,
            store,
            ReviewOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_full_run_reviews_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(StateStore::open(dir.path().join("state.json")));
        let runner = runner("2-3:\nConsider a constant here.\n", Arc::clone(&store));

        let pr = pull_request(vec![file("a.rs", PATCH), file("b.rs", PATCH)]);
        let outcome = runner.run(&pr, None).await.unwrap();

        assert!(is_review_complete(&outcome.state));
        assert_eq!(outcome.state.completed_files, 2);
        assert_eq!(outcome.state.failed_files, 0);
        assert_eq!(outcome.comments.len(), 2);
        assert!(outcome
            .comments
            .iter()
            .all(|c| c.text.contains("Consider a constant")));
        assert_eq!(outcome.summaries.len(), 2);
    }

    #[tokio::test]
    async fn test_oversized_file_is_skipped_not_failed() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(StateStore::open(dir.path().join("state.json")));
        let runner = ReviewRunner::new(
            Arc::new(StaticChatModel::new("1-1:\nok\n")),
            None,
            Arc::clone(&store),
            ReviewOptions {
                token_limit: 1,
                ..ReviewOptions::default()
            },
        );

        let pr = pull_request(vec![file("big.rs", PATCH)]);
        let outcome = runner.run(&pr, None).await.unwrap();

        assert_eq!(outcome.state.skipped_files, 1);
        assert_eq!(outcome.state.completed_files, 1);
        let entry = &outcome.state.files[0];
        assert_eq!(entry.status, FileStatus::Skipped);
        assert_eq!(entry.skip_reason.as_deref(), Some("diff too large"));
        assert!(outcome.comments.is_empty());
    }

    /// Counts provider calls so tests can assert nothing was re-billed.
    struct CountingChatModel {
        calls: std::sync::atomic::AtomicU32,
    }

    #[async_trait::async_trait]
    impl ChatModel for CountingChatModel {
        async fn chat(
            &self,
            _prompt: &str,
            _options: &ChatOptions,
        ) -> Result<String, crate::llm::LlmError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok("1-2:\nnote\n".to_string())
        }
    }

    #[tokio::test]
    async fn test_resume_does_not_rebill_completed_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        // First run completes both files.
        {
            let store = Arc::new(StateStore::open(&path));
            let runner = runner("1-2:\nnote\n", Arc::clone(&store));
            let pr = pull_request(vec![file("a.rs", PATCH), file("b.rs", PATCH)]);
            runner.run(&pr, None).await.unwrap();
        }

        // Second run over the same commit makes zero provider calls.
        let store = Arc::new(StateStore::open(&path));
        let prior = store.snapshot().await.unwrap();
        assert!(is_review_complete(&prior));
        assert!(!should_resume_review(true, Some(&prior)));

        let counting = Arc::new(CountingChatModel {
            calls: std::sync::atomic::AtomicU32::new(0),
        });
        let runner = ReviewRunner::new(
            Arc::clone(&counting) as Arc<dyn ChatModel>,
            None,
            store,
            ReviewOptions::default(),
        );
        let pr = pull_request(vec![file("a.rs", PATCH), file("b.rs", PATCH)]);
        let outcome = runner.run(&pr, None).await.unwrap();
        assert_eq!(counting.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert!(is_review_complete(&outcome.state));
    }

    #[tokio::test]
    async fn test_new_commit_supersedes_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        {
            let store = Arc::new(StateStore::open(&path));
            let runner = runner("1-2:\nnote\n", Arc::clone(&store));
            let pr = pull_request(vec![file("a.rs", PATCH)]);
            runner.run(&pr, None).await.unwrap();
        }

        let store = Arc::new(StateStore::open(&path));
        let runner = runner("1-2:\nnote\n", Arc::clone(&store));
        let mut pr = pull_request(vec![file("a.rs", PATCH)]);
        pr.head_sha = "def456".to_string();
        let outcome = runner.run(&pr, None).await.unwrap();
        assert_eq!(outcome.state.commit_id, "def456");
        assert_eq!(outcome.state.completed_files, 1);
    }

    /// Fails every call with a fixed message, counting attempts.
    struct FailingChatModel {
        message: &'static str,
        calls: std::sync::atomic::AtomicU32,
    }

    #[async_trait::async_trait]
    impl ChatModel for FailingChatModel {
        async fn chat(
            &self,
            _prompt: &str,
            _options: &ChatOptions,
        ) -> Result<String, crate::llm::LlmError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Err(crate::llm::LlmError::Status {
                status: 500,
                body: self.message.to_string(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_with_retry_gives_up_after_policy_cap() {
        let model = FailingChatModel {
            message: "strange failure",
            calls: std::sync::atomic::AtomicU32::new(0),
        };
        let result = chat_with_retry(&model, "prompt", &ReviewOptions::default()).await;
        assert!(result.is_err());
        // Unknown errors: 1 initial try + 2 retries.
        assert_eq!(model.calls.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_file_is_recorded_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(StateStore::open(dir.path().join("state.json")));
        let failing = Arc::new(FailingChatModel {
            message: "invalid model name",
            calls: std::sync::atomic::AtomicU32::new(0),
        });
        let runner = ReviewRunner::new(
            failing as Arc<dyn ChatModel>,
            None,
            Arc::clone(&store),
            ReviewOptions::default(),
        );

        let pr = pull_request(vec![file("a.rs", PATCH)]);
        let outcome = runner.run(&pr, None).await.unwrap();

        assert_eq!(outcome.state.failed_files, 1);
        assert!(is_review_complete(&outcome.state));
        let entry = &outcome.state.files[0];
        assert_eq!(entry.status, FileStatus::Failed);
        assert!(entry.error.as_deref().unwrap().contains("invalid model name"));
        assert!(outcome.state.last_error.is_some());
        assert!(outcome.comments.is_empty());
    }

    #[test]
    fn test_build_hunk_chains_matches_anchor_lines() {
        let hunks = decompose_patch(PATCH);
        let threads = vec![
            (2, "@bob: is this right?".to_string()),
            (99, "@eve: elsewhere".to_string()),
        ];
        let chains = build_hunk_chains(&hunks, Some(&threads));
        assert_eq!(chains.len(), hunks.len());
        assert!(chains[0].as_deref().unwrap().contains("@bob"));
        assert!(!chains[0].as_deref().unwrap().contains("@eve"));
    }
}
