mod config;
mod heuristics;
mod llm;
mod patch;
mod pr;
mod report;
mod retry;
mod review;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

use llm::{ChatModel, OpenAiChatModel, StaticChatModel};
use review::{ReviewRunner, RunOutcome};
use state::store::StateStore;

/// PR Reviewer — CLI tool that takes a GitHub Pull Request URL, sends the
/// diff to an LLM in token-budgeted chunks, and posts line-anchored
/// review comments. Per-file progress is persisted so an interrupted run
/// resumes without re-billing completed files.
#[derive(Parser, Debug)]
#[command(name = "pr-reviewer", version, about)]
struct Cli {
    /// GitHub Pull Request URL (e.g., https://github.com/org/repo/pull/42)
    ///
    /// Not required when --mock is used.
    pr_url: Option<String>,

    /// Optional output file path for a markdown run summary
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Review a built-in mock PR with a canned model (no tokens needed)
    #[arg(long)]
    r#mock: bool,

    /// Ignore persisted state and review every file again
    #[arg(long)]
    no_resume: bool,

    /// Run the review but do not post anything to GitHub
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.r#mock {
        info!("using mock PR data for demo");
        return run_mock(&cli).await;
    }

    let pr_url = cli.pr_url.as_deref().ok_or(
        "PR URL is required unless --mock is used. Usage: pr-reviewer <URL> or pr-reviewer --mock",
    )?;
    let _main_span = info_span!("pr_review", pr_url = %pr_url).entered();

    info!("parsing PR URL");
    let parsed_url = pr::parse_pr_url(pr_url)?;
    debug!(owner = %parsed_url.owner, repo = %parsed_url.repo, pr = parsed_url.pr_number, "parsed PR URL");

    info!("loading configuration");
    let config = config::Config::load()?;
    let github_token = config.github_token().ok_or(pr::PrError::MissingToken)?;
    let api_key = config.llm_api_key().ok_or(llm::LlmError::MissingKey)?;

    let github = Arc::new(pr::GithubClient::new(github_token));

    info!("fetching pull request from GitHub");
    let pull_request = github.fetch_pull_request(&parsed_url).await?;
    info!(
        files = pull_request.files_changed,
        additions = pull_request.additions,
        deletions = pull_request.deletions,
        commit = %pull_request.head_sha,
        "fetched PR metadata"
    );

    let chat: Arc<dyn ChatModel> = Arc::new(OpenAiChatModel::new(
        config.llm.base_url.clone(),
        api_key,
    ));
    let store = Arc::new(StateStore::open(config.state_path(pull_request.number)));
    let options = config.review_options(cli.no_resume.then_some(false));

    let posting = !cli.dry_run;
    let runner = ReviewRunner::new(
        chat,
        posting.then(|| Arc::clone(&github)),
        store,
        options,
    );

    info!(dry_run = cli.dry_run, "running review");
    let outcome = runner.run(&pull_request, Some(&parsed_url)).await?;

    if posting {
        let body = summary_comment_body(&outcome);
        github.post_summary_comment(&parsed_url, &body).await?;
    }

    finish(&cli, &pull_request, outcome)
}

/// Review the embedded sample diff with a canned model. Exercises the
/// whole pipeline (decompose, pack, parse, map, state) without tokens
/// or network.
async fn run_mock(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let pull_request = build_mock_pr()?;

    let chat: Arc<dyn ChatModel> = Arc::new(StaticChatModel::new(
        "2-3:\nValidate `redirect_uri` against an allowlist before storing it.\n---\n19-20:\nThe session token is written to the log in plain text.\n",
    ));
    let store = Arc::new(StateStore::open(
        std::env::temp_dir().join("pr-reviewer-mock-state.json"),
    ));
    let mut options = review::ReviewOptions::default();
    // The demo should always run end to end, never resume.
    options.resume = false;

    let runner = ReviewRunner::new(chat, None, store, options);
    let outcome = runner.run(&pull_request, None).await?;
    finish(cli, &pull_request, outcome)
}

/// Shared tail of both paths: heuristics, report, exit.
fn finish(
    cli: &Cli,
    pull_request: &pr::PullRequest,
    outcome: RunOutcome,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("running heuristic scanners");
    let findings = heuristics::scan(pull_request);
    info!(findings = findings.len(), "heuristic scan complete");

    let summary = report::build(&outcome.state, pull_request, outcome.comments.len(), findings);
    report::output(&summary, cli.output.as_deref())?;
    info!(
        complete = summary.complete,
        comments = summary.comments,
        "done"
    );
    Ok(())
}

fn summary_comment_body(outcome: &RunOutcome) -> String {
    let state = &outcome.state;
    let mut body = format!(
        "## PR Reviewer\n\nReviewed {} of {} files ({} failed, {} skipped), {} comments.\n",
        state.completed_files,
        state.total_files,
        state.failed_files,
        state.skipped_files,
        outcome.comments.len()
    );
    if !outcome.summaries.is_empty() {
        body.push_str("\n### Change summaries\n");
        let mut files: Vec<_> = outcome.summaries.iter().collect();
        files.sort_by(|a, b| a.0.cmp(b.0));
        for (filename, summary) in files {
            body.push_str(&format!("\n**`{filename}`** — {summary}\n"));
        }
    }
    body
}

/// Build a mock PullRequest from the embedded sample diff fixture.
fn build_mock_pr() -> Result<pr::PullRequest, Box<dyn std::error::Error>> {
    let diff_text = include_str!("../tests/fixtures/sample_diff.patch");
    let files = pr::diff::parse_diff(diff_text)?;
    let additions: usize = files.iter().map(|f| f.additions).sum();
    let deletions: usize = files.iter().map(|f| f.deletions).sum();

    Ok(pr::PullRequest {
        number: 42,
        title: "Add OAuth2 login flow".to_string(),
        author: "alice".to_string(),
        head_sha: "0000000000000000000000000000000000000042".to_string(),
        files_changed: files.len(),
        additions,
        deletions,
        files,
    })
}
