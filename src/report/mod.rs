pub mod types;

pub use types::{Finding, RunSummary, Severity};

use crate::pr::PullRequest;
use crate::state::{FileStatus, ReviewState};
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Merge the final review state, comment count, and heuristic findings
/// into a RunSummary.
pub fn build(
    state: &ReviewState,
    pr: &PullRequest,
    comments: usize,
    findings: Vec<Finding>,
) -> RunSummary {
    let failures = state
        .files
        .iter()
        .filter(|f| f.status == FileStatus::Failed)
        .map(|f| {
            (
                f.filename.clone(),
                f.error.clone().unwrap_or_else(|| "unknown error".to_string()),
            )
        })
        .collect();
    let skips = state
        .files
        .iter()
        .filter(|f| f.status == FileStatus::Skipped)
        .map(|f| {
            (
                f.filename.clone(),
                f.skip_reason
                    .clone()
                    .unwrap_or_else(|| "no reason recorded".to_string()),
            )
        })
        .collect();

    RunSummary {
        pr_number: pr.number,
        pr_title: pr.title.clone(),
        author: pr.author.clone(),
        files_changed: pr.files_changed,
        additions: pr.additions,
        deletions: pr.deletions,
        total_files: state.total_files,
        completed_files: state.completed_files,
        failed_files: state.failed_files,
        skipped_files: state.skipped_files,
        comments,
        complete: state.completed_files + state.failed_files == state.total_files,
        failures,
        skips,
        findings,
    }
}

/// Output the summary to terminal (default) or to a markdown file.
#[instrument(skip(summary), fields(pr = summary.pr_number))]
pub fn output(summary: &RunSummary, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing run summary to terminal");
            print_terminal_summary(summary);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing run summary to file");
            write_markdown_summary(summary, path)
        }
    }
}

fn print_terminal_summary(summary: &RunSummary) {
    println!();
    println!("PR #{}: \"{}\"", summary.pr_number, summary.pr_title);
    println!(
        "Author: {} | Files changed: {} | +{} -{}",
        summary.author, summary.files_changed, summary.additions, summary.deletions
    );
    println!();

    println!("═══ Review Run ═══");
    let status = if summary.complete {
        "COMPLETE".green().bold()
    } else {
        "INCOMPLETE".yellow().bold()
    };
    println!("Status: {}", status);
    println!(
        "Files: {} total | {} completed | {} failed | {} skipped",
        summary.total_files, summary.completed_files, summary.failed_files, summary.skipped_files
    );
    println!("Review comments: {}", summary.comments);
    for (filename, error) in &summary.failures {
        println!("  {} {} — {}", "✗".red(), filename, error);
    }
    for (filename, reason) in &summary.skips {
        println!("  {} {} — {}", "~".yellow(), filename, reason);
    }
    println!();

    println!("═══ Heuristic Findings ═══");
    if summary.findings.is_empty() {
        println!("  No findings.");
    } else {
        for finding in &summary.findings {
            let location = match (&finding.file, finding.line) {
                (Some(f), Some(l)) => format!(" ({}:{})", f, l),
                (Some(f), None) => format!(" ({})", f),
                _ => String::new(),
            };
            println!(
                "  • [{}] {}{}",
                colorize_severity(finding.severity),
                finding.message,
                location
            );
        }
    }
    println!();
}

fn write_markdown_summary(summary: &RunSummary, path: &Path) -> Result<(), ReportError> {
    let mut md = String::new();
    md.push_str(&format!(
        "# PR #{}: \"{}\"\n\n",
        summary.pr_number, summary.pr_title
    ));
    md.push_str(&format!(
        "**Author:** {} | **Files changed:** {} | **+{} -{}**\n\n",
        summary.author, summary.files_changed, summary.additions, summary.deletions
    ));

    md.push_str("## Review Run\n\n");
    md.push_str(&format!(
        "**Status: {}**\n\n",
        if summary.complete { "COMPLETE" } else { "INCOMPLETE" }
    ));
    md.push_str(&format!(
        "Files: {} total | {} completed | {} failed | {} skipped\n\n",
        summary.total_files, summary.completed_files, summary.failed_files, summary.skipped_files
    ));
    md.push_str(&format!("Review comments: {}\n\n", summary.comments));
    for (filename, error) in &summary.failures {
        md.push_str(&format!("- ❌ `{}` — {}\n", filename, error));
    }
    for (filename, reason) in &summary.skips {
        md.push_str(&format!("- ⏭ `{}` — {}\n", filename, reason));
    }
    if !summary.failures.is_empty() || !summary.skips.is_empty() {
        md.push('\n');
    }

    md.push_str("## Heuristic Findings\n\n");
    if summary.findings.is_empty() {
        md.push_str("No findings.\n");
    } else {
        for finding in &summary.findings {
            let location = match (&finding.file, finding.line) {
                (Some(f), Some(l)) => format!(" (`{}:{}`)", f, l),
                (Some(f), None) => format!(" (`{}`)", f),
                _ => String::new(),
            };
            md.push_str(&format!(
                "- **[{}]** {}{}\n",
                finding.severity, finding.message, location
            ));
        }
    }

    std::fs::write(path, md)?;
    Ok(())
}

fn colorize_severity(level: Severity) -> colored::ColoredString {
    match level {
        Severity::High => "HIGH".red().bold(),
        Severity::Medium => "MEDIUM".yellow().bold(),
        Severity::Low => "LOW".green().bold(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{create_review_state, update_file_status, StatusMeta};

    fn sample_pr() -> PullRequest {
        PullRequest {
            number: 42,
            title: "Add OAuth2 login flow".to_string(),
            author: "alice".to_string(),
            head_sha: "abc".to_string(),
            files_changed: 3,
            additions: 320,
            deletions: 45,
            files: vec![],
        }
    }

    fn sample_state() -> ReviewState {
        let files: Vec<String> = ["a.rs", "b.rs", "c.rs"].iter().map(|s| s.to_string()).collect();
        let state = create_review_state("abc", &files);
        let state = update_file_status(&state, "a.rs", FileStatus::Reviewed, None).unwrap();
        let state = update_file_status(
            &state,
            "b.rs",
            FileStatus::Failed,
            Some(StatusMeta::error("Rate limit exceeded")),
        )
        .unwrap();
        update_file_status(
            &state,
            "c.rs",
            FileStatus::Skipped,
            Some(StatusMeta::skip("diff too large", 1.0)),
        )
        .unwrap()
    }

    #[test]
    fn test_build_summary_from_state() {
        let summary = build(&sample_state(), &sample_pr(), 5, vec![]);
        assert_eq!(summary.total_files, 3);
        assert_eq!(summary.completed_files, 2);
        assert_eq!(summary.failed_files, 1);
        assert_eq!(summary.skipped_files, 1);
        assert_eq!(summary.comments, 5);
        assert!(summary.complete);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].1, "Rate limit exceeded");
        assert_eq!(summary.skips[0].1, "diff too large");
    }

    #[test]
    fn test_write_markdown_summary() {
        let findings = vec![Finding {
            message: "Possible hardcoded credential".to_string(),
            file: Some("src/auth.rs".to_string()),
            line: Some(12),
            severity: Severity::High,
        }];
        let summary = build(&sample_state(), &sample_pr(), 2, findings);

        let dir = std::env::temp_dir();
        let path = dir.join("test_run_summary.md");
        write_markdown_summary(&summary, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("# PR #42"));
        assert!(content.contains("**Author:** alice"));
        assert!(content.contains("Review comments: 2"));
        assert!(content.contains("`b.rs` — Rate limit exceeded"));
        assert!(content.contains("`c.rs` — diff too large"));
        assert!(content.contains("**[HIGH]** Possible hardcoded credential"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_terminal_summary_does_not_panic() {
        let summary = build(&sample_state(), &sample_pr(), 0, vec![]);
        print_terminal_summary(&summary);
    }

    #[test]
    fn test_output_to_file() {
        let summary = build(&sample_state(), &sample_pr(), 0, vec![]);
        let dir = std::env::temp_dir();
        let path = dir.join("test_run_output.md");
        output(&summary, Some(&path)).unwrap();
        assert!(path.exists());
        std::fs::remove_file(&path).ok();
    }
}
