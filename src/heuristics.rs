use crate::patch::{patch_start_end_line, split_patch};
use crate::pr::PullRequest;
use crate::report::types::{Finding, Severity};

/// Pattern scan over added lines. These are cheap lexical checks that
/// ride along with the LLM review and land in the run report; they do
/// not influence the review requests.
pub fn scan(pr: &PullRequest) -> Vec<Finding> {
    let mut findings = Vec::new();
    for file in &pr.files {
        for hunk in split_patch(&file.patch) {
            let Some(ranges) = patch_start_end_line(hunk) else {
                continue;
            };
            let mut line_number = ranges.new.start;
            for line in hunk.lines().skip(1) {
                if let Some(content) = line.strip_prefix('+') {
                    check_added_line(content, &file.filename, line_number, &mut findings);
                    line_number += 1;
                } else if !line.starts_with('-') {
                    line_number += 1;
                }
            }
        }
    }
    findings
}

fn check_added_line(content: &str, filename: &str, line: usize, findings: &mut Vec<Finding>) {
    let lower = content.to_lowercase();

    let secret_keys = ["password", "api_key", "secret", "token"];
    if secret_keys
        .iter()
        .any(|key| assigns_string_literal(&lower, key))
    {
        findings.push(Finding {
            message: "Possible hardcoded credential in added line".to_string(),
            file: Some(filename.to_string()),
            line: Some(line),
            severity: Severity::High,
        });
    }
    if content.contains("AKIA") {
        findings.push(Finding {
            message: "Possible AWS access key in added line".to_string(),
            file: Some(filename.to_string()),
            line: Some(line),
            severity: Severity::High,
        });
    }

    if content.contains("unsafe {") || content.contains("unsafe fn") {
        findings.push(Finding {
            message: "New unsafe block introduced".to_string(),
            file: Some(filename.to_string()),
            line: Some(line),
            severity: Severity::Medium,
        });
    }

    if lower.contains("shell=true") || lower.contains("shell = true") {
        findings.push(Finding {
            message: "Possible command injection: subprocess with shell=True".to_string(),
            file: Some(filename.to_string()),
            line: Some(line),
            severity: Severity::High,
        });
    }

    let trimmed = content.trim_start();
    if (content.contains("eval(") || content.contains("exec("))
        && !trimmed.starts_with("//")
        && !trimmed.starts_with('#')
    {
        findings.push(Finding {
            message: "Possible code injection: eval/exec usage detected".to_string(),
            file: Some(filename.to_string()),
            line: Some(line),
            severity: Severity::High,
        });
    }

    let sql_keywords = ["select ", "insert ", "update ", "delete "];
    if content.contains("format!") && sql_keywords.iter().any(|kw| lower.contains(kw)) {
        findings.push(Finding {
            message: "Possible SQL injection: query built with string interpolation".to_string(),
            file: Some(filename.to_string()),
            line: Some(line),
            severity: Severity::High,
        });
    }
}

/// Matches `key = "..."` / `key: "..."` shapes with flexible spacing.
fn assigns_string_literal(lower: &str, key: &str) -> bool {
    let Some(pos) = lower.find(key) else {
        return false;
    };
    let rest = lower[pos + key.len()..].trim_start();
    let rest = match rest.strip_prefix('=').or_else(|| rest.strip_prefix(':')) {
        Some(rest) => rest.trim_start(),
        None => return false,
    };
    rest.starts_with('"') && rest.len() > 1
}
