use super::types::FileDiff;
use super::PrError;

/// Parse a raw multi-file unified diff into per-file entries.
///
/// Each file section starts with `diff --git a/{path} b/{path}`; new
/// files have `--- /dev/null`, deleted files `+++ /dev/null`. Everything
/// from a file's first `@@` header to its next `diff --git` line is kept
/// verbatim as that file's `patch` text for the hunk decomposer.
pub fn parse_diff(raw_diff: &str) -> Result<Vec<FileDiff>, PrError> {
    if raw_diff.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let mut current: Option<FileDiff> = None;
    let mut in_hunks = false;

    for line in raw_diff.lines() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            if let Some(file) = current.take() {
                files.push(file);
            }
            in_hunks = false;

            let mut parts = rest.split_whitespace();
            let a_path = parts
                .next()
                .ok_or_else(|| PrError::DiffParse("Missing a/ path in diff header".to_string()))?;
            let b_path = parts
                .next()
                .ok_or_else(|| PrError::DiffParse("Missing b/ path in diff header".to_string()))?;
            let filename = b_path
                .strip_prefix("b/")
                .or_else(|| a_path.strip_prefix("a/"))
                .unwrap_or(b_path)
                .to_string();
            current = Some(FileDiff {
                filename,
                patch: String::new(),
                additions: 0,
                deletions: 0,
                is_new: false,
                is_deleted: false,
            });
            continue;
        }

        let Some(file) = current.as_mut() else {
            continue;
        };

        if line.starts_with("@@") {
            in_hunks = true;
            file.patch.push_str(line);
            file.patch.push('\n');
            continue;
        }

        if !in_hunks {
            if let Some(path) = line.strip_prefix("--- ") {
                if path.trim() == "/dev/null" {
                    file.is_new = true;
                }
            } else if let Some(path) = line.strip_prefix("+++ ") {
                if path.trim() == "/dev/null" {
                    file.is_deleted = true;
                }
            }
            continue;
        }

        if line.starts_with('+') || line.starts_with('-') || line.starts_with(' ') || line.is_empty()
        {
            file.patch.push_str(line);
            file.patch.push('\n');
            if line.starts_with('+') {
                file.additions += 1;
            } else if line.starts_with('-') {
                file.deletions += 1;
            }
        }
    }

    if let Some(file) = current.take() {
        files.push(file);
    }
    Ok(files)
}
