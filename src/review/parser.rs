use super::mapper::{map_review_to_patch, Review};
use crate::patch::Hunk;

/// Parse raw LLM review text into patch-mapped reviews.
///
/// The response grammar is a sequence of blocks separated by `---` lines.
/// Each block opens with a `<start>-<end>:` marker line; following lines
/// up to the next marker or separator are the comment body. Text before
/// the first marker is discarded. Each parsed record is reconciled with
/// the file's hunks; output order matches block encounter order.
pub fn parse_review_response(response: &str, hunks: &[Hunk]) -> Vec<Review> {
    let mut reviews = Vec::new();
    let mut current: Option<(usize, usize, Vec<&str>)> = None;

    let mut flush = |block: Option<(usize, usize, Vec<&str>)>, out: &mut Vec<Review>| {
        if let Some((start, end, body)) = block {
            let comment = sanitize_comment(body.join("\n").trim());
            if let Some(review) = map_review_to_patch(start, end, &comment, hunks) {
                out.push(review);
            }
        }
    };

    for line in response.lines() {
        if line.trim() == "---" {
            flush(current.take(), &mut reviews);
            continue;
        }
        if let Some((start, end)) = parse_range_marker(line) {
            flush(current.take(), &mut reviews);
            current = Some((start, end, Vec::new()));
            continue;
        }
        if let Some((_, _, body)) = current.as_mut() {
            body.push(line);
        }
        // Lines before the first marker fall through and are discarded.
    }
    flush(current.take(), &mut reviews);

    reviews
}

/// Match a `<digits>-<digits>:` marker line. Trailing whitespace is
/// allowed; anything else on the line is not.
fn parse_range_marker(line: &str) -> Option<(usize, usize)> {
    let trimmed = line.trim_end();
    let range = trimmed.strip_suffix(':')?;
    let (start, end) = range.split_once('-')?;
    if start.is_empty() || end.is_empty() {
        return None;
    }
    if !start.bytes().all(|b| b.is_ascii_digit()) || !end.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((start.parse().ok()?, end.parse().ok()?))
}

/// Strip the `"<digits>: "` per-line prefixes the model tends to echo
/// from the numbered input, but only inside fenced suggestion/diff
/// blocks where they would corrupt the proposed code.
fn sanitize_comment(comment: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_fence = false;

    for line in comment.lines() {
        if !in_fence {
            let fence = line.trim_start();
            if fence == "```suggestion" || fence == "```diff" {
                in_fence = true;
            }
            out.push(line.to_string());
        } else if line.trim() == "```" {
            in_fence = false;
            out.push(line.to_string());
        } else {
            out.push(strip_line_number_prefix(line));
        }
    }

    out.join("\n")
}

fn strip_line_number_prefix(line: &str) -> String {
    let stripped = line.trim_start_matches(' ');
    let digits = stripped.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = stripped[digits..].strip_prefix(": ") {
            return rest.to_string();
        }
    }
    line.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hunks() -> Vec<Hunk> {
        vec![
            Hunk {
                old_start: 1,
                old_end: 10,
                new_start: 1,
                new_end: 50,
                old_text: String::new(),
                new_text: String::new(),
            },
            Hunk {
                old_start: 60,
                old_end: 70,
                new_start: 60,
                new_end: 70,
                old_text: String::new(),
                new_text: String::new(),
            },
        ]
    }

    #[test]
    fn test_parses_blocks_in_order() {
        let response = "10-12:\nFirst issue here.\n---\n61-62:\nSecond issue.\n";
        let reviews = parse_review_response(response, &hunks());
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].start_line, 10);
        assert_eq!(reviews[0].comment, "First issue here.");
        assert_eq!(reviews[1].start_line, 61);
        assert_eq!(reviews[1].comment, "Second issue.");
    }

    #[test]
    fn test_discards_preamble_before_first_marker() {
        let response = "Here is my review of the changes:\n\n10-12:\nThe real comment.\n";
        let reviews = parse_review_response(response, &hunks());
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].comment, "The real comment.");
    }

    #[test]
    fn test_marker_without_separator_starts_new_block() {
        let response = "10-11:\nfirst\n12-13:\nsecond\n";
        let reviews = parse_review_response(response, &hunks());
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].comment, "first");
        assert_eq!(reviews[1].comment, "second");
    }

    #[test]
    fn test_marker_allows_trailing_whitespace_only() {
        assert_eq!(parse_range_marker("10-12:   "), Some((10, 12)));
        assert_eq!(parse_range_marker("10-12:"), Some((10, 12)));
        assert_eq!(parse_range_marker("10-12: note"), None);
        assert_eq!(parse_range_marker("  10-12:"), None);
        assert_eq!(parse_range_marker("a-12:"), None);
        assert_eq!(parse_range_marker("10:"), None);
    }

    #[test]
    fn test_sanitizes_numbered_lines_in_suggestion_fence() {
        let response = "10-12:\nUse a constant:\n```suggestion\n10: const LIMIT: u32 = 5;\n11:     check(LIMIT);\n```\n";
        let reviews = parse_review_response(response, &hunks());
        assert_eq!(reviews.len(), 1);
        assert!(reviews[0].comment.contains("const LIMIT: u32 = 5;"));
        assert!(reviews[0].comment.contains("    check(LIMIT);"));
        assert!(!reviews[0].comment.contains("10: const"));
    }

    #[test]
    fn test_sanitizes_diff_fence_but_not_plain_fences() {
        let response = "10-12:\n```diff\n10: -old\n```\nAnd outside text 10: stays.\n```\n12: untouched fence\n```\n";
        let reviews = parse_review_response(response, &hunks());
        let comment = &reviews[0].comment;
        assert!(comment.contains("-old"));
        assert!(!comment.contains("10: -old"));
        assert!(comment.contains("And outside text 10: stays."));
        assert!(comment.contains("12: untouched fence"));
    }

    #[test]
    fn test_out_of_range_block_is_remapped() {
        let response = "300-310:\nOut of the diff entirely.\n";
        let reviews = parse_review_response(response, &hunks());
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].start_line, 1);
        assert_eq!(reviews[0].end_line, 50);
        assert!(reviews[0].comment.contains("no overlapping patch"));
    }

    #[test]
    fn test_empty_response_yields_nothing() {
        assert!(parse_review_response("", &hunks()).is_empty());
        assert!(parse_review_response("no markers at all", &hunks()).is_empty());
    }
}
