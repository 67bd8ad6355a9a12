use crate::patch::Hunk;

/// A final, patch-mapped `(range, comment)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub start_line: usize,
    pub end_line: usize,
    pub comment: String,
}

/// Reconcile an externally reported line range with the file's real hunk
/// boundaries.
///
/// The hunk with the greatest overlap wins (first seen on ties). A range
/// fully contained in a hunk passes through unchanged; a partial overlap
/// is remapped to that hunk's bounds with a note disclosing the original
/// range; no overlap at all falls back to the first hunk. Total for any
/// non-empty hunk list.
pub fn map_review_to_patch(
    start_line: usize,
    end_line: usize,
    comment: &str,
    hunks: &[Hunk],
) -> Option<Review> {
    if hunks.is_empty() {
        return None;
    }

    let requested_length = end_line.saturating_sub(start_line) + 1;

    let mut best_hunk = None;
    let mut best_intersection = 0;
    for hunk in hunks {
        let lo = start_line.max(hunk.new_start);
        let hi = end_line.min(hunk.new_end);
        let intersection = (hi + 1).saturating_sub(lo);
        if intersection > best_intersection {
            best_intersection = intersection;
            best_hunk = Some(hunk);
        }
    }

    if best_intersection == requested_length {
        return Some(Review {
            start_line,
            end_line,
            comment: comment.to_string(),
        });
    }

    match best_hunk {
        Some(hunk) => Some(Review {
            start_line: hunk.new_start,
            end_line: hunk.new_end,
            comment: format!(
                "> Note: comment was outside the diff and was mapped to the change with the greatest overlap. Original lines [{start_line}-{end_line}]\n\n{comment}"
            ),
        }),
        None => {
            let first = &hunks[0];
            Some(Review {
                start_line: first.new_start,
                end_line: first.new_end,
                comment: format!(
                    "> Note: no overlapping patch found for this comment. Original lines [{start_line}-{end_line}]\n\n{comment}"
                ),
            })
        }
    }
}
