pub mod pack;

/// An inclusive line range within one side of a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRange {
    pub start: usize,
    pub end: usize,
}

/// Old/new line ranges parsed from a `@@ -a,b +c,d @@` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRanges {
    pub old: HunkRange,
    pub new: HunkRange,
}

/// One contiguous change region of a file's diff, with its rendered
/// old/new text blocks.
///
/// Added and context lines in `new_text` carry `"<line>: "` prefixes so a
/// reviewer (human or model) can anchor comments to exact new-file lines.
/// The first and last 3 context lines of a hunk that contains additions
/// are left unnumbered; a pure-removal hunk numbers every line.
#[derive(Debug, Clone, PartialEq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_end: usize,
    pub new_start: usize,
    pub new_end: usize,
    pub old_text: String,
    pub new_text: String,
}

/// The ordered hunks belonging to one file's diff.
pub type PatchSet = Vec<Hunk>;

/// Context lines at each edge of a hunk left unnumbered when the hunk
/// contains additions.
const EDGE_CONTEXT: usize = 3;

/// Split a raw per-file patch into hunk substrings.
///
/// Each line parsing as a `@@ -a,b +c,d @@` header starts a new substring
/// running to the next header or end of input, so concatenating the
/// returned slices reconstructs the input (for header-led patches). Zero
/// headers yields an empty vec.
pub fn split_patch(patch: &str) -> Vec<&str> {
    let mut starts = Vec::new();
    let mut offset = 0;
    for line in patch.split_inclusive('\n') {
        let content = line.strip_suffix('\n').unwrap_or(line);
        let content = content.strip_suffix('\r').unwrap_or(content);
        if parse_hunk_header(content).is_some() {
            starts.push(offset);
        }
        offset += line.len();
    }

    let mut hunks = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(patch.len());
        hunks.push(&patch[start..end]);
    }
    hunks
}

/// Parse the first hunk header found in `hunk`, or `None` when the text
/// contains no well-formed header.
pub fn patch_start_end_line(hunk: &str) -> Option<HunkRanges> {
    hunk.lines().find_map(parse_hunk_header)
}

/// Parse one `@@ -a,b +c,d @@` line. An omitted count defaults to 1.
fn parse_hunk_header(line: &str) -> Option<HunkRanges> {
    let rest = line.strip_prefix("@@ -")?;
    let (old_part, rest) = rest.split_once(" +")?;
    let (new_part, _) = rest.split_once(" @@")?;

    let (old_start, old_count) = parse_range(old_part)?;
    let (new_start, new_count) = parse_range(new_part)?;

    Some(HunkRanges {
        old: HunkRange {
            start: old_start,
            end: (old_start + old_count).saturating_sub(1),
        },
        new: HunkRange {
            start: new_start,
            end: (new_start + new_count).saturating_sub(1),
        },
    })
}

fn parse_range(part: &str) -> Option<(usize, usize)> {
    let (start_str, count_str) = match part.split_once(',') {
        Some((start, count)) => (start, count),
        None => (part, "1"),
    };
    let start = start_str.parse::<usize>().ok()?;
    let count = count_str.parse::<usize>().ok()?;
    Some((start, count))
}

/// Rendered old/new text blocks for one hunk.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedHunk {
    pub old_text: String,
    pub new_text: String,
}

/// Render a hunk's body into old/new text blocks.
///
/// `-` lines go to the old block unnumbered; `+` lines go to the new
/// block as `"<line>: <content>"`; context lines go to both, numbered in
/// the new block only when the hunk is removal-only or the line sits
/// outside the first-3/last-3 edge window. The new-line counter starts at
/// the header's new start and advances on every added or context line.
///
/// Returns `None` when `hunk` has no well-formed header.
pub fn render_hunk(hunk: &str) -> Option<RenderedHunk> {
    let ranges = patch_start_end_line(hunk)?;

    let lines: Vec<&str> = hunk
        .lines()
        .skip_while(|line| parse_hunk_header(line).is_none())
        .skip(1)
        .collect();
    let total = lines.len();
    let removal_only = !lines.iter().any(|line| line.starts_with('+'));

    let mut old_text = String::new();
    let mut new_text = String::new();
    let mut new_line = ranges.new.start;

    for (i, line) in lines.iter().enumerate() {
        let pos = i + 1;
        if let Some(content) = line.strip_prefix('-') {
            push_line(&mut old_text, content);
        } else if let Some(content) = line.strip_prefix('+') {
            push_line(&mut new_text, &format!("{new_line}: {content}"));
            new_line += 1;
        } else {
            let content = line.strip_prefix(' ').unwrap_or(line);
            push_line(&mut old_text, content);
            let numbered =
                removal_only || (pos > EDGE_CONTEXT && pos + EDGE_CONTEXT <= total);
            if numbered {
                push_line(&mut new_text, &format!("{new_line}: {content}"));
            } else {
                push_line(&mut new_text, content);
            }
            new_line += 1;
        }
    }

    Some(RenderedHunk { old_text, new_text })
}

fn push_line(block: &mut String, line: &str) {
    if !block.is_empty() {
        block.push('\n');
    }
    block.push_str(line);
}

/// Decompose a file's raw patch into rendered hunks. Malformed hunk
/// substrings are skipped rather than failing the file.
pub fn decompose_patch(patch: &str) -> PatchSet {
    split_patch(patch)
        .into_iter()
        .filter_map(|text| {
            let ranges = patch_start_end_line(text)?;
            let rendered = render_hunk(text)?;
            Some(Hunk {
                old_start: ranges.old.start,
                old_end: ranges.old.end,
                new_start: ranges.new.start,
                new_end: ranges.new.end,
                old_text: rendered.old_text,
                new_text: rendered.new_text,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_HUNK_PATCH: &str = "@@ -1,4 +1,5 @@\n context a\n-removed\n+added one\n+added two\n context b\n@@ -10,3 +11,3 @@\n context c\n-old line\n+new line\n context d\n";

    #[test]
    fn test_split_patch_counts_headers() {
        let hunks = split_patch(TWO_HUNK_PATCH);
        assert_eq!(hunks.len(), 2);
        assert!(hunks[0].starts_with("@@ -1,4 +1,5 @@"));
        assert!(hunks[1].starts_with("@@ -10,3 +11,3 @@"));
    }

    #[test]
    fn test_split_patch_concatenation_reconstructs_input() {
        let hunks = split_patch(TWO_HUNK_PATCH);
        assert_eq!(hunks.concat(), TWO_HUNK_PATCH);
    }

    #[test]
    fn test_split_patch_no_headers() {
        assert!(split_patch("just some text\nwith no headers\n").is_empty());
        assert!(split_patch("").is_empty());
    }

    #[test]
    fn test_split_patch_ignores_malformed_headers() {
        let patch = "@@ garbage @@\n@@ -1,2 +1,2 @@\n context\n";
        let hunks = split_patch(patch);
        assert_eq!(hunks.len(), 1);
        assert!(hunks[0].starts_with("@@ -1,2"));
    }

    #[test]
    fn test_header_end_is_start_plus_length_minus_one() {
        let ranges = patch_start_end_line("@@ -3,4 +7,2 @@ fn main()").unwrap();
        assert_eq!(ranges.old, HunkRange { start: 3, end: 6 });
        assert_eq!(ranges.new, HunkRange { start: 7, end: 8 });
    }

    #[test]
    fn test_header_omitted_count_defaults_to_one() {
        let ranges = patch_start_end_line("@@ -3 +7 @@").unwrap();
        assert_eq!(ranges.old, HunkRange { start: 3, end: 3 });
        assert_eq!(ranges.new, HunkRange { start: 7, end: 7 });
    }

    #[test]
    fn test_header_invalid_yields_none() {
        assert!(patch_start_end_line("no header here").is_none());
        assert!(patch_start_end_line("@@ -a,b +c,d @@").is_none());
        assert!(patch_start_end_line("@@ -1,2 +3,4").is_none());
    }

    #[test]
    fn test_render_numbers_added_lines_from_new_start() {
        let hunk = "@@ -1,2 +1,4 @@\n context\n+first add\n+second add\n context\n";
        let rendered = render_hunk(hunk).unwrap();
        // Counter: context=1, adds=2 and 3, trailing context=4.
        assert!(rendered.new_text.contains("2: first add"));
        assert!(rendered.new_text.contains("3: second add"));
        assert_eq!(rendered.old_text, "context\ncontext");
    }

    #[test]
    fn test_render_suppresses_numbers_at_hunk_edges() {
        // 8 body lines with an addition: positions 1-3 and 6-8 are context
        // inside the edge window, position 5 context is numbered.
        let hunk = "@@ -1,7 +1,8 @@\n c1\n c2\n c3\n+added\n c4\n c5\n c6\n c7\n";
        let rendered = render_hunk(hunk).unwrap();
        let lines: Vec<&str> = rendered.new_text.lines().collect();
        assert_eq!(lines[0], "c1");
        assert_eq!(lines[1], "c2");
        assert_eq!(lines[2], "c3");
        assert_eq!(lines[3], "4: added");
        assert_eq!(lines[4], "5: c4");
        assert_eq!(lines[5], "c5");
        assert_eq!(lines[6], "c6");
        assert_eq!(lines[7], "c7");
    }

    #[test]
    fn test_render_removal_only_numbers_every_line() {
        let hunk = "@@ -1,3 +1,2 @@\n c1\n-gone\n c2\n";
        let rendered = render_hunk(hunk).unwrap();
        let lines: Vec<&str> = rendered.new_text.lines().collect();
        assert_eq!(lines, vec!["1: c1", "2: c2"]);
        assert_eq!(rendered.old_text, "c1\ngone\nc2");
    }

    #[test]
    fn test_render_counter_increments_per_added_and_context_line() {
        let hunk = "@@ -5,2 +9,4 @@\n ctx\n+a\n+b\n ctx\n";
        let rendered = render_hunk(hunk).unwrap();
        assert!(rendered.new_text.contains("10: a"));
        assert!(rendered.new_text.contains("11: b"));
    }

    #[test]
    fn test_render_no_header_yields_none() {
        assert!(render_hunk("not a hunk").is_none());
    }

    #[test]
    fn test_decompose_patch_skips_malformed_hunks() {
        let hunks = decompose_patch(TWO_HUNK_PATCH);
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].new_start, 1);
        assert_eq!(hunks[0].new_end, 5);
        assert_eq!(hunks[1].new_start, 11);
        assert_eq!(hunks[1].new_end, 13);
    }

    #[test]
    fn test_decompose_empty_patch() {
        assert!(decompose_patch("").is_empty());
    }
}
