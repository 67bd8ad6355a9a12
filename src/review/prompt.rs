/// Prompt templates for the two phases. The review template pins the
/// response grammar the parser expects.

/// Instructions shared by every review request.
const REVIEW_INSTRUCTIONS: &str = "\
Provide review feedback on the new code in the change sections below.
New code lines carry `<line>: ` prefixes; use those numbers for ranges.
Respond ONLY with blocks of this exact form, separated by `---` lines:

<start_line>-<end_line>:
<comment text>
---

Use ```suggestion fences for concrete replacement code. If a change
section needs no comment, emit nothing for it.";

pub fn summarize_prompt(filename: &str, packed_diff: &str) -> String {
    format!(
        "Summarize the changes to `{filename}` in at most 3 sentences, \
focusing on behavior and intent rather than mechanics.\n\n{packed_diff}"
    )
}

pub fn review_prompt(pr_title: &str, filename: &str, summary: Option<&str>, packed_diff: &str) -> String {
    let summary_section = match summary {
        Some(text) => format!("\n\nSummary of changes to this file:\n{text}"),
        None => String::new(),
    };
    format!(
        "You are reviewing a pull request titled \"{pr_title}\".\n\
File under review: `{filename}`.{summary_section}\n\n\
{REVIEW_INSTRUCTIONS}\n\n{packed_diff}"
    )
}

/// Token cost of a phase's fixed prompt scaffolding, before any hunks
/// are packed.
pub fn base_prompt_tokens(pr_title: &str, filename: &str) -> usize {
    crate::patch::pack::estimate_tokens(&review_prompt(pr_title, filename, None, ""))
}
