use super::Hunk;

/// Delimiters of the outbound request body. The model is instructed to
/// treat each change section as one reviewable unit.
pub const NEW_HUNK_DELIMITER: &str = "---new_hunk---";
pub const OLD_HUNK_DELIMITER: &str = "---old_hunk---";
pub const COMMENT_CHAINS_DELIMITER: &str = "---comment_chains---";
pub const END_SECTION_DELIMITER: &str = "---end_change_section---";

/// Rough token estimate: ~4 bytes per token for code-heavy text.
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / 4
}

fn hunk_tokens(hunk: &Hunk) -> usize {
    estimate_tokens(&hunk.new_text) + estimate_tokens(&hunk.old_text)
}

/// How many hunks fit cumulatively under `limit`, starting from
/// `base_tokens` already spent on the surrounding prompt.
///
/// Hunks are taken in original order and never split or reordered; the
/// first hunk that would exceed the limit stops the scan.
pub fn patches_to_pack(hunks: &[Hunk], base_tokens: usize, limit: usize) -> usize {
    let mut total = base_tokens;
    let mut count = 0;
    for hunk in hunks {
        let cost = hunk_tokens(hunk);
        if total + cost > limit {
            break;
        }
        total += cost;
        count += 1;
    }
    count
}

/// Assemble the first `count` hunks into the outbound request body.
///
/// `chains` carries optional per-hunk comment-thread context, aligned by
/// hunk index. A chain is included only while it still fits the remaining
/// budget; when it does not, the chain is dropped and the hunk kept.
pub fn pack_patches(
    hunks: &[Hunk],
    chains: &[Option<String>],
    count: usize,
    base_tokens: usize,
    limit: usize,
) -> String {
    let mut body = String::new();
    let mut total = base_tokens;

    for (i, hunk) in hunks.iter().take(count).enumerate() {
        let section = format!(
            "{NEW_HUNK_DELIMITER}\n```\n{}\n```\n{OLD_HUNK_DELIMITER}\n```\n{}\n```\n",
            hunk.new_text, hunk.old_text
        );
        total += estimate_tokens(&section);
        body.push_str(&section);

        if let Some(chain) = chains.get(i).and_then(|c| c.as_deref()) {
            let chain_section =
                format!("{COMMENT_CHAINS_DELIMITER}\n```\n{chain}\n```\n");
            let chain_cost = estimate_tokens(&chain_section);
            if total + chain_cost <= limit {
                total += chain_cost;
                body.push_str(&chain_section);
            }
        }

        body.push_str(END_SECTION_DELIMITER);
        body.push('\n');
    }

    body
}
