//! Prompt construction for per-file commit messages.

use regex_lite::Regex;

/// Maximum characters of diff text sent to the model.
pub const MAX_DIFF_PROMPT_CHARS: usize = 8_000;

/// Fixed system instruction for every completion.
pub const SYSTEM_PROMPT: &str = "You write git commit titles. \
Reply with exactly one line: a concise Conventional Commits title for the change. \
Rules: start with a conventional prefix (feat:, fix:, chore:, docs:, refactor:, test:, perf:, style:, build:, ci:); \
at most 70 characters in total; imperative mood (\"add\", \"fix\", \"remove\"); \
no trailing period; name what changed, never a bare generic verb such as \"update\" or \"change\" alone. \
Output only the title, with no quotes, markdown or explanation.";

/// Build the user prompt for one file's diff.
///
/// `exemplars` is the rendered block from similarity search; empty means no
/// similar history was found.
pub fn build_user_prompt(file_path: &str, diff_text: &str, exemplars: &str) -> String {
    let (sanitized, truncated) = sanitize_diff(diff_text, MAX_DIFF_PROMPT_CHARS);

    let truncation_note = if truncated {
        "\n\nNote: The diff was truncated due to size. Focus on the visible changes."
    } else {
        ""
    };

    let exemplar_section = if exemplars.trim().is_empty() {
        "No similar commits were found.".to_string()
    } else {
        format!("Commit messages of similar past changes, for style reference:\n\n{exemplars}")
    };

    format!(
        "File: {file_path}\n\n## Diff\n```\n{sanitized}\n```{truncation_note}\n\n## Similar Commits\n{exemplar_section}\n\nWrite the commit title for this file."
    )
}

/// Sanitize diff text for inclusion in a prompt.
///
/// Removes control characters (except newlines and tabs) and ANSI escape
/// sequences, then truncates to at most `max_chars` characters. Returns the
/// text and whether it was truncated.
pub fn sanitize_diff(text: &str, max_chars: usize) -> (String, bool) {
    let result = remove_control_chars(&remove_ansi_escapes(text));

    match result.char_indices().nth(max_chars) {
        Some((end, _)) => (result[..end].to_string(), true),
        None => (result, false),
    }
}

fn remove_ansi_escapes(text: &str) -> String {
    match Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]") {
        Ok(re) => re.replace_all(text, "").into_owned(),
        Err(_) => text.to_string(),
    }
}

fn remove_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}
