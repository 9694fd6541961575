//! Chunking diff text before embedding.
//!
//! `code_chunk` splits at definition boundaries for a known language;
//! `token_chunk` is the generic whitespace-token window used for everything
//! else and whenever `code_chunk` fails.

use regex_lite::Regex;

use super::language::Language;
use crate::error::ChunkError;

/// Maximum whitespace tokens per generic chunk.
pub const TOKEN_CHUNK_SIZE: usize = 512;

/// Maximum characters per code chunk before a forced split.
pub const MAX_CODE_CHUNK_CHARS: usize = 4_000;

/// Split `text` into chunks at definition boundaries of `language`.
///
/// Diff markers (`+`, `-`, space) are stripped before matching, so added and
/// removed definitions both open a new chunk. Chunk text keeps its markers.
///
/// A chunk is only closed once it holds at least one changed line: file and
/// hunk headers and leading context stay with the change that follows them.
pub fn code_chunk(text: &str, language: Language) -> Result<Vec<String>, ChunkError> {
    if text.trim().is_empty() {
        return Err(ChunkError::Empty);
    }

    let boundary = Regex::new(language.definition_pattern()).map_err(|e| ChunkError::Pattern {
        language: language.as_str(),
        message: e.to_string(),
    })?;

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut has_change = false;

    for line in text.lines() {
        let code = strip_diff_marker(line);
        let opens_chunk = is_header(line) || boundary.is_match(code);
        let too_long = current.len() + line.len() + 1 > MAX_CODE_CHUNK_CHARS;

        if !current.is_empty() && ((has_change && opens_chunk) || too_long) {
            chunks.push(std::mem::take(&mut current));
            has_change = false;
        }
        current.push_str(line);
        current.push('\n');
        has_change |= is_change(line);
    }
    if !current.trim().is_empty() {
        chunks.push(current);
    }

    chunks.retain(|c| !c.trim().is_empty());
    if chunks.is_empty() {
        return Err(ChunkError::Empty);
    }
    Ok(chunks)
}

/// Split `text` into windows of at most `max_tokens` whitespace tokens.
pub fn token_chunk(text: &str, max_tokens: usize) -> Vec<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    tokens
        .chunks(max_tokens.max(1))
        .map(|window| window.join(" "))
        .collect()
}

fn is_file_header(line: &str) -> bool {
    line.starts_with("+++") || line.starts_with("---")
}

/// Lines outside hunk bodies: `diff --git`, `index`, `@@` and friends.
fn is_header(line: &str) -> bool {
    is_file_header(line)
        || !matches!(line.as_bytes().first(), None | Some(b'+' | b'-' | b' ' | b'\\'))
}

fn is_change(line: &str) -> bool {
    !is_file_header(line) && matches!(line.as_bytes().first(), Some(b'+' | b'-'))
}

fn strip_diff_marker(line: &str) -> &str {
    if is_file_header(line) {
        return "";
    }
    match line.as_bytes().first() {
        Some(b'+' | b'-' | b' ') => &line[1..],
        _ => line,
    }
}
