//! Turning similar-diff rows into prompt exemplars.

use serde_json::{Map, Value};

/// Upper bound on exemplars per file.
pub const MAX_EXEMPLARS: usize = 5;

/// A historical commit similar to the diff being described.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimilarityExample {
    pub file_path: String,
    pub commit_message: String,
    pub summary: String,
}

impl SimilarityExample {
    /// Build from a JSON row; `None` for non-objects and rows with neither
    /// a commit message nor a summary.
    pub fn from_row(row: &Value) -> Option<Self> {
        let obj = row.as_object()?;
        let example = Self {
            file_path: field(obj, &["filePath", "file_path"]),
            commit_message: field(obj, &["commitMessage", "commit_message"]),
            summary: field(obj, &["summary"]),
        };

        if example.commit_message.is_empty() && example.summary.is_empty() {
            None
        } else {
            Some(example)
        }
    }

    pub fn render(&self) -> String {
        format!(
            "file:{}\nmessage:{}\nsummary:{}",
            self.file_path, self.commit_message, self.summary
        )
    }
}

fn field(obj: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Rows of a query response: a top-level array, or the first array-valued
/// field of a top-level object.
pub fn rows(response: Value) -> Vec<Value> {
    match response {
        Value::Array(rows) => rows,
        Value::Object(obj) => obj
            .into_iter()
            .find_map(|(_, v)| match v {
                Value::Array(rows) => Some(rows),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Usable exemplars among the first [`MAX_EXEMPLARS`] rows.
pub fn extract_exemplars(rows: &[Value]) -> Vec<SimilarityExample> {
    rows.iter()
        .take(MAX_EXEMPLARS)
        .filter_map(SimilarityExample::from_row)
        .collect()
}

/// One block per exemplar, separated by a blank line.
pub fn render_exemplars(examples: &[SimilarityExample]) -> String {
    examples
        .iter()
        .map(SimilarityExample::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}
