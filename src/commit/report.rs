//! The structured result of a split run.

use serde::Serialize;

/// One applied commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitEntry {
    pub file: String,
    pub message: String,
}

/// Commits applied by a run, in commit order.
///
/// Only holds entries for commits that already exist in the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    pub commits: Vec<CommitEntry>,
}

impl CommitReport {
    pub fn push(&mut self, file: impl Into<String>, message: impl Into<String>) {
        self.commits.push(CommitEntry {
            file: file.into(),
            message: message.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// `{"commits": [{"file": ..., "message": ...}, ...]}`
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"commits":[]}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_json_shape() {
        let mut report = CommitReport::default();
        report.push("a.txt", "feat: add a");
        report.push("b.txt", "Update b.txt");

        let value: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"commits": [
                {"file": "a.txt", "message": "feat: add a"},
                {"file": "b.txt", "message": "Update b.txt"}
            ]})
        );
    }

    #[test]
    fn test_empty_report() {
        let report = CommitReport::default();
        assert!(report.is_empty());
        assert_eq!(report.to_json(), r#"{"commits":[]}"#);
    }
}
