use std::fmt;

use serde::Serialize;

use crate::data::error::EngineError;
use crate::data::events::{Notice, NoticeLevel};
use crate::data::types::{BatchError, BatchResult};

/// Result of a finished bulk run, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSummary {
    pub action: &'static str,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<BatchError>,
}

impl BulkSummary {
    pub fn new(action: &'static str, result: BatchResult) -> Self {
        Self {
            action,
            total: result.total(),
            succeeded: result.success_count,
            failed: result.fail_count,
            errors: result.errors,
        }
    }

    /// Toast for the host: success when nothing failed, warning otherwise
    pub fn notice(&self) -> Notice {
        if self.failed == 0 {
            Notice::new(
                NoticeLevel::Success,
                format!("Bulk {}: {} record(s) succeeded", self.action, self.succeeded),
            )
        } else {
            Notice::new(
                NoticeLevel::Warning,
                format!(
                    "Bulk {}: {} succeeded, {} failed",
                    self.action, self.succeeded, self.failed
                ),
            )
        }
    }

    /// Text table of the counts, followed by one row per failed item
    pub fn render_table(&self) -> String {
        let counts = [
            ("Total".to_string(), self.total.to_string()),
            ("Succeeded".to_string(), self.succeeded.to_string()),
            ("Failed".to_string(), self.failed.to_string()),
        ];
        let mut out = render_rows(("Metric", "Count"), &counts);

        if self.failed > 0 {
            let rows: Vec<(String, String)> = self
                .errors
                .iter()
                .map(|e| (e.index.to_string(), e.error.clone()))
                .collect();
            out.push('\n');
            out.push_str(&render_rows(("Item", "Error"), &rows));
        }
        out
    }

    /// Per-item failures as engine errors
    pub fn item_errors(&self) -> impl Iterator<Item = EngineError> + '_ {
        self.errors.iter().map(|e| EngineError::Operation {
            index: e.index,
            message: e.error.clone(),
        })
    }
}

impl fmt::Display for BulkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_table())
    }
}

fn render_rows(headers: (&str, &str), rows: &[(String, String)]) -> String {
    let left = rows
        .iter()
        .map(|(l, _)| l.chars().count())
        .chain([headers.0.len()])
        .max()
        .unwrap_or_default();
    let right = rows
        .iter()
        .map(|(_, r)| r.chars().count())
        .chain([headers.1.len()])
        .max()
        .unwrap_or_default();

    let rule = format!("+-{}-+-{}-+\n", "-".repeat(left), "-".repeat(right));
    let line = |l: &str, r: &str| format!("| {:<left$} | {:<right$} |\n", l, r);

    let mut out = String::new();
    out.push_str(&rule);
    out.push_str(&line(headers.0, headers.1));
    out.push_str(&rule);
    for (l, r) in rows {
        out.push_str(&line(l, r));
    }
    out.push_str(&rule);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(success: usize, failures: &[(usize, &str)]) -> BatchResult {
        let mut result = BatchResult::default();
        for _ in 0..success {
            result.record_success();
        }
        for (index, error) in failures {
            result.record_failure(*index, *error);
        }
        result
    }

    #[test]
    fn test_counts_table_without_errors() {
        let summary = BulkSummary::new("update", result(3, &[]));

        assert_eq!(
            summary.render_table(),
            "+-----------+-------+\n\
             | Metric    | Count |\n\
             +-----------+-------+\n\
             | Total     | 3     |\n\
             | Succeeded | 3     |\n\
             | Failed    | 0     |\n\
             +-----------+-------+\n"
        );
        assert_eq!(summary.notice().level, NoticeLevel::Success);
    }

    #[test]
    fn test_error_rows_follow_counts() {
        let summary = BulkSummary::new("delete", result(2, &[(1, "HTTP 500: boom")]));
        let table = summary.render_table();

        assert!(table.contains("| Failed    | 1     |"));
        assert!(table.contains("| Item | Error          |"));
        assert!(table.contains("| 1    | HTTP 500: boom |"));
        assert_eq!(summary.notice().level, NoticeLevel::Warning);
        assert_eq!(
            summary.notice().message,
            "Bulk delete: 2 succeeded, 1 failed"
        );
    }

    #[test]
    fn test_item_errors() {
        let summary = BulkSummary::new("update", result(0, &[(4, "gone")]));
        let errors: Vec<String> = summary.item_errors().map(|e| e.user_message()).collect();
        assert_eq!(errors, vec!["Item 4: gone"]);
    }
}
