//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Deterministic output ordering
//! - Byte-for-byte identical output across runs

use crate::complexity::ComplexityClass;
use crate::language::ProfileId;
use crate::AnalysisResult;
use serde::{Deserialize, Serialize};

/// Classification of one file or stdin snippet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SnippetReport {
    pub file: String,
    pub profile: ProfileId,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

/// Sort reports deterministically
pub fn sort_reports(mut reports: Vec<SnippetReport>) -> Vec<SnippetReport> {
    reports.sort_by(|a, b| {
        // 1. Complexity descending
        b.result
            .complexity
            .cmp(&a.result.complexity)
            // 2. File path ascending
            .then_with(|| a.file.cmp(&b.file))
    });
    reports
}

/// Drop reports below `min_complexity`, then keep the first `top` (input must be sorted).
pub fn apply_filters(
    reports: Vec<SnippetReport>,
    min_complexity: Option<ComplexityClass>,
    top: Option<usize>,
) -> Vec<SnippetReport> {
    let filtered = reports
        .into_iter()
        .filter(|r| min_complexity.map_or(true, |min| r.result.complexity >= min));
    match top {
        Some(n) => filtered.take(n).collect(),
        None => filtered.collect(),
    }
}

/// Render reports as text output
pub fn render_text(reports: &[SnippetReport], explain: bool) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<11} {:<15} {:<30} {}\n",
        "COMPLEXITY", "PROFILE", "FILE", "PATTERNS"
    ));

    for report in reports {
        output.push_str(&format!(
            "{:<11} {:<15} {:<30} {}\n",
            report.result.complexity.as_str(),
            report.profile.as_str(),
            truncate_or_pad(&report.file, 30),
            report.result.patterns.join(", "),
        ));
        if explain {
            output.push_str(&format!("            {}\n", report.result.explanation));
        }
    }

    output
}

/// Render reports as JSON output
pub fn render_json(reports: &[SnippetReport]) -> String {
    serde_json::to_string_pretty(reports).unwrap_or_else(|_| "[]".to_string())
}

/// One compact JSON object per line
pub fn render_jsonl(reports: &[SnippetReport]) -> String {
    let mut output = String::new();
    for report in reports {
        if let Ok(line) = serde_json::to_string(report) {
            output.push_str(&line);
            output.push('\n');
        }
    }
    output
}

/// Truncate or pad string to fixed width
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        format!("{:<width$}", s, width = width)
    }
}
