//! bigo core library - heuristic worst-case complexity estimation for code snippets

// Global invariants enforced in this crate:
// - Classification is a pure function of the input text
// - Rule tables are immutable process-wide statics
// - Comments, string contents and blank lines must not affect results
// - Identical input yields byte-for-byte identical output

pub mod complexity;
pub mod config;
pub mod discover;
pub mod error;
pub mod explain;
pub mod language;
pub mod matcher;
pub mod report;
pub mod resolver;
pub mod rules;
pub mod source;
pub mod structure;

pub use complexity::ComplexityClass;
pub use config::ResolvedConfig;
pub use discover::collect_source_files;
pub use error::AnalysisError;
pub use language::{select_profile, ProfileId};
pub use report::{render_json, render_jsonl, render_text, sort_reports, SnippetReport};
pub use rules::PatternRule;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Default input ceiling in bytes
pub const DEFAULT_MAX_INPUT_BYTES: usize = 65_536;

/// Estimated complexity of one snippet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub complexity: ComplexityClass,
    /// Matched pattern types, deduplicated, in rule-table order; never empty
    pub patterns: Vec<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    pub max_input_bytes: usize,
    /// Skip profile selection and use this rule table
    pub profile: Option<ProfileId>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            profile: None,
        }
    }
}

/// Result plus the profile and rules that produced it
#[derive(Debug)]
pub struct SnippetAnalysis {
    pub profile: ProfileId,
    /// Every matched rule (weights included), in table order
    pub matched: Vec<&'static PatternRule>,
    pub result: AnalysisResult,
}

/// Estimate the worst-case complexity of `source` with default options.
///
/// Fails only when the input exceeds [`DEFAULT_MAX_INPUT_BYTES`].
pub fn estimate_complexity(source: &str) -> Result<AnalysisResult, AnalysisError> {
    analyze_snippet(source, &AnalysisOptions::default()).map(|analysis| analysis.result)
}

/// Classify one snippet, exposing the selected profile and matched rules
pub fn analyze_snippet(
    source: &str,
    options: &AnalysisOptions,
) -> Result<SnippetAnalysis, AnalysisError> {
    if source.len() > options.max_input_bytes {
        return Err(AnalysisError::InputTooLarge {
            size: source.len(),
            limit: options.max_input_bytes,
        });
    }

    let profile = options
        .profile
        .unwrap_or_else(|| language::select_profile(source));
    let matched = matcher::match_rules(source, rules::profile(profile));
    let resolution = resolver::resolve(&matched);

    let mut patterns: Vec<String> = Vec::new();
    for rule in &resolution.rules {
        if !patterns.iter().any(|p| p == rule.pattern_type) {
            patterns.push(rule.pattern_type.to_string());
        }
    }
    let explanation = explain::explain(resolution.complexity, &resolution.rules);

    tracing::debug!(
        %profile,
        complexity = %resolution.complexity,
        patterns = ?patterns,
        "classified snippet"
    );

    Ok(SnippetAnalysis {
        profile,
        result: AnalysisResult {
            complexity: resolution.complexity,
            patterns,
            explanation,
        },
        matched,
    })
}

/// Read `reader` as UTF-8, buffering at most `limit + 1` bytes.
///
/// Returns `Ok(None)` when the input is longer than `limit`.
pub fn read_source<R: Read>(reader: R, limit: usize) -> Result<Option<String>> {
    let mut bytes = Vec::new();
    reader
        .take(limit as u64 + 1)
        .read_to_end(&mut bytes)
        .context("failed to read input")?;
    if bytes.len() > limit {
        return Ok(None);
    }
    String::from_utf8(bytes)
        .map(Some)
        .context("input is not valid UTF-8")
}

/// Classify one file on disk.
///
/// Oversized files are rejected from their metadata before any content is
/// read. The profile comes from the config override, then the file
/// extension, then content-based selection.
pub fn analyze_file(path: &Path, config: &ResolvedConfig) -> Result<SnippetReport> {
    let limit = config.max_input_bytes;
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
    if size > limit {
        return Err(anyhow::Error::new(AnalysisError::InputTooLarge { size, limit })
            .context(format!("failed to analyze {}", path.display())));
    }

    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let source = read_source(file, limit)
        .with_context(|| format!("failed to read {}", path.display()))?
        .with_context(|| {
            format!(
                "{} grew past the input limit of {} bytes",
                path.display(),
                limit
            )
        })?;

    let options = AnalysisOptions {
        max_input_bytes: limit,
        profile: config.profile.or_else(|| ProfileId::from_path(path)),
    };
    let analysis = analyze_snippet(&source, &options)
        .with_context(|| format!("failed to analyze {}", path.display()))?;

    Ok(SnippetReport {
        file: path.display().to_string(),
        profile: analysis.profile,
        result: analysis.result,
    })
}

/// Classify `files` in parallel, calling `on_done` as each one finishes.
///
/// Unreadable and oversized files are logged and skipped. Reports come back
/// sorted worst-first and filtered by the config's `min_complexity`/`top`.
pub fn analyze_files<F>(
    files: &[PathBuf],
    config: &ResolvedConfig,
    on_done: F,
) -> Vec<SnippetReport>
where
    F: Fn(&Path) + Sync,
{
    let outcomes: Vec<Result<SnippetReport>> = files
        .par_iter()
        .map(|file| {
            let outcome = analyze_file(file, config);
            on_done(file);
            outcome
        })
        .collect();

    let mut reports = Vec::with_capacity(outcomes.len());
    let mut skipped_files = 0usize;
    for outcome in outcomes {
        match outcome {
            Ok(report) => reports.push(report),
            Err(e) => {
                tracing::warn!("skipping file: {:#}", e);
                skipped_files += 1;
            }
        }
    }
    if skipped_files > 0 {
        tracing::warn!("skipped {} file(s) due to analysis errors", skipped_files);
    }

    report::apply_filters(sort_reports(reports), config.min_complexity, config.top_n)
}

/// Analyze a file or directory tree; see [`analyze_files`].
pub fn analyze_path(path: &Path, config: &ResolvedConfig) -> Result<Vec<SnippetReport>> {
    let files = collect_source_files(path, config)?;
    Ok(analyze_files(&files, config, |_| {}))
}
