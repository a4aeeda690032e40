//! Integration tests over the snippet fixture tree
//!
//! These tests verify end-to-end behavior:
//! - Directory traversal and glob filtering
//! - Worst-first ordering
//! - min_complexity / top filters
//! - Oversized files are skipped, not fatal

use bigo_core::config::BigoConfig;
use bigo_core::{
    analyze_file, analyze_files, analyze_path, collect_source_files, AnalysisError,
    ComplexityClass, ResolvedConfig,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("tests/fixtures/snippets")
}

fn resolve(config: BigoConfig) -> ResolvedConfig {
    config.resolve().unwrap()
}

#[test]
fn test_analyze_fixture_tree() {
    let reports = analyze_path(&fixtures_dir(), &ResolvedConfig::defaults().unwrap()).unwrap();
    assert_eq!(reports.len(), 19);

    assert_eq!(reports[0].result.complexity, ComplexityClass::Exponential);
    assert!(reports[0].file.ends_with("fibonacci.js"));
    assert!(reports
        .windows(2)
        .all(|w| w[0].result.complexity >= w[1].result.complexity));

    let last = reports.last().unwrap();
    assert_eq!(last.result.complexity, ComplexityClass::Constant);
    assert_eq!(last.result.patterns, vec!["constant"]);
}

#[test]
fn test_analysis_is_deterministic() {
    let config = ResolvedConfig::defaults().unwrap();
    let first = analyze_path(&fixtures_dir(), &config).unwrap();
    let second = analyze_path(&fixtures_dir(), &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_min_complexity_and_top() {
    let config = resolve(BigoConfig {
        min_complexity: Some(ComplexityClass::Linearithmic),
        ..Default::default()
    });
    let reports = analyze_path(&fixtures_dir(), &config).unwrap();
    // 3 exponential, 3 quadratic, 4 linearithmic
    assert_eq!(reports.len(), 10);

    let config = resolve(BigoConfig {
        top: Some(2),
        ..Default::default()
    });
    let reports = analyze_path(&fixtures_dir(), &config).unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports
        .iter()
        .all(|r| r.result.complexity == ComplexityClass::Exponential));
}

#[test]
fn test_include_glob() {
    let config = resolve(BigoConfig {
        include: vec!["py/**".to_string()],
        ..Default::default()
    });
    let files = collect_source_files(&fixtures_dir(), &config).unwrap();
    assert_eq!(files.len(), 8);
    assert!(files
        .iter()
        .all(|f| f.extension().and_then(|e| e.to_str()) == Some("py")));
}

#[test]
fn test_exclude_glob() {
    let config = resolve(BigoConfig {
        exclude: vec!["js/**".to_string(), "py/**".to_string()],
        ..Default::default()
    });
    let files = collect_source_files(&fixtures_dir(), &config).unwrap();
    assert_eq!(files.len(), 3);
}

#[test]
fn test_single_file() {
    let path = fixtures_dir().join("go").join("bubble.go");
    let reports = analyze_path(&path, &ResolvedConfig::defaults().unwrap()).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].result.complexity, ComplexityClass::Quadratic);
    assert_eq!(reports[0].result.patterns, vec!["nested_loops"]);
}

#[test]
fn test_nonexistent_path_is_an_error() {
    let config = ResolvedConfig::defaults().unwrap();
    assert!(analyze_path(Path::new("/nonexistent/bigo/path"), &config).is_err());
}

#[test]
fn test_oversized_file_is_skipped() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("small.js"), "x = 1;\n").unwrap();
    std::fs::write(
        temp.path().join("large.js"),
        "for (const x of xs) { total += x; }\n",
    )
    .unwrap();

    let config = resolve(BigoConfig {
        max_input_bytes: Some(16),
        ..Default::default()
    });
    let reports = analyze_path(temp.path(), &config).unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].file.ends_with("small.js"));
}

#[test]
fn test_huge_file_is_rejected_before_reading() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("huge.js");
    let file = std::fs::File::create(&path).unwrap();
    // sparse; reading it into memory would take a gigabyte
    file.set_len(1 << 30).unwrap();

    let err = analyze_file(&path, &ResolvedConfig::defaults().unwrap()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<AnalysisError>(),
        Some(&AnalysisError::InputTooLarge {
            size: 1 << 30,
            limit: bigo_core::DEFAULT_MAX_INPUT_BYTES,
        })
    );
    assert!(format!("{err:#}").contains("huge.js"));
}

#[test]
fn test_progress_hook_sees_every_file() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("a.js"), "x = 1;\n").unwrap();
    std::fs::write(temp.path().join("b.py"), "for x in xs:\n    t += x\n").unwrap();
    std::fs::write(temp.path().join("c.js"), "for (;;) { for (;;) { step(); } }\n").unwrap();

    let config = resolve(BigoConfig {
        max_input_bytes: Some(24),
        ..Default::default()
    });
    let files = collect_source_files(temp.path(), &config).unwrap();
    let done = AtomicUsize::new(0);
    let reports = analyze_files(&files, &config, |_| {
        done.fetch_add(1, Ordering::Relaxed);
    });

    // c.js is over the limit: counted as done, left out of the reports
    assert_eq!(done.load(Ordering::Relaxed), 3);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].result.complexity, ComplexityClass::Linear);
    assert_eq!(reports, analyze_path(temp.path(), &config).unwrap());
}

#[test]
fn test_skipped_directories_and_unsupported_files() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    std::fs::create_dir_all(root.join("node_modules/lib")).unwrap();
    std::fs::create_dir_all(root.join(".cache")).unwrap();
    std::fs::write(root.join("node_modules/lib/index.js"), "x = 1;").unwrap();
    std::fs::write(root.join(".cache/a.py"), "x = 1").unwrap();
    std::fs::write(root.join("notes.md"), "for x in y:").unwrap();
    std::fs::write(root.join("types.d.ts"), "declare const x: number;").unwrap();
    std::fs::write(root.join("main.py"), "x = 1").unwrap();

    let files = collect_source_files(root, &ResolvedConfig::defaults().unwrap()).unwrap();
    assert_eq!(files, vec![root.join("main.py")]);
}
