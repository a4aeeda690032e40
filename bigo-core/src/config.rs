//! Project configuration
//!
//! A project may carry `.bigorc.json` or `bigo.config.json` at its root; the
//! first one present wins. `--config FILE` bypasses discovery. Every field is
//! optional and command-line flags override whatever the file says.
//!
//! ```json
//! {
//!   "include": ["src/**"],
//!   "exclude": ["**/generated/**"],
//!   "max_input_bytes": 131072,
//!   "min_complexity": "O(n log n)",
//!   "top": 25,
//!   "profile": "brace-language"
//! }
//! ```

use crate::complexity::ComplexityClass;
use crate::language::ProfileId;
use crate::DEFAULT_MAX_INPUT_BYTES;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upper bound for `max_input_bytes` (16 MiB)
pub const MAX_INPUT_BYTES_CEILING: usize = 16 * 1024 * 1024;

/// Looked up in this order in the project root
pub const CONFIG_FILE_NAMES: [&str; 2] = [".bigorc.json", "bigo.config.json"];

/// Skipped unless the config lists its own excludes
const DEFAULT_EXCLUDES: &[&str] = &[
    "**/node_modules/**",
    "**/vendor/**",
    "**/dist/**",
    "**/build/**",
    "**/target/**",
    "**/__pycache__/**",
    "**/*.min.js",
    "**/*.bundle.js",
];

/// Raw contents of a config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BigoConfig {
    /// When non-empty, only matching paths are analysed
    pub include: Vec<String>,
    /// Replaces the built-in excludes when non-empty
    pub exclude: Vec<String>,
    pub max_input_bytes: Option<usize>,
    pub min_complexity: Option<ComplexityClass>,
    pub top: Option<usize>,
    /// Use one rule table for every file
    pub profile: Option<ProfileId>,
}

/// Config with globs compiled and defaults filled in
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub include: Option<GlobSet>,
    pub exclude: GlobSet,
    pub max_input_bytes: usize,
    pub min_complexity: Option<ComplexityClass>,
    pub top_n: Option<usize>,
    pub profile: Option<ProfileId>,
    /// None when running on defaults
    pub config_path: Option<PathBuf>,
}

fn compile_globs<S: AsRef<str>>(patterns: &[S], field: &str) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let glob =
            Glob::new(pattern).with_context(|| format!("invalid {field} pattern: {pattern}"))?;
        builder.add(glob);
    }
    builder
        .build()
        .with_context(|| format!("failed to compile {field} patterns"))
}

impl BigoConfig {
    pub fn validate(&self) -> Result<()> {
        match self.max_input_bytes {
            Some(0) => anyhow::bail!("max_input_bytes must be at least 1"),
            Some(limit) if limit > MAX_INPUT_BYTES_CEILING => anyhow::bail!(
                "max_input_bytes must not exceed {} (got {})",
                MAX_INPUT_BYTES_CEILING,
                limit
            ),
            _ => {}
        }

        if self.top == Some(0) {
            anyhow::bail!("top must be at least 1");
        }

        compile_globs(&self.include, "include")?;
        compile_globs(&self.exclude, "exclude")?;
        Ok(())
    }

    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let include = if self.include.is_empty() {
            None
        } else {
            Some(compile_globs(&self.include, "include")?)
        };
        let exclude = if self.exclude.is_empty() {
            compile_globs(DEFAULT_EXCLUDES, "exclude")?
        } else {
            compile_globs(&self.exclude, "exclude")?
        };

        Ok(ResolvedConfig {
            include,
            exclude,
            max_input_bytes: self.max_input_bytes.unwrap_or(DEFAULT_MAX_INPUT_BYTES),
            min_complexity: self.min_complexity,
            top_n: self.top,
            profile: self.profile,
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Defaults only, no file consulted
    pub fn defaults() -> Result<Self> {
        BigoConfig::default().resolve()
    }

    /// Whether a path (relative to the analysed root) passes the globs.
    /// Excludes are checked first.
    pub fn accepts(&self, relative: &Path) -> bool {
        if self.exclude.is_match(relative) {
            return false;
        }
        self.include
            .as_ref()
            .map_or(true, |include| include.is_match(relative))
    }
}

/// First config file present in `project_root`, if any
pub fn find_config_file(project_root: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| project_root.join(name))
        .find(|candidate| candidate.is_file())
}

/// Read, parse and validate one config file
pub fn read_config(path: &Path) -> Result<BigoConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let config: BigoConfig = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config in {}", path.display()))?;
    Ok(config)
}

/// Resolve the config for `project_root`.
///
/// An explicit `config_path` must exist; otherwise the first discovered file is
/// used, falling back to defaults.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let source = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(project_root),
    };

    let config = match &source {
        Some(path) => read_config(path)?,
        None => BigoConfig::default(),
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source;
    tracing::debug!(config = ?resolved.config_path, "resolved configuration");
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parse(json: &str) -> BigoConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_empty_object_resolves_to_defaults() {
        let resolved = parse("{}").resolve().unwrap();
        assert!(resolved.include.is_none());
        assert_eq!(resolved.max_input_bytes, DEFAULT_MAX_INPUT_BYTES);
        assert_eq!(resolved.min_complexity, None);
        assert_eq!(resolved.top_n, None);
        assert_eq!(resolved.profile, None);
    }

    #[test]
    fn test_every_field() {
        let resolved = parse(
            r#"{
                "include": ["src/**/*.ts", "src/**/*.py"],
                "exclude": ["**/generated/**"],
                "max_input_bytes": 131072,
                "min_complexity": "quadratic",
                "top": 20,
                "profile": "python-like"
            }"#,
        )
        .resolve()
        .unwrap();
        assert!(resolved.include.is_some());
        assert_eq!(resolved.max_input_bytes, 131_072);
        assert_eq!(resolved.min_complexity, Some(ComplexityClass::Quadratic));
        assert_eq!(resolved.top_n, Some(20));
        assert_eq!(resolved.profile, Some(ProfileId::PythonLike));
    }

    #[test]
    fn test_unknown_keys_and_values() {
        assert!(serde_json::from_str::<BigoConfig>(r#"{"threshold": 3}"#).is_err());
        assert!(serde_json::from_str::<BigoConfig>(r#"{"min_complexity": "O(n^3)"}"#).is_err());
        assert!(serde_json::from_str::<BigoConfig>(r#"{"profile": "lisp"}"#).is_err());
    }

    #[test]
    fn test_input_limit_bounds() {
        let with_limit = |limit| BigoConfig {
            max_input_bytes: Some(limit),
            ..Default::default()
        };
        assert!(with_limit(0).validate().is_err());
        assert!(with_limit(1).validate().is_ok());
        assert!(with_limit(MAX_INPUT_BYTES_CEILING).validate().is_ok());
        assert!(with_limit(MAX_INPUT_BYTES_CEILING + 1).validate().is_err());
    }

    #[test]
    fn test_zero_top_and_bad_glob() {
        assert!(parse(r#"{"top": 0}"#).validate().is_err());
        let err = parse(r#"{"exclude": ["a/[b"]}"#).validate().unwrap_err();
        assert!(format!("{err:#}").contains("invalid exclude pattern"));
    }

    #[test]
    fn test_builtin_excludes() {
        let resolved = ResolvedConfig::defaults().unwrap();
        assert!(!resolved.accepts(Path::new("web/node_modules/pkg/index.js")));
        assert!(!resolved.accepts(Path::new("static/app.min.js")));
        assert!(!resolved.accepts(Path::new("py/__pycache__/mod.py")));
        assert!(resolved.accepts(Path::new("src/sort.ts")));
        assert!(resolved.accepts(Path::new("algos/search.py")));
    }

    #[test]
    fn test_custom_globs_replace_builtins() {
        let resolved = parse(r#"{"include": ["src/**/*.py"], "exclude": ["src/gen/**"]}"#)
            .resolve()
            .unwrap();
        assert!(resolved.accepts(Path::new("src/graph.py")));
        assert!(!resolved.accepts(Path::new("lib/util.py")));
        assert!(!resolved.accepts(Path::new("src/gen/tables.py")));

        let resolved = parse(r#"{"exclude": ["legacy/**"]}"#).resolve().unwrap();
        assert!(resolved.accepts(Path::new("dist/bundle.js")));
        assert!(!resolved.accepts(Path::new("legacy/old.js")));
    }

    #[test]
    fn test_rc_file_wins_over_config_json() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_config_file(dir.path()), None);

        fs::write(dir.path().join("bigo.config.json"), r#"{"top": 2}"#).unwrap();
        assert_eq!(
            find_config_file(dir.path()),
            Some(dir.path().join("bigo.config.json"))
        );

        fs::write(dir.path().join(".bigorc.json"), r#"{"top": 1}"#).unwrap();
        let resolved = load_and_resolve(dir.path(), None).unwrap();
        assert_eq!(resolved.top_n, Some(1));
        assert_eq!(resolved.config_path, Some(dir.path().join(".bigorc.json")));
    }

    #[test]
    fn test_no_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = load_and_resolve(dir.path(), None).unwrap();
        assert!(resolved.config_path.is_none());
        assert_eq!(resolved.max_input_bytes, DEFAULT_MAX_INPUT_BYTES);
    }

    #[test]
    fn test_explicit_path_skips_discovery() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".bigorc.json"), r#"{"top": 1}"#).unwrap();
        let explicit = dir.path().join("ci.json");
        fs::write(&explicit, r#"{"max_input_bytes": 1024}"#).unwrap();

        let resolved = load_and_resolve(dir.path(), Some(&explicit)).unwrap();
        assert_eq!(resolved.max_input_bytes, 1024);
        assert_eq!(resolved.top_n, None);
        assert_eq!(resolved.config_path, Some(explicit));
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(load_and_resolve(dir.path(), Some(&missing)).is_err());
    }

    #[test]
    fn test_invalid_file_names_the_field() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".bigorc.json"), r#"{"max_input_bytes": 0}"#).unwrap();

        let err = load_and_resolve(dir.path(), None).unwrap_err();
        assert!(format!("{err:#}").contains("max_input_bytes"));
    }
}
