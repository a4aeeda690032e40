//! Source file discovery
//!
//! Walks a directory tree without following symlinks, keeping files whose
//! extension maps to a rule table and whose root-relative path passes the
//! configured globs. Output is sorted so parallel analysis downstream cannot
//! change report order.

use crate::config::ResolvedConfig;
use crate::language::ProfileId;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Dependency, build and cache directories; dot-directories are skipped too.
const SKIPPED_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    "dist",
    "build",
    "out",
    "coverage",
    "target",
    "__pycache__",
];

/// True when the file name maps to a rule table.
///
/// TypeScript declaration files carry no bodies and are never analysed.
pub fn is_source_file(name: &str) -> bool {
    if name.ends_with(".d.ts") {
        return false;
    }
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ProfileId::from_extension)
        .is_some()
}

fn is_skipped_dir(name: &str) -> bool {
    name.starts_with('.') || SKIPPED_DIRS.contains(&name)
}

/// Source files at or under `root`.
///
/// A file given directly is returned when its extension is supported; globs
/// only apply to files found by walking a directory.
pub fn collect_source_files(root: &Path, config: &ResolvedConfig) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        let supported = root
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, is_source_file);
        return Ok(if supported {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        });
    }
    if !root.is_dir() {
        anyhow::bail!("path does not exist: {}", root.display());
    }

    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir)
            .with_context(|| format!("failed to read directory: {}", dir.display()))?;

        for entry in entries {
            let entry =
                entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
            let path = entry.path();
            // file_type() reports the link itself, so symlinks are neither
            let file_type = entry
                .file_type()
                .with_context(|| format!("failed to stat {}", path.display()))?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };

            if file_type.is_dir() {
                if !is_skipped_dir(name) {
                    pending.push(path);
                }
            } else if file_type.is_file() && is_source_file(name) {
                let relative = path.strip_prefix(root).unwrap_or(&path);
                if config.accepts(relative) {
                    files.push(path);
                }
            }
        }
    }

    files.sort();
    tracing::debug!(root = %root.display(), files = files.len(), "collected source files");
    Ok(files)
}
