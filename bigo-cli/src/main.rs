//! bigo CLI - heuristic worst-case complexity estimation for code snippets

// Global invariants enforced:
// - Deterministic output ordering
// - Identical input yields byte-for-byte identical output

use anyhow::Context;
use bigo_core::config::{self, ResolvedConfig};
use bigo_core::rules::{self, pattern_types};
use bigo_core::{
    analyze_files, analyze_snippet, collect_source_files, read_source, render_json, render_jsonl,
    render_text, AnalysisOptions, ComplexityClass, ProfileId, SnippetReport,
};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "bigo")]
#[command(about = "Estimate the worst-case time complexity of code snippets")]
#[command(version = env!("BIGO_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a source file, a directory tree, or stdin (`-`)
    Analyze {
        /// Path to source file or directory, or `-` to read stdin
        path: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Force a rule table: python-like or brace-language (overrides config file)
        #[arg(long)]
        profile: Option<ProfileId>,

        /// Keep only the N worst results (overrides config file)
        #[arg(long)]
        top: Option<usize>,

        /// Only report results at or above this class, e.g. "O(n)" (overrides config file)
        #[arg(long)]
        min_complexity: Option<ComplexityClass>,

        /// Config file to use instead of discovering .bigorc.json / bigo.config.json
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the explanation under each text result
        #[arg(long)]
        explain: bool,
    },
    /// List the pattern rule tables
    Rules {
        /// Only list this profile
        #[arg(long)]
        profile: Option<ProfileId>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Inspect the project configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Parse and validate the config file, then exit
    Validate {
        /// Config file to check instead of discovering one in the working directory
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Print the effective settings after defaults are applied
    Show {
        /// Config file to read instead of discovering one in the working directory
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Jsonl,
}

/// Flags for `bigo analyze` that override config values
struct Overrides {
    profile: Option<ProfileId>,
    top: Option<usize>,
    min_complexity: Option<ComplexityClass>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            path,
            format,
            profile,
            top,
            min_complexity,
            config: config_path,
            explain,
        } => {
            let overrides = Overrides {
                profile,
                top,
                min_complexity,
            };
            let reports = if path.as_os_str() == "-" {
                vec![analyze_stdin(config_path.as_deref(), &overrides)?]
            } else {
                analyze_tree(&path, config_path.as_deref(), &overrides)?
            };

            match format {
                OutputFormat::Text => print!("{}", render_text(&reports, explain)),
                OutputFormat::Json => println!("{}", render_json(&reports)),
                OutputFormat::Jsonl => print!("{}", render_jsonl(&reports)),
            }
        }
        Commands::Rules { profile, format } => {
            let ids: Vec<ProfileId> = match profile {
                Some(id) => vec![id],
                None => ProfileId::ALL.to_vec(),
            };
            match format {
                OutputFormat::Text => print!("{}", render_rules_text(&ids)),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&rule_views(&ids))
                        .context("failed to serialize rules")?
                ),
                OutputFormat::Jsonl => anyhow::bail!("JSONL format is not supported for rules"),
            }
        }
        Commands::Config { action } => {
            let cwd = std::env::current_dir()?;
            match action {
                ConfigAction::Validate { path } => {
                    let resolved = config::load_and_resolve(&cwd, path.as_deref())
                        .context("config validation failed")?;
                    match resolved.config_path {
                        Some(p) => println!("{}: ok", p.display()),
                        None => println!("no config file found; defaults apply"),
                    }
                }
                ConfigAction::Show { path } => {
                    let resolved = config::load_and_resolve(&cwd, path.as_deref())
                        .context("failed to load configuration")?;
                    print!("{}", render_config(&resolved));
                }
            }
        }
    }

    Ok(())
}

/// Classify stdin as one snippet; exceeding the input ceiling is an error.
fn analyze_stdin(
    config_path: Option<&Path>,
    overrides: &Overrides,
) -> anyhow::Result<SnippetReport> {
    let resolved = load_config(&std::env::current_dir()?, config_path, overrides)?;

    let limit = resolved.max_input_bytes;
    let Some(source) =
        read_source(std::io::stdin().lock(), limit).context("failed to read stdin")?
    else {
        anyhow::bail!("stdin exceeds the input limit of {} bytes", limit);
    };

    let options = AnalysisOptions {
        max_input_bytes: limit,
        profile: resolved.profile,
    };
    let analysis = analyze_snippet(&source, &options).context("failed to analyze stdin")?;

    Ok(SnippetReport {
        file: "<stdin>".to_string(),
        profile: analysis.profile,
        result: analysis.result,
    })
}

/// Classify every supported file under `path` in parallel, with a progress bar.
fn analyze_tree(
    path: &Path,
    config_path: Option<&Path>,
    overrides: &Overrides,
) -> anyhow::Result<Vec<SnippetReport>> {
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    let start = if path.is_file() {
        path.parent().unwrap_or(Path::new(".")).to_path_buf()
    } else {
        path.to_path_buf()
    };
    let project_root = find_repo_root(&start).unwrap_or(start);
    let resolved = load_config(&project_root, config_path, overrides)?;

    let files = collect_source_files(path, &resolved)?;

    let bar = if files.len() > 1 {
        ProgressBar::new(files.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░  "),
    );
    bar.set_message("Classifying files...");

    let reports = analyze_files(&files, &resolved, |_| bar.inc(1));
    bar.finish_and_clear();
    Ok(reports)
}

/// Load configuration, then let CLI flags override config file values
fn load_config(
    project_root: &Path,
    config_path: Option<&Path>,
    overrides: &Overrides,
) -> anyhow::Result<ResolvedConfig> {
    let mut resolved = config::load_and_resolve(project_root, config_path)
        .context("failed to load configuration")?;

    if let Some(config_path) = &resolved.config_path {
        eprintln!("Using config: {}", config_path.display());
    }

    resolved.profile = overrides.profile.or(resolved.profile);
    resolved.top_n = overrides.top.or(resolved.top_n);
    resolved.min_complexity = overrides.min_complexity.or(resolved.min_complexity);
    Ok(resolved)
}

#[derive(Serialize)]
struct RuleView {
    profile: ProfileId,
    pattern_type: &'static str,
    complexity: ComplexityClass,
    weight: u8,
    description: &'static str,
    signature: String,
}

/// Every rule of each listed table, each followed by the shared fallback
fn rule_views(ids: &[ProfileId]) -> Vec<RuleView> {
    let view = |id: ProfileId, rule: &'static rules::PatternRule| RuleView {
        profile: id,
        pattern_type: rule.pattern_type,
        complexity: rule.complexity,
        weight: rule.weight,
        description: rule.description,
        signature: rule.signature.describe(),
    };
    ids.iter()
        .flat_map(|&id| {
            rules::profile(id)
                .rules
                .iter()
                .chain(std::iter::once(&rules::CONSTANT_RULE))
                .map(move |rule| view(id, rule))
        })
        .collect()
}

fn render_rules_text(ids: &[ProfileId]) -> String {
    let mut output = String::new();
    for &id in ids {
        let table = rules::profile(id);
        output.push_str(&format!("{} ({})\n", id, pattern_types(table).join(", ")));
        output.push_str(&format!(
            "  {:<22} {:<11} {:<6} {}\n",
            "PATTERN", "COMPLEXITY", "WEIGHT", "SIGNATURE"
        ));
        for rule in &table.rules {
            output.push_str(&format!(
                "  {:<22} {:<11} {:<6} {}\n",
                rule.pattern_type,
                rule.complexity.as_str(),
                rule.weight,
                rule.signature.describe()
            ));
        }
        output.push('\n');
    }
    output.push_str(&format!(
        "fallback: {} {} ({})\n",
        rules::CONSTANT_RULE.pattern_type,
        rules::CONSTANT_RULE.complexity,
        rules::CONSTANT_RULE.description
    ));
    output
}

/// Effective settings, one `key value` row each
fn render_config(resolved: &ResolvedConfig) -> String {
    fn or(value: Option<String>, unset: &str) -> String {
        value.unwrap_or_else(|| unset.to_string())
    }

    let rows = [
        (
            "source",
            or(
                resolved.config_path.as_ref().map(|p| p.display().to_string()),
                "defaults",
            ),
        ),
        ("max_input_bytes", resolved.max_input_bytes.to_string()),
        ("profile", or(resolved.profile.map(|p| p.to_string()), "auto")),
        (
            "min_complexity",
            or(resolved.min_complexity.map(|c| c.to_string()), "any"),
        ),
        ("top", or(resolved.top_n.map(|n| n.to_string()), "all")),
        (
            "include",
            or(
                resolved
                    .include
                    .as_ref()
                    .map(|set| format!("{} pattern(s)", set.len())),
                "everything",
            ),
        ),
        ("exclude", format!("{} pattern(s)", resolved.exclude.len())),
    ];

    rows.iter()
        .map(|(key, value)| format!("{:<16} {}\n", key, value))
        .collect()
}

/// Nearest ancestor holding a `.git` entry
fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_is_listed_under_each_profile() {
        let views = rule_views(&[ProfileId::PythonLike]);
        assert!(views.iter().all(|v| v.profile == ProfileId::PythonLike));
        let last = views.last().unwrap();
        assert_eq!(last.pattern_type, rules::CONSTANT_RULE.pattern_type);

        let views = rule_views(&ProfileId::ALL);
        for id in ProfileId::ALL {
            let fallbacks = views
                .iter()
                .filter(|v| v.profile == id && v.pattern_type == rules::CONSTANT_RULE.pattern_type)
                .count();
            assert_eq!(fallbacks, 1, "{id}");
        }
    }

    #[test]
    fn test_rule_views_serialize_profile_ids() {
        let json = serde_json::to_string(&rule_views(&[ProfileId::PythonLike])).unwrap();
        assert!(json.contains(r#""profile":"python-like""#));
        assert!(!json.contains("brace-language"));
    }
}
