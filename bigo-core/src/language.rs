//! Language profile selection
//!
//! Chooses between the two rule tables from light syntactic cues. Selection
//! looks only at significant lines so comment-only lines cannot sway it.

use crate::source::significant_lines;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

/// Rule-table identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileId {
    /// Indentation-structured code with colon-terminated headers
    PythonLike,
    /// C-family, JavaScript/TypeScript, Java, Go, Rust and similar
    BraceLanguage,
}

impl ProfileId {
    pub const ALL: [ProfileId; 2] = [ProfileId::PythonLike, ProfileId::BraceLanguage];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileId::PythonLike => "python-like",
            ProfileId::BraceLanguage => "brace-language",
        }
    }

    /// Profile hint from a file extension
    ///
    /// Returns `None` if the extension is not recognized.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" | "pyw" | "pyi" => Some(ProfileId::PythonLike),
            "ts" | "mts" | "cts" | "tsx" | "js" | "mjs" | "cjs" | "jsx" | "java" | "kt" | "kts"
            | "scala" | "go" | "rs" | "c" | "h" | "cc" | "cpp" | "cxx" | "hpp" | "hh" | "cs"
            | "swift" | "dart" | "php" => Some(ProfileId::BraceLanguage),
            _ => None,
        }
    }

    /// Profile hint from a file path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown profile: {0:?} (expected \"python-like\" or \"brace-language\")")]
pub struct ParseProfileError(pub String);

impl FromStr for ProfileId {
    type Err = ParseProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python-like" | "python" | "py" => Ok(ProfileId::PythonLike),
            "brace-language" | "brace" | "braces" => Ok(ProfileId::BraceLanguage),
            _ => Err(ParseProfileError(s.to_string())),
        }
    }
}

fn python_cue() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^(?:async\s+)?def\s+\w+\s*\(.*\)\s*(?:->.*)?:$",
            r"|^(?:import\s+[\w.]+(?:\s+as\s+\w+)?(?:\s*,\s*[\w.]+(?:\s+as\s+\w+)?)*|from\s+[\w.]+\s+import\s+.+)$",
            r"|^(?:for|while|if|elif|else|class|try|except|finally|with)\b.*:$",
        ))
        .unwrap()
    })
}

/// `line` without a trailing `#` comment.
///
/// The `#` must sit outside quotes and follow whitespace, so `this.#count`
/// and `"#"` are kept.
fn strip_hash_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut after_blank = true;

    for (i, c) in line.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '#' && after_blank => return line[..i].trim_end(),
            None => {}
        }
        after_blank = c.is_whitespace();
    }
    line
}

/// Pick the rule table for `text`.
///
/// The python-like profile wins only with strictly more cues than the
/// brace-language profile; ties, including no cues at all, go to braces.
pub fn select_profile(text: &str) -> ProfileId {
    let mut python = 0usize;
    let mut brace = 0usize;

    for line in significant_lines(text) {
        let line = strip_hash_comment(line.trim());
        if line.ends_with(['{', '}', ';']) {
            brace += 1;
        } else if python_cue().is_match(line) {
            python += 1;
        }
    }

    tracing::debug!(python, brace, "profile cues");

    if python > brace {
        ProfileId::PythonLike
    } else {
        ProfileId::BraceLanguage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_snippet_selects_python_like() {
        let src = "import math\n\ndef area(r):\n    return math.pi * r * r\n";
        assert_eq!(select_profile(src), ProfileId::PythonLike);
    }

    #[test]
    fn test_brace_snippet_selects_brace_language() {
        let src = "function area(r) {\n  return Math.PI * r * r;\n}\n";
        assert_eq!(select_profile(src), ProfileId::BraceLanguage);
    }

    #[test]
    fn test_ties_go_to_braces() {
        assert_eq!(select_profile(""), ProfileId::BraceLanguage);
        assert_eq!(select_profile("x = 1"), ProfileId::BraceLanguage);
    }

    #[test]
    fn test_comment_lines_do_not_vote() {
        let src = "# for x in y:\n# if a:\n# def f():\nint x = 1;";
        assert_eq!(select_profile(src), ProfileId::BraceLanguage);
    }

    #[test]
    fn test_trailing_comments_are_ignored() {
        assert_eq!(strip_hash_comment("def pairs(n):  # all pairs"), "def pairs(n):");
        assert_eq!(strip_hash_comment("s = '#'  # hash"), "s = '#'");
        assert_eq!(strip_hash_comment(r##"t = "a\" #"  # q"##), r##"t = "a\" #""##);
        assert_eq!(strip_hash_comment("this.#count++;"), "this.#count++;");

        let src = "def pairs(n):  # all pairs\n    for i in range(n):  # outer\n        print(i)\n";
        assert_eq!(select_profile(src), ProfileId::PythonLike);
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(ProfileId::from_extension("py"), Some(ProfileId::PythonLike));
        assert_eq!(ProfileId::from_extension("ts"), Some(ProfileId::BraceLanguage));
        assert_eq!(ProfileId::from_extension("rs"), Some(ProfileId::BraceLanguage));
        assert_eq!(ProfileId::from_extension("md"), None);
        assert_eq!(
            ProfileId::from_path(Path::new("src/sort.go")),
            Some(ProfileId::BraceLanguage)
        );
    }

    #[test]
    fn test_parse_and_display() {
        for id in ProfileId::ALL {
            assert_eq!(id.as_str().parse::<ProfileId>(), Ok(id));
            assert_eq!(id.to_string(), id.as_str());
        }
        assert_eq!("Python".parse::<ProfileId>(), Ok(ProfileId::PythonLike));
        assert!("ruby".parse::<ProfileId>().is_err());
    }
}
