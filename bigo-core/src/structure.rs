//! Loop and function discovery on normalised source
//!
//! This is a scan, not a parse: loops and function definitions are located
//! by keyword/header shape and their bodies by bracket matching
//! (brace syntax) or indentation (indentation syntax).
//!
//! Global invariants enforced:
//! - Input is the output of `source::normalize` for the same syntax
//! - Spans are byte ranges into that text, discovered in text order
//! - A loop is nested only when its header lies inside another loop's body

use crate::source::{is_ident_char, SourceIndex, Syntax};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::OnceLock;

/// Names that are followed by `(` but never name a function definition
const NOT_FUNCTION_NAMES: &[&str] = &[
    "and", "assert", "await", "catch", "defer", "do", "elif", "else", "fixed", "fn", "for",
    "foreach", "func", "function", "go", "if", "in", "lock", "loop", "match", "new", "not", "or",
    "return", "sizeof", "super", "switch", "synchronized", "this", "throw", "try", "typeof",
    "using", "while", "with", "yield",
];

/// A preceding word that turns `name(...)` into an expression
const EXPRESSION_PREFIXES: &[&str] = &[
    "and", "await", "case", "const", "delete", "do", "else", "for", "foreach", "if", "in",
    "instanceof", "let", "loop", "match", "new", "not", "of", "or", "return", "switch", "throw",
    "typeof", "unsafe", "var", "while", "yield",
];

/// Longest return-type / throws clause accepted between `)` and `{`
const MAX_SIGNATURE_TAIL: usize = 200;

/// An iteration construct and the text it repeats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSpan {
    /// Offset of the loop keyword
    pub header: usize,
    pub body: Range<usize>,
    /// Header or body contains a halving step (`mid = (lo + hi) / 2`, `>>= 1`, ...)
    pub halving: bool,
    /// Header lies inside another loop's body
    pub nested_in_loop: bool,
    /// Another loop's header lies inside this body
    pub contains_loop: bool,
}

/// A named function definition and how often it calls itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpan {
    pub name: String,
    pub header: usize,
    pub body: Range<usize>,
    pub self_calls: usize,
    pub halving: bool,
}

/// Everything the structural rule signatures need, gathered in one pass
#[derive(Debug, Clone, Default)]
pub struct Structure {
    pub loops: Vec<LoopSpan>,
    pub functions: Vec<FunctionSpan>,
    /// Merged `header..body.end` extents of all loops, sorted
    covered: Vec<Range<usize>>,
}

impl Structure {
    /// Scan normalised `text` written in `syntax`.
    ///
    /// `halving` is the profile's midpoint/halving expression; it marks loops
    /// and functions that shrink their range geometrically.
    pub fn scan(text: &str, syntax: Syntax, halving: &Regex) -> Self {
        let scanner = Scanner::new(text, halving);
        let (mut loops, functions) = match syntax {
            Syntax::Braces => (scanner.brace_loops(), scanner.brace_functions()),
            Syntax::Indentation => (scanner.indented_loops(), scanner.indented_functions()),
        };
        mark_nesting(&mut loops);
        let covered = merged_extents(&loops);
        Structure {
            loops,
            functions,
            covered,
        }
    }

    /// Some loop's header sits inside another loop's body.
    pub fn has_nested_loops(&self) -> bool {
        self.loops.iter().any(|l| l.nested_in_loop)
    }

    /// Some loop is neither nested nor enclosing, and does not halve its range.
    pub fn has_linear_loop(&self) -> bool {
        self.loops
            .iter()
            .any(|l| !l.halving && !l.nested_in_loop && !l.contains_loop)
    }

    pub fn has_halving_loop(&self) -> bool {
        self.loops.iter().any(|l| l.halving)
    }

    /// `pos` falls within a loop header or body.
    pub fn is_inside_loop(&self, pos: usize) -> bool {
        let after = self.covered.partition_point(|extent| extent.start <= pos);
        after > 0 && pos < self.covered[after - 1].end
    }
}

/// Set the nesting flags of loops given in header order.
///
/// Open loops form a stack; a loop whose body has ended before the next
/// header is popped, so each loop is pushed and popped once.
fn mark_nesting(loops: &mut [LoopSpan]) {
    let mut open: Vec<usize> = Vec::new();
    for i in 0..loops.len() {
        let header = loops[i].header;
        while open.last().is_some_and(|&j| loops[j].body.end <= header) {
            open.pop();
        }
        if let Some(&outer) = open.iter().rev().find(|&&j| loops[j].body.contains(&header)) {
            loops[i].nested_in_loop = true;
            loops[outer].contains_loop = true;
        }
        open.push(i);
    }
}

fn merged_extents(loops: &[LoopSpan]) -> Vec<Range<usize>> {
    let mut covered: Vec<Range<usize>> = Vec::new();
    for l in loops {
        let extent = l.header..l.body.end;
        match covered.last_mut() {
            Some(last) if extent.start <= last.end => last.end = last.end.max(extent.end),
            _ => covered.push(extent),
        }
    }
    covered
}

fn brace_loop_keyword() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:for|foreach|while|loop|do)\b").unwrap())
}

fn brace_function_candidate() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([A-Za-z_$][\w$]*)\s*(?:<[^<>{};()]*>\s*)?\(").unwrap()
    })
}

fn arrow_function() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::[^=;{}]*)?=\s*(?:async\s+)?(?:\([^()]*\)|[A-Za-z_$][\w$]*)\s*(?::[^=;{}()]*)?=>\s*",
        )
        .unwrap()
    })
}

fn function_expression() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::[^=;{}]*)?=\s*(?:async\s+)?function\b[^(]*\(",
        )
        .unwrap()
    })
}

fn indented_loop_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*(?:async[ \t]+)?(for|while)\b").unwrap())
}

fn indented_def_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*(?:async[ \t]+)?def[ \t]+([A-Za-z_]\w*)[ \t]*\(").unwrap()
    })
}

fn indented_lambda() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*([A-Za-z_]\w*)[ \t]*=[ \t]*lambda\b").unwrap())
}

/// Any identifier directly followed by `(`, blanks allowed in between
fn call_site() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([\w$]+)[ \t]*\(").unwrap())
}

/// Call sites of one name, in text order
#[derive(Debug)]
struct Calls {
    offsets: Vec<usize>,
    /// `unreturned[i]`: calls among the first `i` that are not a `return`
    /// operand (one entry longer than `offsets`)
    unreturned: Vec<usize>,
}

/// Per-text tables shared by every loop and function found in it
struct Scanner<'a> {
    text: &'a str,
    index: SourceIndex<'a>,
    /// Non-overlapping halving matches, in text order
    halving: Vec<Range<usize>>,
    calls: HashMap<&'a str, Calls>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, halving: &Regex) -> Self {
        let mut sites: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for caps in call_site().captures_iter(text) {
            if let Some(name) = caps.get(1) {
                sites.entry(name.as_str()).or_default().push(name.start());
            }
        }
        let calls = sites
            .into_iter()
            .map(|(name, offsets)| {
                let mut unreturned = Vec::with_capacity(offsets.len() + 1);
                let mut count = 0;
                unreturned.push(count);
                for &at in &offsets {
                    count += usize::from(!is_returned(text, at));
                    unreturned.push(count);
                }
                (name, Calls { offsets, unreturned })
            })
            .collect();

        Scanner {
            text,
            index: SourceIndex::new(text),
            halving: halving.find_iter(text).map(|m| m.range()).collect(),
            calls,
        }
    }

    /// A halving match lies entirely within `span`.
    fn halves(&self, span: Range<usize>) -> bool {
        let first = self.halving.partition_point(|m| m.start < span.start);
        self.halving.get(first).is_some_and(|m| m.end <= span.end)
    }

    /// Self-calls of `name` inside `body`.
    ///
    /// Calls that are each returned directly sit on alternative branches; at
    /// most one runs per activation.
    fn self_calls(&self, name: &str, body: &Range<usize>) -> usize {
        let Some(calls) = self.calls.get(name) else {
            return 0;
        };
        let lo = calls.offsets.partition_point(|&at| at < body.start);
        let hi = calls.offsets.partition_point(|&at| at < body.end);
        let count = hi - lo;
        if count > 1 && calls.unreturned[hi] == calls.unreturned[lo] {
            1
        } else {
            count
        }
    }

    fn function_span(&self, name: &str, header: usize, body: Range<usize>) -> FunctionSpan {
        FunctionSpan {
            name: name.to_string(),
            header,
            self_calls: self.self_calls(name, &body),
            halving: self.halves(body.clone()),
            body,
        }
    }

    fn skip_ws(&self, from: usize) -> usize {
        self.text[from..]
            .find(|c: char| !c.is_whitespace())
            .map_or(self.text.len(), |offset| from + offset)
    }

    fn brace_loops(&self) -> Vec<LoopSpan> {
        let text = self.text;
        let bytes = text.as_bytes();
        let index = &self.index;
        let mut loops = Vec::new();
        let mut do_trailers: HashSet<usize> = HashSet::new();

        for m in brace_loop_keyword().find_iter(text) {
            if do_trailers.contains(&m.start()) || !at_statement_start(text, m.start()) {
                continue;
            }
            let keyword = m.as_str();
            let after = self.skip_ws(m.end());

            let body = match (keyword, bytes.get(after)) {
                ("loop" | "do", Some(b'{')) => index.brace_body(after),
                ("loop" | "do", _) => continue,
                (_, Some(b'(')) => {
                    let Some(close) = index.matching_close(after) else {
                        continue;
                    };
                    let start = self.skip_ws(close + 1);
                    match bytes.get(start) {
                        Some(b'{') => index.brace_body(start),
                        Some(b';') | None => start..start,
                        Some(_) => start..index.statement_end(start),
                    }
                }
                // Higher-ranked trait bounds: `for<'a> Fn(&'a T)`
                ("for", Some(b'<')) => continue,
                // `for x in xs {`, `while cond {`, Go's `for i := 0; i < n; i++ {`
                _ => match index.next_open_brace(m.end(), index.line_end(m.end())) {
                    Some(open) => index.brace_body(open),
                    None => continue,
                },
            };

            if keyword == "do" {
                let trailer = self.skip_ws(body.end);
                if text[trailer..].starts_with("while") {
                    do_trailers.insert(trailer);
                }
            }

            loops.push(LoopSpan {
                header: m.start(),
                halving: self.halves(m.start()..body.end.max(m.end())),
                body,
                nested_in_loop: false,
                contains_loop: false,
            });
        }

        loops
    }

    fn indented_loops(&self) -> Vec<LoopSpan> {
        let text = self.text;
        let index = &self.index;
        let mut loops = Vec::new();

        for caps in indented_loop_header().captures_iter(text) {
            let Some(keyword) = caps.get(1) else {
                continue;
            };
            let Some(colon) = index.header_colon(keyword.end()) else {
                continue;
            };
            let header_line = keyword.end()..colon.min(index.line_end(keyword.end()));
            if keyword.as_str() == "for" && !contains_word(&text[header_line], "in") {
                continue;
            }
            let end = index.block_end(keyword.start(), colon);
            let body = colon + 1..end.max(colon + 1);
            loops.push(LoopSpan {
                header: keyword.start(),
                halving: self.halves(keyword.start()..body.end),
                body,
                nested_in_loop: false,
                contains_loop: false,
            });
        }

        loops
    }

    /// Body of a definition whose parameter list closed just before `from`.
    ///
    /// Accepts an optional return type, `throws` clause or `where` clause, then
    /// requires `{` before any `;`, `}` or `=`.
    fn definition_body_open(&self, from: usize) -> Option<usize> {
        let window = &self.text.as_bytes()[from..(from + MAX_SIGNATURE_TAIL + 1).min(self.text.len())];
        let offset = window.iter().position(|b| matches!(b, b'{' | b';' | b'}'))?;
        if window[offset] != b'{' || window[..offset].contains(&b'=') {
            return None;
        }
        Some(from + offset)
    }

    fn brace_functions(&self) -> Vec<FunctionSpan> {
        let text = self.text;
        let index = &self.index;
        let mut functions = Vec::new();

        for caps in brace_function_candidate().captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if NOT_FUNCTION_NAMES.contains(&name.as_str())
                || !is_definition_context(text, name.start())
            {
                continue;
            }
            let Some(close) = index.matching_close(whole.end() - 1) else {
                continue;
            };
            let Some(open) = self.definition_body_open(close + 1) else {
                continue;
            };
            functions.push(self.function_span(name.as_str(), name.start(), index.brace_body(open)));
        }

        for caps in function_expression().captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let Some(close) = index.matching_close(whole.end() - 1) else {
                continue;
            };
            let Some(open) = self.definition_body_open(close + 1) else {
                continue;
            };
            functions.push(self.function_span(name.as_str(), name.start(), index.brace_body(open)));
        }

        for caps in arrow_function().captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let start = whole.end();
            let body = if text.as_bytes().get(start) == Some(&b'{') {
                index.brace_body(start)
            } else {
                start..index.statement_end(start).min(index.line_end(start))
            };
            functions.push(self.function_span(name.as_str(), name.start(), body));
        }

        functions.sort_by_key(|f| f.header);
        functions
    }

    fn indented_functions(&self) -> Vec<FunctionSpan> {
        let text = self.text;
        let index = &self.index;
        let mut functions = Vec::new();

        for caps in indented_def_header().captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let Some(close) = index.matching_close(whole.end() - 1) else {
                continue;
            };
            let Some(colon) = index.header_colon(close + 1) else {
                continue;
            };
            let end = index.block_end(whole.start(), colon);
            let body = colon + 1..end.max(colon + 1);
            functions.push(self.function_span(name.as_str(), name.start(), body));
        }

        for caps in indented_lambda().captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let body = whole.end()..index.line_end(whole.end());
            functions.push(self.function_span(name.as_str(), name.start(), body));
        }

        functions.sort_by_key(|f| f.header);
        functions
    }
}

/// The word immediately before `pos`, ignoring whitespace
fn previous_word(text: &str, pos: usize) -> &str {
    let before = text[..pos].trim_end();
    &before[before.trim_end_matches(is_ident_char).len()..]
}

/// Loop keywords only count where a statement can begin.
fn at_statement_start(text: &str, pos: usize) -> bool {
    let before = text[..pos].trim_end_matches([' ', '\t']);
    if before.is_empty() || before.ends_with('\n') {
        return true;
    }
    match before.trim_end().chars().last() {
        None => true,
        Some('{' | '}' | ';' | ':' | ')') => true,
        Some(c) if is_ident_char(c) => matches!(previous_word(text, pos), "else" | "do"),
        Some(_) => false,
    }
}

/// `name(` at `pos` sits where a definition (not an expression) can start.
fn is_definition_context(text: &str, pos: usize) -> bool {
    match text[..pos].trim_end().chars().last() {
        None => true,
        Some(c) if is_ident_char(c) => !EXPRESSION_PREFIXES.contains(&previous_word(text, pos)),
        Some(c) => !"=(,!&|?:.+-*/%<[^~".contains(c),
    }
}

/// The call at `at` is the operand of a `return` (receiver prefix allowed).
fn is_returned(text: &str, at: usize) -> bool {
    let before = text[..at]
        .trim_end_matches("self.")
        .trim_end_matches("this.");
    previous_word(before, before.len()) == "return"
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !is_ident_char(c))
        .any(|token| token == word)
}
