//! Source normalisation and block matching
//!
//! Every structural check runs on normalised text: comments and the contents
//! of string literals are blanked out and blank lines are dropped, so
//! comment-only edits and spacing cannot change what the matcher sees.
//!
//! Global invariants enforced:
//! - Normalisation is a pure function of (text, syntax)
//! - Removing comment-only or blank lines from the input yields identical output
//! - All offsets handed out by this module index into the normalised text

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Block syntax of a language profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Syntax {
    /// Blocks delimited by `{` / `}`; `//` and `/* */` comments.
    Braces,
    /// Blocks delimited by indentation after a `:`; `#` comments.
    Indentation,
}

/// True for lines that carry only a comment under any supported convention.
pub fn is_comment_only(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('#')
        || trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*')
}

/// Non-blank, non-comment lines, trimmed
pub fn significant_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_comment_only(line))
}

/// Blank comments and string-literal contents, then drop blank lines.
///
/// Quote characters are kept so `""` still reads as a literal; every other
/// masked character becomes a space. Trailing whitespace is trimmed from each
/// remaining line.
pub fn normalize(text: &str, syntax: Syntax) -> String {
    let masked = match syntax {
        Syntax::Braces => mask_braces(text),
        Syntax::Indentation => mask_indentation(text),
    };

    let mut out = String::with_capacity(masked.len());
    for line in masked.lines() {
        let line = line.trim_end();
        if line.trim_start().is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

fn mask_braces(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            '/' if next == Some('/') => {
                while i < chars.len() && chars[i] != '\n' {
                    out.push(' ');
                    i += 1;
                }
            }
            '/' if next == Some('*') => {
                out.push_str("  ");
                i += 2;
                while i < chars.len() {
                    if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                        out.push_str("  ");
                        i += 2;
                        break;
                    }
                    out.push(blank(chars[i]));
                    i += 1;
                }
            }
            '"' | '`' => i = mask_string(&chars, i, c, c == '`', &mut out),
            '\'' if is_lifetime(&chars, i) => {
                out.push(c);
                i += 1;
            }
            '\'' => i = mask_string(&chars, i, c, false, &mut out),
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn mask_indentation(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    out.push(' ');
                    i += 1;
                }
            }
            '"' | '\'' => {
                let triple = chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c);
                if triple {
                    out.extend([c, c, c]);
                    i += 3;
                    while i < chars.len() {
                        if chars[i] == '\\' {
                            out.push(' ');
                            if let Some(&escaped) = chars.get(i + 1) {
                                out.push(blank(escaped));
                            }
                            i += 2;
                            continue;
                        }
                        if chars[i] == c
                            && chars.get(i + 1) == Some(&c)
                            && chars.get(i + 2) == Some(&c)
                        {
                            out.extend([c, c, c]);
                            i += 3;
                            break;
                        }
                        out.push(blank(chars[i]));
                        i += 1;
                    }
                } else {
                    i = mask_string(&chars, i, c, false, &mut out);
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Mask a quoted literal starting at `start`; returns the index after it.
///
/// Single-line literals stop at an unescaped newline so one stray quote
/// cannot swallow the rest of the snippet.
fn mask_string(chars: &[char], start: usize, quote: char, multiline: bool, out: &mut String) -> usize {
    out.push(quote);
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                out.push(' ');
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(blank(escaped));
                }
                i += 2;
            }
            c if c == quote => {
                out.push(quote);
                return i + 1;
            }
            '\n' if !multiline => return i,
            c => {
                out.push(blank(c));
                i += 1;
            }
        }
    }
    chars.len()
}

/// `'a` (a Rust lifetime or label) as opposed to a `'a'` char literal.
fn is_lifetime(chars: &[char], quote: usize) -> bool {
    let mut j = quote + 1;
    if !chars.get(j).is_some_and(|c| c.is_alphabetic() || *c == '_') {
        return false;
    }
    while chars.get(j).is_some_and(|c| c.is_alphanumeric() || *c == '_') {
        j += 1;
    }
    chars.get(j) != Some(&'\'')
}

fn blank(c: char) -> char {
    if c == '\n' {
        '\n'
    } else {
        ' '
    }
}

/// Identifier character for the languages we scan (`$` included for JS).
pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Indentation width of a line; a tab counts as four columns.
fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

const NO_COLON: usize = usize::MAX;

/// Block and line lookups over one normalised text, built once per text.
///
/// Every query is a table lookup or a binary search, so scanning many
/// candidate loops or functions never rescans the text.
#[derive(Debug, Clone)]
pub struct SourceIndex<'a> {
    text: &'a str,
    /// Matched `(open, close)` offsets sorted by open; each bracket kind is
    /// matched on its own stack
    pairs: Vec<(usize, usize)>,
    /// Every `{`, matched or not
    brace_opens: Vec<usize>,
    newlines: Vec<usize>,
    /// End of the statement that starts at each offset (one past the text too)
    statement_ends: Vec<usize>,
    /// First `:` outside brackets on the logical line from each offset;
    /// `NO_COLON` when a newline or an unmatched opener comes first
    header_colons: Vec<usize>,
    /// Indentation per line; whitespace-only lines never end a block
    indents: Vec<usize>,
    /// First later line indented at or left of each line
    next_dedent: Vec<usize>,
}

impl<'a> SourceIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let bytes = text.as_bytes();
        let mut pairs = Vec::new();
        let mut brace_opens = Vec::new();
        let mut newlines = Vec::new();
        let mut stacks: [Vec<usize>; 3] = Default::default();

        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b'(' => stacks[0].push(i),
                b'[' => stacks[1].push(i),
                b'{' => {
                    stacks[2].push(i);
                    brace_opens.push(i);
                }
                b')' | b']' | b'}' => {
                    let kind = match b {
                        b')' => 0,
                        b']' => 1,
                        _ => 2,
                    };
                    if let Some(open) = stacks[kind].pop() {
                        pairs.push((open, i));
                    }
                }
                b'\n' => newlines.push(i),
                _ => {}
            }
        }
        pairs.sort_unstable();

        let mut index = SourceIndex {
            text,
            pairs,
            brace_opens,
            newlines,
            statement_ends: Vec::new(),
            header_colons: Vec::new(),
            indents: Vec::new(),
            next_dedent: Vec::new(),
        };
        let (statement_ends, header_colons) = index.build_forward_tables();
        index.statement_ends = statement_ends;
        index.header_colons = header_colons;
        index.indents = text
            .split('\n')
            .map(|line| {
                if line.trim().is_empty() {
                    usize::MAX
                } else {
                    indent_width(line)
                }
            })
            .collect();
        index.next_dedent = next_at_or_left(&index.indents);
        index
    }

    /// Offset of the bracket closing the one at `open`, if any.
    pub fn matching_close(&self, open: usize) -> Option<usize> {
        self.pairs
            .binary_search_by_key(&open, |&(o, _)| o)
            .ok()
            .map(|i| self.pairs[i].1)
    }

    /// `{` at `open` through its closing `}`, or to end of text when unbalanced
    pub fn brace_body(&self, open: usize) -> Range<usize> {
        open..self
            .matching_close(open)
            .map_or(self.text.len(), |close| close + 1)
    }

    /// End of a single statement starting at `start` (exclusive).
    ///
    /// Stops after the first `;` outside brackets, after a `{ ... }` group, at
    /// a closer belonging to an enclosing block, or at end of text. An
    /// unmatched opener runs to end of text.
    pub fn statement_end(&self, start: usize) -> usize {
        self.statement_ends
            .get(start)
            .copied()
            .unwrap_or(self.text.len())
    }

    /// Both per-offset tables, filled right to left so a matched bracket
    /// group is skipped in one step.
    fn build_forward_tables(&self) -> (Vec<usize>, Vec<usize>) {
        let bytes = self.text.as_bytes();
        let len = bytes.len();
        let mut ends = vec![len; len + 1];
        let mut colons = vec![NO_COLON; len + 1];
        for i in (0..len).rev() {
            let close = match bytes[i] {
                b'(' | b'[' | b'{' => self.matching_close(i),
                _ => None,
            };
            ends[i] = match (bytes[i], close) {
                (b';', _) => i + 1,
                (b')' | b']' | b'}', _) => i,
                (b'{', Some(close)) => close + 1,
                (b'(' | b'[', Some(close)) => ends[close + 1],
                (b'(' | b'[' | b'{', None) => len,
                _ => ends[i + 1],
            };
            colons[i] = match (bytes[i], close) {
                (b':', _) => i,
                (b'\n', _) => NO_COLON,
                (b'(' | b'[' | b'{', Some(close)) => colons[close + 1],
                (b'(' | b'[' | b'{', None) => NO_COLON,
                _ => colons[i + 1],
            };
        }
        (ends, colons)
    }

    fn line_of(&self, pos: usize) -> usize {
        self.newlines.partition_point(|&nl| nl < pos)
    }

    /// End offset of line number `line`, before its newline
    fn end_of_line(&self, line: usize) -> usize {
        self.newlines.get(line).copied().unwrap_or(self.text.len())
    }

    /// Start offset of the line containing `pos`
    pub fn line_start(&self, pos: usize) -> usize {
        match self.line_of(pos) {
            0 => 0,
            line => self.newlines[line - 1] + 1,
        }
    }

    /// End offset (exclusive, before the newline) of the line containing `pos`
    pub fn line_end(&self, pos: usize) -> usize {
        self.end_of_line(self.line_of(pos))
    }

    /// First `{` in `from..until`
    pub fn next_open_brace(&self, from: usize, until: usize) -> Option<usize> {
        let i = self.brace_opens.partition_point(|&open| open < from);
        self.brace_opens.get(i).copied().filter(|&open| open < until)
    }

    /// End of the indentation block opened by the header at `header`.
    ///
    /// `after` is any offset on the header's last line; the block covers the
    /// following lines indented deeper than the header's first line.
    pub fn block_end(&self, header: usize, after: usize) -> usize {
        let header_line = self.line_of(header);
        let last = self.line_of(after).max(header_line);
        let width = self.indents[header_line];

        let mut stop = self.next_dedent[header_line];
        if stop <= last {
            // a continuation line sits left of the header; resume below it
            stop = last + 1;
            while stop < self.indents.len() && self.indents[stop] > width {
                stop = self.next_dedent[stop];
            }
        }
        self.end_of_line(stop.max(last + 1) - 1)
    }

    /// First `:` outside brackets on the logical line from `from`.
    ///
    /// This is the colon ending a python header; slices, dict literals and
    /// lambdas nested inside brackets are skipped. An unmatched opener ends
    /// the search.
    pub fn header_colon(&self, from: usize) -> Option<usize> {
        self.header_colons
            .get(from)
            .copied()
            .filter(|&colon| colon != NO_COLON)
    }
}

/// For each entry, the index of the first later entry that is not larger
/// (`values.len()` when none).
fn next_at_or_left(values: &[usize]) -> Vec<usize> {
    let mut next = vec![values.len(); values.len()];
    let mut stack: Vec<usize> = Vec::new();
    for i in (0..values.len()).rev() {
        while stack.last().is_some_and(|&top| values[top] > values[i]) {
            stack.pop();
        }
        if let Some(&top) = stack.last() {
            next[i] = top;
        }
        stack.push(i);
    }
    next
}
