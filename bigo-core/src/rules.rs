//! Per-profile pattern rule tables
//!
//! Global invariants enforced:
//! - Tables are built once per process and never mutated
//! - Table order is the order patterns are reported in
//! - `weight` is descriptive only; resolution ranks by complexity class
//!
//! A pattern type may be backed by several rules (e.g. python nested loops
//! via block loops and via comprehensions). Every rule for one type carries
//! the same class, weight and description.

use crate::complexity::ComplexityClass;
use crate::language::ProfileId;
use crate::source::Syntax;
use crate::structure::{FunctionSpan, Structure};
use regex::Regex;
use std::sync::OnceLock;

/// Shape of a self-recursive function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionShape {
    /// Two or more self-calls, no halving step (Fibonacci)
    Branching,
    /// Two or more self-calls around a midpoint (merge sort)
    DivideAndConquer,
    /// Exactly one self-call, no halving step (factorial)
    Linear,
    /// Exactly one self-call on a halved range (recursive binary search)
    Halving,
}

impl RecursionShape {
    pub fn admits(&self, function: &FunctionSpan) -> bool {
        match self {
            RecursionShape::Branching => function.self_calls >= 2 && !function.halving,
            RecursionShape::DivideAndConquer => function.self_calls >= 2 && function.halving,
            RecursionShape::Linear => function.self_calls == 1 && !function.halving,
            RecursionShape::Halving => function.self_calls == 1 && function.halving,
        }
    }
}

/// How a rule is satisfied against normalised text
#[derive(Debug)]
pub enum Signature {
    /// Regex anywhere in the text
    Regex(Regex),
    /// Regex match whose start lies outside every loop
    OutsideLoops(Regex),
    NestedLoops,
    /// A loop that is neither nested, enclosing nor halving
    LinearLoop,
    HalvingLoop,
    Recursion(RecursionShape),
    /// Never matched; only inserted when nothing else matched
    Fallback,
}

impl Signature {
    pub fn matches(&self, text: &str, structure: &Structure) -> bool {
        match self {
            Signature::Regex(re) => re.is_match(text),
            Signature::OutsideLoops(re) => re
                .find_iter(text)
                .any(|m| !structure.is_inside_loop(m.start())),
            Signature::NestedLoops => structure.has_nested_loops(),
            Signature::LinearLoop => structure.has_linear_loop(),
            Signature::HalvingLoop => structure.has_halving_loop(),
            Signature::Recursion(shape) => structure.functions.iter().any(|f| shape.admits(f)),
            Signature::Fallback => false,
        }
    }

    /// Short label for rule listings
    pub fn describe(&self) -> String {
        match self {
            Signature::Regex(re) => format!("regex /{}/", re.as_str()),
            Signature::OutsideLoops(re) => format!("regex outside loops /{}/", re.as_str()),
            Signature::NestedLoops => "loop inside another loop's body".to_string(),
            Signature::LinearLoop => "unnested loop without halving".to_string(),
            Signature::HalvingLoop => "loop with a halving step".to_string(),
            Signature::Recursion(shape) => match shape {
                RecursionShape::Branching => "function calling itself at least twice",
                RecursionShape::DivideAndConquer => "self-calls around a midpoint",
                RecursionShape::Linear => "function calling itself once",
                RecursionShape::Halving => "single self-call on a halved range",
            }
            .to_string(),
            Signature::Fallback => "nothing else matched".to_string(),
        }
    }
}

/// Association of a signature with a complexity class
#[derive(Debug)]
pub struct PatternRule {
    pub pattern_type: &'static str,
    pub signature: Signature,
    pub complexity: ComplexityClass,
    pub weight: u8,
    pub description: &'static str,
}

/// The synthetic pattern reported when no rule matched
pub static CONSTANT_RULE: PatternRule = PatternRule {
    pattern_type: "constant",
    signature: Signature::Fallback,
    complexity: ComplexityClass::Constant,
    weight: 1,
    description: "Simple operations, likely constant time",
};

/// A rule table plus the syntax it is evaluated under
#[derive(Debug)]
pub struct LanguageProfile {
    pub id: ProfileId,
    pub syntax: Syntax,
    /// Midpoint/halving expression used to tell binary search and divide
    /// and conquer apart from plain loops and recursion
    pub halving: Regex,
    pub rules: Vec<PatternRule>,
}

/// The immutable table for `id`, built on first use.
pub fn profile(id: ProfileId) -> &'static LanguageProfile {
    static PYTHON_LIKE: OnceLock<LanguageProfile> = OnceLock::new();
    static BRACE_LANGUAGE: OnceLock<LanguageProfile> = OnceLock::new();
    match id {
        ProfileId::PythonLike => PYTHON_LIKE.get_or_init(python_like),
        ProfileId::BraceLanguage => BRACE_LANGUAGE.get_or_init(brace_language),
    }
}

/// Pattern types in table order, first appearance wins.
pub fn pattern_types(profile: &LanguageProfile) -> Vec<&'static str> {
    let mut types: Vec<&'static str> = Vec::new();
    for rule in &profile.rules {
        if !types.contains(&rule.pattern_type) {
            types.push(rule.pattern_type);
        }
    }
    types
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

fn nested_loops(signature: Signature) -> PatternRule {
    PatternRule {
        pattern_type: "nested_loops",
        signature,
        complexity: ComplexityClass::Quadratic,
        weight: 3,
        description: "Nested loops detected",
    }
}

fn single_loop() -> PatternRule {
    PatternRule {
        pattern_type: "single_loop",
        signature: Signature::LinearLoop,
        complexity: ComplexityClass::Linear,
        weight: 1,
        description: "Single loop detected",
    }
}

fn exponential_recursion() -> PatternRule {
    PatternRule {
        pattern_type: "exponential_recursion",
        signature: Signature::Recursion(RecursionShape::Branching),
        complexity: ComplexityClass::Exponential,
        weight: 4,
        description: "Recursive function with multiple self-calls detected",
    }
}

fn divide_and_conquer() -> PatternRule {
    PatternRule {
        pattern_type: "divide_and_conquer",
        signature: Signature::Recursion(RecursionShape::DivideAndConquer),
        complexity: ComplexityClass::Linearithmic,
        weight: 3,
        description: "Divide and conquer recursion detected",
    }
}

fn linear_recursion() -> PatternRule {
    PatternRule {
        pattern_type: "linear_recursion",
        signature: Signature::Recursion(RecursionShape::Linear),
        complexity: ComplexityClass::Linear,
        weight: 2,
        description: "Linear recursion detected",
    }
}

fn binary_search(signature: Signature) -> PatternRule {
    PatternRule {
        pattern_type: "binary_search",
        signature,
        complexity: ComplexityClass::Logarithmic,
        weight: 2,
        description: "Binary search pattern detected",
    }
}

fn sorting(signature: Signature) -> PatternRule {
    PatternRule {
        pattern_type: "sorting",
        signature,
        complexity: ComplexityClass::Linearithmic,
        weight: 2,
        description: "Sorting algorithm detected",
    }
}

fn hash_operations(signature: Signature) -> PatternRule {
    PatternRule {
        pattern_type: "hash_operations",
        signature,
        complexity: ComplexityClass::Constant,
        weight: 1,
        description: "Hash table operations detected",
    }
}

fn array_operations(signature: Signature) -> PatternRule {
    PatternRule {
        pattern_type: "array_operations",
        signature,
        complexity: ComplexityClass::Linear,
        weight: 1,
        description: "Array operations detected",
    }
}

fn brace_language() -> LanguageProfile {
    LanguageProfile {
        id: ProfileId::BraceLanguage,
        syntax: Syntax::Braces,
        halving: re(concat!(
            r"(?i)\bmid\w*\s*=[^;\n]*(?:/\s*2\b|>>>?\s*1\b)",
            r"|\(\s*[\w.]+\s*\+\s*[\w.]+\s*\)\s*(?:/\s*2\b|>>>?\s*1\b)",
            r"|\+\s*\(\s*[\w.]+\s*-\s*[\w.]+\s*\)\s*(?:/\s*2\b|>>>?\s*1\b)",
            r"|/=\s*2\b|>>>?=\s*1\b",
        )),
        rules: vec![
            nested_loops(Signature::NestedLoops),
            single_loop(),
            exponential_recursion(),
            divide_and_conquer(),
            linear_recursion(),
            binary_search(Signature::HalvingLoop),
            binary_search(Signature::Recursion(RecursionShape::Halving)),
            binary_search(Signature::Regex(re(concat!(
                r"\b(?:binarySearch|binary_search(?:_by(?:_key)?)?|partition_point|lower_bound|upper_bound|equal_range)\s*\(",
                r"|\bsort\.Search\w*\s*\(|\bslices\.BinarySearch\w*\s*\(",
            )))),
            sorting(Signature::Regex(re(concat!(
                r"(?:\.|\b)(?:sort|sort_by|sort_by_key|sort_by_cached_key|sort_unstable|sort_unstable_by",
                r"|sort_unstable_by_key|toSorted|qsort|stable_sort)\s*\(",
                r"|\bsort\.(?:Slice|SliceStable|Sort|Stable|Ints|Strings|Float64s)\s*\(",
                r"|\bslices\.Sort\w*\s*\(",
                r"|\.(?:sorted|sortedBy|sortedWith|sortWith|OrderBy|OrderByDescending)\s*[({]",
            )))),
            hash_operations(Signature::OutsideLoops(re(concat!(
                r"\bnew\s+(?:Map|Set|WeakMap|WeakSet|HashMap|HashSet|LinkedHashMap|LinkedHashSet",
                r"|TreeMap|TreeSet|Hashtable|Dictionary|ConcurrentHashMap)\b",
                r"|\b(?:HashMap|HashSet|BTreeMap|BTreeSet|IndexMap|IndexSet)::(?:new|with_capacity|from)\b",
                r"|\bmake\s*\(\s*map\[|\bmap\[[^\]\n]+\][\w*.\[\]]+\s*\{",
                r"|\bstd::(?:unordered_map|unordered_set|map|set)\s*<",
                r"|\b(?:const|let|var)\s+[\w$]+\s*(?::[^=;\n]*)?=\s*\{\s*\}",
                r"|\bObject\.(?:create|fromEntries)\s*\(",
            )))),
            array_operations(Signature::Regex(re(concat!(
                r"\.(?:map|filter|reduce|reduceRight|forEach|find|findIndex|findLast|some|every|indexOf",
                r"|lastIndexOf|includes|flatMap|flat|fill|join|split|slice|reverse|concat|iter|into_iter",
                r"|iter_mut|fold|position|sum)\s*\(",
                r"|\bObject\.(?:keys|values|entries)\s*\(",
                r"|\bMath\.(?:max|min)\s*\(\s*\.\.\.",
                r"|\[\s*\.\.\.[\w$]+|\bArray\.from\s*\(",
            )))),
        ],
    }
}

fn python_like() -> LanguageProfile {
    LanguageProfile {
        id: ProfileId::PythonLike,
        syntax: Syntax::Indentation,
        halving: re(concat!(
            r"(?i)\bmid\w*\s*=[^\n]*(?:/{1,2}\s*2\b|>>\s*1\b)",
            r"|\(\s*[\w.]+\s*\+\s*[\w.]+\s*\)\s*(?:/{1,2}\s*2\b|>>\s*1\b)",
            r"|\+\s*\(\s*[\w.]+\s*-\s*[\w.]+\s*\)\s*(?:/{1,2}\s*2\b|>>\s*1\b)",
            r"|/{1,2}=\s*2\b|>>=\s*1\b",
        )),
        rules: vec![
            nested_loops(Signature::NestedLoops),
            // [(i, j) for i in a for j in b], [[0 for _ in r] for _ in r]
            nested_loops(Signature::Regex(re(
                r"[\[({][^\n]*\bfor\b[^\n]*\bin\b[^\n]*\bfor\b[^\n]*\bin\b",
            ))),
            single_loop(),
            exponential_recursion(),
            divide_and_conquer(),
            linear_recursion(),
            binary_search(Signature::HalvingLoop),
            binary_search(Signature::Recursion(RecursionShape::Halving)),
            binary_search(Signature::Regex(re(
                r"\bbisect(?:_left|_right)?\s*\(|\bsearchsorted\s*\(",
            ))),
            sorting(Signature::Regex(re(
                r"\bsorted\s*\(|\.sort\s*\(|\b(?:np|numpy)\.(?:sort|argsort)\s*\(|\bheapq\.heapify\s*\(",
            ))),
            hash_operations(Signature::OutsideLoops(re(
                r"\b(?:dict|set|frozenset|defaultdict|Counter|OrderedDict)\s*\(|[\w\]]\s*=\s*\{\s*\}",
            ))),
            array_operations(Signature::Regex(re(concat!(
                r"\b(?:sum|any|all|map|filter|reversed|zip|enumerate)\s*\(",
                r"|\b(?:min|max)\s*\([^,()\n]*\)",
                r"|\.(?:index|count|join|extend|copy|remove)\s*\(",
            )))),
            array_operations(Signature::Regex(re(
                r"[\[({][^\[\]{}()\n]*\bfor\b[^\[\]{}()\n]*\bin\b",
            ))),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_agree_per_pattern_type() {
        for id in ProfileId::ALL {
            let table = profile(id);
            for a in &table.rules {
                for b in table.rules.iter().filter(|b| b.pattern_type == a.pattern_type) {
                    assert_eq!(a.complexity, b.complexity, "{} in {}", a.pattern_type, id);
                    assert_eq!(a.weight, b.weight, "{} in {}", a.pattern_type, id);
                    assert_eq!(a.description, b.description, "{} in {}", a.pattern_type, id);
                }
            }
        }
    }

    #[test]
    fn test_required_pattern_types_present() {
        let required = [
            ("nested_loops", ComplexityClass::Quadratic, 3),
            ("exponential_recursion", ComplexityClass::Exponential, 4),
            ("sorting", ComplexityClass::Linearithmic, 2),
            ("binary_search", ComplexityClass::Logarithmic, 2),
            ("single_loop", ComplexityClass::Linear, 1),
            ("array_operations", ComplexityClass::Linear, 1),
            ("hash_operations", ComplexityClass::Constant, 1),
        ];
        for id in ProfileId::ALL {
            let table = profile(id);
            for (pattern_type, class, weight) in required {
                let rule = table
                    .rules
                    .iter()
                    .find(|r| r.pattern_type == pattern_type)
                    .unwrap_or_else(|| panic!("{pattern_type} missing from {id}"));
                assert_eq!(rule.complexity, class);
                assert_eq!(rule.weight, weight);
            }
        }
    }

    #[test]
    fn test_tables_are_shared() {
        let a = profile(ProfileId::PythonLike) as *const LanguageProfile;
        let b = profile(ProfileId::PythonLike) as *const LanguageProfile;
        assert_eq!(a, b);
        assert_eq!(profile(ProfileId::BraceLanguage).syntax, Syntax::Braces);
        assert_eq!(profile(ProfileId::PythonLike).syntax, Syntax::Indentation);
    }

    #[test]
    fn test_pattern_type_order() {
        let types = pattern_types(profile(ProfileId::BraceLanguage));
        assert_eq!(types.first(), Some(&"nested_loops"));
        assert_eq!(types.last(), Some(&"array_operations"));
        assert_eq!(types.iter().filter(|t| **t == "binary_search").count(), 1);
    }

    #[test]
    fn test_halving_expressions() {
        let brace = &profile(ProfileId::BraceLanguage).halving;
        assert!(brace.is_match("let mid = (left + right) / 2;"));
        assert!(brace.is_match("int m = lo + (hi - lo) / 2;"));
        assert!(brace.is_match("const mid = (lo + hi) >>> 1;"));
        assert!(brace.is_match("n /= 2;"));
        assert!(!brace.is_match("total += price * 2;"));

        let python = &profile(ProfileId::PythonLike).halving;
        assert!(python.is_match("mid = (lo + hi) // 2"));
        assert!(python.is_match("n //= 2"));
        assert!(!python.is_match("x = y * 2"));
    }

    #[test]
    fn test_constant_rule_is_never_matched() {
        assert!(!CONSTANT_RULE
            .signature
            .matches("anything", &Structure::default()));
        assert_eq!(CONSTANT_RULE.complexity, ComplexityClass::Constant);
    }
}
