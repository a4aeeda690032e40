//! Complexity resolution
//!
//! Reduces matched rules to a single class by class rank alone.

use crate::complexity::ComplexityClass;
use crate::rules::{PatternRule, CONSTANT_RULE};

/// Dominant class plus the rules that were considered
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub complexity: ComplexityClass,
    /// All matched rules, or just the constant fallback when none matched
    pub rules: Vec<&'a PatternRule>,
}

/// Worst class among `matched`; `O(1)` with the constant fallback when empty.
///
/// Weights never participate.
pub fn resolve<'a>(matched: &[&'a PatternRule]) -> Resolution<'a> {
    match matched.iter().map(|rule| rule.complexity).max() {
        Some(complexity) => Resolution {
            complexity,
            rules: matched.to_vec(),
        },
        None => Resolution {
            complexity: ComplexityClass::Constant,
            rules: vec![&CONSTANT_RULE],
        },
    }
}
