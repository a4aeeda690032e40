//! Explanation text

use crate::complexity::ComplexityClass;
use crate::rules::PatternRule;

/// `"<sentence>. Detected patterns: <descriptions>"`, descriptions deduplicated
/// in first-seen order.
pub fn explain(complexity: ComplexityClass, rules: &[&PatternRule]) -> String {
    let mut descriptions: Vec<&str> = Vec::with_capacity(rules.len());
    for rule in rules {
        if !descriptions.contains(&rule.description) {
            descriptions.push(rule.description);
        }
    }
    format!(
        "{}. Detected patterns: {}",
        complexity.sentence(),
        descriptions.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::ProfileId;
    use crate::rules::{profile, CONSTANT_RULE};

    #[test]
    fn test_constant_explanation() {
        assert_eq!(
            explain(ComplexityClass::Constant, &[&CONSTANT_RULE]),
            "Constant time - executes in fixed time regardless of input size. \
             Detected patterns: Simple operations, likely constant time"
        );
    }

    #[test]
    fn test_duplicate_descriptions_collapse() {
        let binary: Vec<&PatternRule> = profile(ProfileId::BraceLanguage)
            .rules
            .iter()
            .filter(|r| r.pattern_type == "binary_search" || r.pattern_type == "single_loop")
            .collect();
        assert_eq!(
            explain(ComplexityClass::Linear, &binary),
            "Linear time - time increases linearly with input size. \
             Detected patterns: Single loop detected, Binary search pattern detected"
        );
    }
}
