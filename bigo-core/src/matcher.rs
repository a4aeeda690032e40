//! Pattern matching
//!
//! Pure, stateless evaluation of a rule table against one snippet.
//! Same inputs always produce the same matches, in table order.

use crate::rules::{LanguageProfile, PatternRule};
use crate::source::normalize;
use crate::structure::Structure;

/// Every rule in `profile` whose signature holds at least once in `source`.
///
/// Comments and string contents are masked first, so neither can trigger a
/// rule. Never fails; empty input yields no matches.
pub fn match_rules(source: &str, profile: &'static LanguageProfile) -> Vec<&'static PatternRule> {
    let text = normalize(source, profile.syntax);
    let structure = Structure::scan(&text, profile.syntax, &profile.halving);

    tracing::debug!(
        profile = %profile.id,
        loops = structure.loops.len(),
        functions = structure.functions.len(),
        "scanned structure"
    );

    profile
        .rules
        .iter()
        .filter(|rule| rule.signature.matches(&text, &structure))
        .collect()
}
