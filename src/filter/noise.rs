//! Noise line classification.
//!
//! The engine interleaves diagnostics with transcript text on shared
//! streams and the noise vocabulary is engine-version-specific, so the
//! rule set is an ordered, configurable list of predicates rather than
//! hardcoded checks. New noise patterns are config additions, not code
//! edits.

use crate::config::FilterSection;

/// A single keep/drop predicate applied to a candidate line.
#[derive(Debug, Clone, PartialEq)]
pub enum NoiseRule {
    /// Drops lines starting with the given prefix (engine banners,
    /// loader output).
    Prefix(String),
    /// Drops lines containing the given substring (silence markers).
    Contains(String),
    /// Drops lines with no ASCII alphanumeric character at all
    /// (punctuation-only hallucinations, meter fragments).
    NoAlphanumeric,
}

impl NoiseRule {
    /// Returns true if the line matches this rule and should be dropped.
    pub fn matches(&self, line: &str) -> bool {
        match self {
            NoiseRule::Prefix(prefix) => line.starts_with(prefix.as_str()),
            NoiseRule::Contains(marker) => line.contains(marker.as_str()),
            NoiseRule::NoAlphanumeric => !line.chars().any(|c| c.is_ascii_alphanumeric()),
        }
    }
}

/// Returns true if any rule classifies the line as noise.
///
/// Pure: the same line always gets the same decision.
pub fn is_noise(line: &str, rules: &[NoiseRule]) -> bool {
    rules.iter().any(|rule| rule.matches(line))
}

/// Builds the ordered rule list from configuration.
///
/// Prefix rules come first (cheapest, most common), then markers, then
/// the alphanumeric check as the final catch-all.
pub fn resolve_noise_rules(filter: &FilterSection) -> Vec<NoiseRule> {
    let mut rules: Vec<NoiseRule> = filter
        .noise_prefixes
        .iter()
        .cloned()
        .map(NoiseRule::Prefix)
        .collect();
    rules.extend(filter.noise_markers.iter().cloned().map(NoiseRule::Contains));
    rules.push(NoiseRule::NoAlphanumeric);
    rules
}
