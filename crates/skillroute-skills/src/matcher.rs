//! Keyword matcher compiled from manifest rules.
//!
//! Each rule is compiled once into two [`aho_corasick`] automata, one for its
//! include keywords and one for its excludes, so scoring a request is a
//! single pass over the text per automaton.
//!
//! Scoring lower-cases the request text and returns the largest weight among
//! rules whose includes are all present and whose excludes are all absent,
//! or 0 when no rule matches.  A rule with no includes matches vacuously.

use std::collections::HashSet;

use aho_corasick::AhoCorasick;

use crate::manifest::MatcherRule;

/// Compiled set of keyword rules.
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    rules: Vec<CompiledRule>,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    /// Automaton over the distinct, lower-cased include keywords.
    includes: Option<AhoCorasick>,
    include_count: usize,
    excludes: Option<AhoCorasick>,
    /// An empty exclude keyword is present in every text, so the rule can
    /// never match.
    never: bool,
    weight: f64,
}

impl KeywordMatcher {
    /// Compile manifest rules.  Rules whose automaton cannot be built are
    /// dropped with a warning.
    pub fn new(rules: &[MatcherRule]) -> Self {
        let rules = rules
            .iter()
            .filter_map(|rule| match CompiledRule::compile(rule) {
                Ok(compiled) => Some(compiled),
                Err(e) => {
                    tracing::warn!(error = %e, includes = ?rule.includes, "failed to build matcher rule");
                    None
                }
            })
            .collect();
        Self { rules }
    }

    /// Score `text` against every rule.
    pub fn score(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .filter(|rule| rule.matches(&lowered))
            .map(|rule| rule.weight)
            .fold(0.0, f64::max)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl CompiledRule {
    fn compile(rule: &MatcherRule) -> Result<Self, aho_corasick::BuildError> {
        let includes = distinct_keywords(&rule.includes);
        let excludes = distinct_keywords(&rule.excludes);
        let never = rule.excludes.iter().any(|k| k.is_empty());

        Ok(Self {
            include_count: includes.len(),
            includes: build(&includes)?,
            excludes: build(&excludes)?,
            never,
            weight: rule.weight(),
        })
    }

    fn matches(&self, lowered: &str) -> bool {
        if self.never {
            return false;
        }
        if self.excludes.as_ref().is_some_and(|ac| ac.is_match(lowered)) {
            return false;
        }
        let Some(ac) = &self.includes else {
            return true;
        };

        let mut seen = HashSet::with_capacity(self.include_count);
        for mat in ac.find_overlapping_iter(lowered) {
            seen.insert(mat.pattern());
            if seen.len() == self.include_count {
                return true;
            }
        }
        false
    }
}

/// Lower-case, drop empty keywords (an empty include is always present), and
/// deduplicate.
fn distinct_keywords(keywords: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        let lowered = keyword.to_lowercase();
        if !lowered.is_empty() && !out.contains(&lowered) {
            out.push(lowered);
        }
    }
    out
}

fn build(keywords: &[String]) -> Result<Option<AhoCorasick>, aho_corasick::BuildError> {
    if keywords.is_empty() {
        return Ok(None);
    }
    AhoCorasick::new(keywords).map(Some)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(includes: &[&str], excludes: &[&str], weight: Option<f64>) -> MatcherRule {
        MatcherRule {
            includes: includes.iter().map(|s| (*s).to_owned()).collect(),
            excludes: excludes.iter().map(|s| (*s).to_owned()).collect(),
            weight,
        }
    }

    #[test]
    fn no_rules_scores_zero() {
        assert_eq!(KeywordMatcher::new(&[]).score("anything"), 0.0);
    }

    #[test]
    fn include_match_is_case_insensitive() {
        let matcher = KeywordMatcher::new(&[rule(&["Deck"], &[], None)]);
        assert_eq!(matcher.score("Plan a DECK for investors"), 0.6);
        assert_eq!(matcher.score("plan a talk"), 0.0);
    }

    #[test]
    fn all_includes_must_be_present() {
        let matcher = KeywordMatcher::new(&[rule(&["wedding", "speech"], &[], Some(0.9))]);
        assert_eq!(matcher.score("a speech for the wedding"), 0.9);
        assert_eq!(matcher.score("a speech for the board"), 0.0);
    }

    #[test]
    fn excludes_veto_a_rule() {
        let matcher = KeywordMatcher::new(&[rule(&["deck"], &["card"], Some(0.8))]);
        assert_eq!(matcher.score("build a deck"), 0.8);
        assert_eq!(matcher.score("shuffle the card deck"), 0.0);
    }

    #[test]
    fn highest_matching_weight_wins() {
        let matcher = KeywordMatcher::new(&[
            rule(&["deck"], &[], Some(0.5)),
            rule(&["deck", "investors"], &[], Some(0.95)),
            rule(&["slides"], &[], Some(0.7)),
        ]);
        assert_eq!(matcher.score("deck"), 0.5);
        assert_eq!(matcher.score("deck for investors"), 0.95);
        assert_eq!(matcher.score("slides and a deck"), 0.7);
    }

    #[test]
    fn empty_includes_match_vacuously() {
        let matcher = KeywordMatcher::new(&[rule(&[], &["spam"], Some(0.2))]);
        assert_eq!(matcher.score("hello"), 0.2);
        assert_eq!(matcher.score("spam"), 0.0);
    }

    #[test]
    fn empty_exclude_never_matches() {
        let matcher = KeywordMatcher::new(&[rule(&["deck"], &[""], Some(0.9))]);
        assert_eq!(matcher.score("deck"), 0.0);
    }

    #[test]
    fn duplicate_and_overlapping_includes() {
        let matcher = KeywordMatcher::new(&[rule(&["deck", "DECK", "ck"], &[], Some(0.4))]);
        assert_eq!(matcher.score("deck"), 0.4);
        assert_eq!(matcher.rule_count(), 1);
    }

    #[test]
    fn weights_are_not_clamped_here() {
        let matcher = KeywordMatcher::new(&[rule(&["x"], &[], Some(1.5))]);
        assert_eq!(matcher.score("x"), 1.5);
    }
}
