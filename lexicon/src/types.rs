use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Where a piece of raw text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Document,
    Keyword,
}

/// Undecoded-structure text handed to the normalizer, tagged with its origin.
#[derive(Debug, Clone)]
pub struct RawText {
    pub origin: Origin,
    pub text: String,
}

impl RawText {
    pub fn document(text: impl Into<String>) -> Self {
        Self { origin: Origin::Document, text: text.into() }
    }

    pub fn keyword(text: impl Into<String>) -> Self {
        Self { origin: Origin::Keyword, text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Coarse part-of-speech tag assigned by a [`crate::model::Tokenizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pos {
    Word,
    Num,
    Punct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub pos: Pos,
}

impl Token {
    pub fn new(text: impl Into<String>, pos: Pos) -> Self {
        Self { text: text.into(), pos }
    }
}

/// Order-free, duplicate-free set of canonical surface forms.
///
/// Backed by a `BTreeSet` so iteration (and everything derived from it) is
/// sorted and reproducible across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalSet {
    tokens: BTreeSet<String>,
}

impl CanonicalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set holding every contiguous run of `1..=max_n` tokens,
    /// each run joined by a single space.
    pub fn with_ngrams(tokens: &[String], max_n: usize) -> Self {
        let mut set = BTreeSet::new();
        let max_n = max_n.max(1);
        for start in 0..tokens.len() {
            let end_limit = (start + max_n).min(tokens.len());
            for end in start + 1..=end_limit {
                set.insert(tokens[start..end].join(" "));
            }
        }
        Self { tokens: set }
    }

    /// Like [`CanonicalSet::with_ngrams`] for each run on its own, so no
    /// n-gram spans the gap between two runs.
    pub fn from_runs(runs: &[Vec<String>], max_n: usize) -> Self {
        let tokens = runs
            .iter()
            .flat_map(|run| Self::with_ngrams(run, max_n).tokens)
            .collect();
        Self { tokens }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Space-joined rendering, suitable for feeding back into the normalizer.
    pub fn as_text(&self) -> String {
        self.iter().collect::<Vec<_>>().join(" ")
    }

    pub(crate) fn insert(&mut self, token: String) -> bool {
        self.tokens.insert(token)
    }
}

impl FromIterator<String> for CanonicalSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self { tokens: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a CanonicalSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Catalog entries found in one document. Empty is a valid, non-matching result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchResult {
    pub terms: Vec<String>,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }
}

/// Externally visible result of analyzing one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Ok(MatchResult),
    Error(String),
}

impl AnalysisOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, AnalysisOutcome::Ok(_))
    }

    pub fn matches(&self) -> &[String] {
        match self {
            AnalysisOutcome::Ok(m) => &m.terms,
            AnalysisOutcome::Error(_) => &[],
        }
    }
}

impl From<crate::AnalysisError> for AnalysisOutcome {
    fn from(err: crate::AnalysisError) -> Self {
        AnalysisOutcome::Error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn ngrams_cover_contiguous_runs_only() {
        let set = CanonicalSet::with_ngrams(&toks("zero day exploit"), 2);
        assert!(set.contains("zero day"));
        assert!(set.contains("day exploit"));
        assert!(set.contains("exploit"));
        assert!(!set.contains("zero exploit"));
        assert!(!set.contains("zero day exploit"));
    }

    #[test]
    fn ngrams_of_one_is_plain_set() {
        let set = CanonicalSet::with_ngrams(&toks("a b a"), 1);
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_text(), "a b");
    }

    #[test]
    fn runs_do_not_bridge_gaps() {
        let set = CanonicalSet::from_runs(&[toks("brute"), toks("force attack")], 3);
        assert!(set.contains("brute"));
        assert!(set.contains("force attack"));
        assert!(!set.contains("brute force"));
        assert_eq!(set.len(), 4);
    }
}
