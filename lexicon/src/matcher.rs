use serde::{Deserialize, Serialize};

use crate::catalog::KeywordCatalog;
use crate::normalize::Normalizer;
use crate::types::{CanonicalSet, MatchResult, Origin};

/// How multi-word catalog entries meet a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhraseMode {
    /// Document is a flat token set; a phrase only matches if it equals a
    /// single document token.
    #[default]
    Exact,
    /// Document also carries its ordered n-grams, so a phrase matches a
    /// contiguous run of tokens. A dropped numeral or plural breaks the run.
    Sequence,
}

/// Canonical form of a document for matching against `catalog`.
pub fn canonicalize_document(
    normalizer: &Normalizer,
    text: &str,
    catalog: &KeywordCatalog,
    mode: PhraseMode,
) -> CanonicalSet {
    let runs = normalizer.runs_or_empty(Origin::Document, text);
    match mode {
        PhraseMode::Exact => runs.into_iter().flatten().collect(),
        PhraseMode::Sequence => CanonicalSet::from_runs(&runs, catalog.max_phrase_len()),
    }
}

/// Every catalog entry present in the document set, sorted.
pub fn match_terms(document: &CanonicalSet, catalog: &KeywordCatalog) -> MatchResult {
    let (small, large) = if document.len() < catalog.len() {
        (document, catalog.entries())
    } else {
        (catalog.entries(), document)
    };
    MatchResult {
        terms: small
            .iter()
            .filter(|t| large.contains(t))
            .map(str::to_string)
            .collect(),
    }
}
