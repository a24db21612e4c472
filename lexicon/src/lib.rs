// Public modules so termwatch-core can use them
pub mod assets;
pub mod catalog;
pub mod english;
pub mod error;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod record;
pub mod types;

pub use catalog::{build_catalog, parse_rows, CatalogBuilder, KeywordCatalog, RowFilter, SourceSummary};
pub use english::EnglishModel;
pub use error::{AnalysisError, NormalizeError};
pub use matcher::{canonicalize_document, match_terms, PhraseMode};
pub use model::{Inflector, NumeralSpeller, Tokenizer};
pub use normalize::{Normalizer, NormalizerConfig, PluralPolicy};
pub use record::{Artifact, HostRecord, Status};
pub use types::{AnalysisOutcome, CanonicalSet, MatchResult, Origin, Pos, RawText, Token};

/// --- Pure Rust API for termwatch-core ---
///
/// Normalize `text` with the same normalizer that built `catalog` and return
/// the matched entries.
pub fn scan_text(
    normalizer: &Normalizer,
    catalog: &KeywordCatalog,
    mode: PhraseMode,
    text: &str,
) -> MatchResult {
    let document = canonicalize_document(normalizer, text, catalog, mode);
    match_terms(&document, catalog)
}

/// Same as [`scan_text`], rendered as the host-facing JSON record.
pub fn scan_text_json(
    normalizer: &Normalizer,
    catalog: &KeywordCatalog,
    mode: PhraseMode,
    text: &str,
) -> Result<String, AnalysisError> {
    let outcome = AnalysisOutcome::Ok(scan_text(normalizer, catalog, mode, text));
    Ok(HostRecord::from_outcome(&outcome).to_json()?)
}
