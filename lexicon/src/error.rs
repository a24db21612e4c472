use thiserror::Error;

/// Failures inside the canonicalization pipeline.
///
/// These never escape [`crate::Normalizer::normalize`]; they are logged and
/// the input degrades to an empty set.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("input of {len} chars exceeds the model limit of {max}")]
    InputTooLong { len: usize, max: usize },

    #[error("tokenizer failure: {0}")]
    Tokenizer(String),
}

/// Conditions that surface to the caller as an error outcome.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("could not read document: {0}")]
    UnreadableDocument(String),

    #[error("keyword source '{source_name}' unavailable: {reason}")]
    CatalogSourceUnavailable { source_name: String, reason: String },

    #[error("failed to serialize result: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("analysis exceeded its time budget of {0} ms")]
    TimedOut(u128),
}
