//! Language-model capabilities consumed by the normalizer.
//!
//! The normalizer only sees these traits, so a different language or a
//! statistical model can be swapped in without touching its control flow.
//! Implementations are shared read-only across threads.

use crate::error::NormalizeError;
use crate::types::Token;

/// Splits text into tagged tokens. Whitespace never appears in the output.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, NormalizeError>;
}

/// Detects numerals and spells them out as words.
pub trait NumeralSpeller: Send + Sync {
    fn is_numeral(&self, token: &str) -> bool;

    /// Word form of a numeral, or `None` when the token is not one this
    /// speller understands.
    fn spell(&self, token: &str) -> Option<String>;
}

/// Number inflection for nouns.
pub trait Inflector: Send + Sync {
    fn is_plural_noun(&self, word: &str) -> bool;

    /// Singular form of a plural noun; `None` if `word` is not plural.
    fn singularize(&self, word: &str) -> Option<String>;
}
