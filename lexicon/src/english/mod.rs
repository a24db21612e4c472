//! Built-in rule-based English model.
//!
//! - **tokenizer**: UAX #29 word segmentation with a coarse POS tag
//! - **numerals**: digit detection and spelled-out English words
//! - **inflect**: plural detection and singularization

mod inflect;
mod numerals;
mod tokenizer;

use crate::error::NormalizeError;
use crate::model::{Inflector, NumeralSpeller, Tokenizer};
use crate::types::Token;

/// Default cap on input size, in characters.
pub const DEFAULT_MAX_LENGTH: usize = 1_000_000;

#[derive(Debug, Clone, Copy)]
pub struct EnglishModel {
    max_length: usize,
}

impl Default for EnglishModel {
    fn default() -> Self {
        Self { max_length: DEFAULT_MAX_LENGTH }
    }
}

impl EnglishModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inputs longer than `max_length` characters fail to tokenize.
    pub fn with_max_length(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Tokenizer for EnglishModel {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, NormalizeError> {
        tokenizer::tokenize(text, self.max_length)
    }
}

impl NumeralSpeller for EnglishModel {
    fn is_numeral(&self, token: &str) -> bool {
        numerals::is_numeral(token)
    }

    fn spell(&self, token: &str) -> Option<String> {
        numerals::spell(token)
    }
}

impl Inflector for EnglishModel {
    fn is_plural_noun(&self, word: &str) -> bool {
        inflect::is_plural_noun(word)
    }

    fn singularize(&self, word: &str) -> Option<String> {
        inflect::singularize(word)
    }
}
