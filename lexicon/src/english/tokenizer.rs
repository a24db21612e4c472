use unicode_segmentation::UnicodeSegmentation;

use crate::error::NormalizeError;
use crate::types::{Pos, Token};

/// Split on UAX #29 word boundaries, drop whitespace runs, tag the rest.
///
/// Word-internal apostrophes and dots (`don't`, `evil.com`) and numeric
/// separators (`1,000`, `3.5`) stay inside a single token; hyphens and
/// surrounding punctuation become tokens of their own.
pub(crate) fn tokenize(text: &str, max_length: usize) -> Result<Vec<Token>, NormalizeError> {
    let len = text.chars().count();
    if len > max_length {
        return Err(NormalizeError::InputTooLong { len, max: max_length });
    }

    Ok(text
        .split_word_bounds()
        .filter(|seg| !seg.chars().all(char::is_whitespace))
        .map(|seg| Token::new(seg, classify(seg)))
        .collect())
}

fn classify(seg: &str) -> Pos {
    if !seg.chars().any(char::is_alphanumeric) {
        return Pos::Punct;
    }
    match seg.chars().next() {
        Some(c) if c.is_numeric() => Pos::Num,
        _ => Pos::Word,
    }
}
