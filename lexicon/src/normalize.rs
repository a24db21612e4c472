//! Canonicalization pipeline shared by documents and watchlist terms.
//!
//! Steps, each over the whole re-tokenized text:
//! 1. lower-case
//! 2. tokenize
//! 3. spell out numerals ("2" -> "two"); skipped without a speller
//! 4. drop tokens still tagged as numerals ("2nd", "10am")
//! 5. trim leading/trailing non-alphanumeric characters (any script, so "™"
//!    and emoji go too), drop tokens left empty, and drop tokens the trim
//!    turned into numerals ("_2_")
//! 6. apply the plural policy; skipped without an inflector
//!
//! Tokens removed in steps 4 to 6 leave a gap: the surviving tokens on
//! either side are not adjacent in [`Normalizer::normalize_raw`] runs.
//! Tokens that were only punctuation leave none.
//!
//! Keywords and documents must go through the same `Normalizer` value, or
//! matching silently breaks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::english::EnglishModel;
use crate::error::NormalizeError;
use crate::model::{Inflector, NumeralSpeller, Tokenizer};
use crate::types::{CanonicalSet, Origin, Pos, RawText, Token};

/// What happens to tokens the inflector reads as plural nouns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluralPolicy {
    /// Remove the token. "threats" disappears; "threat" stays distinct.
    #[default]
    Drop,
    /// Replace the token with its singular form.
    Singularize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizerConfig {
    pub plural_policy: PluralPolicy,
    pub spell_numerals: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            plural_policy: PluralPolicy::Drop,
            spell_numerals: true,
        }
    }
}

#[derive(Clone)]
pub struct Normalizer {
    tokenizer: Arc<dyn Tokenizer>,
    speller: Option<Arc<dyn NumeralSpeller>>,
    inflector: Option<Arc<dyn Inflector>>,
    config: NormalizerConfig,
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer")
            .field("speller", &self.speller.is_some())
            .field("inflector", &self.inflector.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::english(EnglishModel::default(), NormalizerConfig::default())
    }
}

impl Normalizer {
    /// Tokenizer only: numerals and plurals pass through untouched.
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            tokenizer,
            speller: None,
            inflector: None,
            config: NormalizerConfig::default(),
        }
    }

    /// All three capabilities backed by one English model.
    pub fn english(model: EnglishModel, config: NormalizerConfig) -> Self {
        let model = Arc::new(model);
        Self {
            tokenizer: model.clone(),
            speller: Some(model.clone()),
            inflector: Some(model),
            config,
        }
    }

    pub fn with_speller(mut self, speller: Arc<dyn NumeralSpeller>) -> Self {
        self.speller = Some(speller);
        self
    }

    pub fn with_inflector(mut self, inflector: Arc<dyn Inflector>) -> Self {
        self.inflector = Some(inflector);
        self
    }

    pub fn with_config(mut self, config: NormalizerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> NormalizerConfig {
        self.config
    }

    /// Canonical set for `text`. Never fails: internal errors are logged and
    /// yield an empty set.
    pub fn normalize(&self, text: &str) -> CanonicalSet {
        self.normalize_tokens(text).into_iter().collect()
    }

    /// Surviving tokens in document order (duplicates kept). Fail-soft like
    /// [`Normalizer::normalize`].
    pub fn normalize_tokens(&self, text: &str) -> Vec<String> {
        self.runs_or_empty(Origin::Document, text).concat()
    }

    /// Surviving tokens split into runs that were contiguous in the input.
    /// Fail-soft; the warning names where the text came from.
    pub fn normalize_raw(&self, raw: &RawText) -> Vec<Vec<String>> {
        self.runs_or_empty(raw.origin, raw.as_str())
    }

    pub(crate) fn runs_or_empty(&self, origin: Origin, text: &str) -> Vec<Vec<String>> {
        match self.try_normalize_runs(text) {
            Ok(runs) => runs,
            Err(err) => {
                tracing::warn!(error = %err, ?origin, chars = text.len(), "normalization failed; treating input as empty");
                Vec::new()
            }
        }
    }

    pub fn try_normalize_tokens(&self, text: &str) -> Result<Vec<String>, NormalizeError> {
        Ok(self.try_normalize_runs(text)?.concat())
    }

    pub fn try_normalize_runs(&self, text: &str) -> Result<Vec<Vec<String>>, NormalizeError> {
        let lowered = text.to_lowercase();
        let spelled = self.spell_numerals(&lowered)?;
        let without_numerals = self.drop_numerals(&spelled)?;
        let stripped = self.strip_punctuation(without_numerals)?;
        let runs = split_runs(self.apply_plural_policy(stripped));
        tracing::debug!(runs = runs.len(), "normalized text");
        Ok(runs)
    }

    fn spell_numerals(&self, text: &str) -> Result<String, NormalizeError> {
        let tokens = self.tokenizer.tokenize(text)?;
        let speller = match (&self.speller, self.config.spell_numerals) {
            (Some(s), true) => s,
            _ => return Ok(join(tokens.into_iter().map(|t| t.text))),
        };
        Ok(join(tokens.into_iter().map(|t| {
            if speller.is_numeral(&t.text) {
                speller.spell(&t.text).unwrap_or(t.text)
            } else {
                t.text
            }
        })))
    }

    /// Numerals become gaps (`None`); everything else passes on tagged.
    fn drop_numerals(&self, text: &str) -> Result<Vec<Option<Token>>, NormalizeError> {
        let tokens = self.tokenizer.tokenize(text)?;
        Ok(tokens
            .into_iter()
            .map(|t| (t.pos != Pos::Num).then_some(t))
            .collect())
    }

    fn strip_punctuation(&self, tokens: Vec<Option<Token>>) -> Result<Vec<Option<String>>, NormalizeError> {
        let mut out = Vec::with_capacity(tokens.len());
        for token in tokens {
            let Some(token) = token else {
                out.push(None);
                continue;
            };
            let trimmed = token.text.trim_matches(|c: char| !c.is_alphanumeric());
            if trimmed.is_empty() {
                continue;
            }
            // Only a trimmed token can hide a numeral the earlier tagging missed.
            if trimmed.len() != token.text.len() && self.is_numeral_token(trimmed)? {
                out.push(None);
                continue;
            }
            out.push(Some(trimmed.to_string()));
        }
        Ok(out)
    }

    fn is_numeral_token(&self, text: &str) -> Result<bool, NormalizeError> {
        Ok(self.tokenizer.tokenize(text)?.iter().any(|t| t.pos == Pos::Num))
    }

    fn apply_plural_policy(&self, tokens: Vec<Option<String>>) -> Vec<Option<String>> {
        let Some(inflector) = &self.inflector else {
            return tokens;
        };
        match self.config.plural_policy {
            PluralPolicy::Drop => tokens
                .into_iter()
                .map(|t| t.filter(|t| !inflector.is_plural_noun(t)))
                .collect(),
            PluralPolicy::Singularize => tokens
                .into_iter()
                .map(|t| t.map(|t| inflector.singularize(&t).unwrap_or(t)))
                .collect(),
        }
    }
}

fn split_runs(tokens: Vec<Option<String>>) -> Vec<Vec<String>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for token in tokens {
        match token {
            Some(t) => current.push(t),
            None if current.is_empty() => {}
            None => runs.push(std::mem::take(&mut current)),
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn join(words: impl Iterator<Item = String>) -> String {
    words.collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingTokenizer;

    impl Tokenizer for FailingTokenizer {
        fn tokenize(&self, _text: &str) -> Result<Vec<Token>, NormalizeError> {
            Err(NormalizeError::Tokenizer("model not loaded".into()))
        }
    }

    fn words(set: &CanonicalSet) -> Vec<&str> {
        set.iter().collect()
    }

    #[test]
    fn lowercases_and_strips_punctuation() {
        let n = Normalizer::default();
        assert_eq!(words(&n.normalize("This is a BAD cyberattack.")), vec!["a", "bad", "cyberattack", "is", "this"]);
    }

    #[test]
    fn failing_tokenizer_degrades_to_empty() {
        let n = Normalizer::new(Arc::new(FailingTokenizer));
        assert!(n.normalize("anything at all").is_empty());
        assert!(n.try_normalize_tokens("anything").is_err());
    }

    #[test]
    fn tokenizer_only_keeps_numerals_untouched_until_numeral_drop() {
        let n = Normalizer::new(Arc::new(EnglishModel::default()));
        // No speller: "2" is never spelled, so the numeral filter removes it.
        assert_eq!(words(&n.normalize("2 threats")), vec!["threats"]);
    }

    #[test]
    fn spelling_can_be_disabled() {
        let n = Normalizer::english(
            EnglishModel::default(),
            NormalizerConfig { spell_numerals: false, ..NormalizerConfig::default() },
        );
        assert!(!n.normalize("2 bad").contains("two"));
    }

    #[test]
    fn singularize_policy_keeps_stems() {
        let n = Normalizer::english(
            EnglishModel::default(),
            NormalizerConfig { plural_policy: PluralPolicy::Singularize, ..NormalizerConfig::default() },
        );
        let set = n.normalize("Threats and vulnerabilities");
        assert!(set.contains("threat"));
        assert!(set.contains("vulnerability"));
        assert!(!set.contains("threats"));
    }

    #[test]
    fn oversized_input_is_fail_soft() {
        let n = Normalizer::english(EnglishModel::with_max_length(4), NormalizerConfig::default());
        assert!(n.normalize("malware everywhere").is_empty());
    }

    #[test]
    fn tokens_keep_document_order() {
        let n = Normalizer::default();
        assert_eq!(n.normalize_tokens("Zero day, zero day!"), vec!["zero", "day", "zero", "day"]);
    }

    #[test]
    fn underscored_numerals_do_not_survive_the_trim() {
        let n = Normalizer::default();
        let once = n.normalize("build _2_ ready __10__ x_2");
        assert_eq!(words(&once), vec!["build", "ready", "x_2"]);
        assert!(once.iter().all(|t| !t.starts_with(|c: char| c.is_numeric())));
        assert_eq!(n.normalize(&once.as_text()), once);
    }

    #[test]
    fn dropped_tokens_split_runs() {
        let n = Normalizer::default();
        let runs = n.normalize_raw(&RawText::document("Brute attempts force, zero-day 10am exploit"));
        assert_eq!(runs, vec![vec!["brute"], vec!["force", "zero", "day"], vec!["exploit"]]);
    }

    #[test]
    fn punctuation_alone_does_not_split_runs() {
        let n = Normalizer::default();
        assert_eq!(n.normalize_raw(&RawText::keyword("\"zero\" - day!")), vec![vec!["zero", "day"]]);
    }

    #[test]
    fn non_ascii_symbols_are_trimmed_like_punctuation() {
        let n = Normalizer::default();
        assert_eq!(n.normalize_tokens("“malware”™ 🔥 café"), vec!["malware", "café"]);
    }

    #[test]
    fn failing_keyword_is_empty_too() {
        let n = Normalizer::new(Arc::new(FailingTokenizer));
        assert!(n.normalize_raw(&RawText::keyword("ransomware")).is_empty());
    }
}
