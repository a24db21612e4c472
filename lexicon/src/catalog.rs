//! Watchlist catalog: the normalized union of every keyword source.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::normalize::Normalizer;
use crate::types::{CanonicalSet, Origin, RawText};

/// Rows removed before normalization.
///
/// Blank and whitespace-only rows are always dropped. `skip_rows` holds
/// indices into the concatenation of all sources, in source order, for
/// upstream lists with a known malformed row at a fixed position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    skip_rows: BTreeSet<usize>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skipping(rows: impl IntoIterator<Item = usize>) -> Self {
        Self { skip_rows: rows.into_iter().collect() }
    }

    fn keeps(&self, index: usize, row: &str) -> bool {
        !self.skip_rows.contains(&index) && !row.trim().is_empty()
    }
}

/// Row count for one source, kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub name: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordCatalog {
    entries: CanonicalSet,
    max_phrase_len: usize,
    sources: Vec<SourceSummary>,
    filtered_rows: usize,
    empty_rows: usize,
    fingerprint: String,
}

impl KeywordCatalog {
    pub fn entries(&self) -> &CanonicalSet {
        &self.entries
    }

    pub fn contains(&self, term: &str) -> bool {
        self.entries.contains(term)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Token count of the longest entry (at least 1).
    pub fn max_phrase_len(&self) -> usize {
        self.max_phrase_len
    }

    pub fn sources(&self) -> &[SourceSummary] {
        &self.sources
    }

    /// Rows removed by the [`RowFilter`].
    pub fn filtered_rows(&self) -> usize {
        self.filtered_rows
    }

    /// Rows that normalized to nothing (e.g. a lone plural or a number).
    pub fn empty_rows(&self) -> usize {
        self.empty_rows
    }

    /// blake3 over the sorted entries; identifies the watchlist a result was
    /// produced against.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Collects keyword sources, then normalizes them row by row.
pub struct CatalogBuilder<'a> {
    normalizer: &'a Normalizer,
    filter: RowFilter,
    sources: Vec<(String, Vec<String>)>,
}

impl<'a> CatalogBuilder<'a> {
    pub fn new(normalizer: &'a Normalizer) -> Self {
        Self {
            normalizer,
            filter: RowFilter::default(),
            sources: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: RowFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Add a source from its raw text, one term per line.
    pub fn source(mut self, name: impl Into<String>, text: &RawText) -> Self {
        self.sources.push((name.into(), parse_rows(text.as_str())));
        self
    }

    /// Add a source whose rows are already split.
    pub fn rows<I, S>(mut self, name: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources
            .push((name.into(), rows.into_iter().map(Into::into).collect()));
        self
    }

    pub fn build(self) -> KeywordCatalog {
        let mut entries = CanonicalSet::new();
        let mut max_phrase_len = 1;
        let mut filtered_rows = 0;
        let mut empty_rows = 0;
        let mut summaries = Vec::with_capacity(self.sources.len());

        let all_rows = self.sources.iter().flat_map(|(_, rows)| rows.iter());
        for (index, row) in all_rows.enumerate() {
            if !self.filter.keeps(index, row) {
                filtered_rows += 1;
                continue;
            }
            let tokens = self.normalizer.runs_or_empty(Origin::Keyword, row).concat();
            if tokens.is_empty() {
                empty_rows += 1;
                continue;
            }
            max_phrase_len = max_phrase_len.max(tokens.len());
            entries.insert(tokens.join(" "));
        }

        for (name, rows) in &self.sources {
            summaries.push(SourceSummary { name: name.clone(), rows: rows.len() });
        }

        let fingerprint = fingerprint(&entries);
        tracing::info!(
            entries = entries.len(),
            filtered_rows,
            empty_rows,
            fingerprint = %fingerprint,
            "keyword catalog built"
        );

        KeywordCatalog {
            entries,
            max_phrase_len,
            sources: summaries,
            filtered_rows,
            empty_rows,
            fingerprint,
        }
    }
}

/// Build a catalog from raw sources named `source-0`, `source-1`, ...
pub fn build_catalog(normalizer: &Normalizer, sources: &[RawText], filter: RowFilter) -> KeywordCatalog {
    sources
        .iter()
        .enumerate()
        .fold(CatalogBuilder::new(normalizer).filter(filter), |b, (i, text)| {
            b.source(format!("source-{i}"), text)
        })
        .build()
}

/// One term per line; only the first CSV column is kept.
pub fn parse_rows(text: &str) -> Vec<String> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    text.lines().map(first_csv_field).collect()
}

fn first_csv_field(line: &str) -> String {
    let line = line.trim_end_matches('\r');
    let Some(quoted) = line.strip_prefix('"') else {
        return line.split(',').next().unwrap_or("").to_string();
    };

    let mut out = String::new();
    let mut chars = quoted.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                out.push('"');
                chars.next();
            } else {
                break;
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn fingerprint(entries: &CanonicalSet) -> String {
    let mut hasher = blake3::Hasher::new();
    for entry in entries {
        hasher.update(entry.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}
