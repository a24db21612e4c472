//! services/catalog_cache.rs
//! Compute-once keyword catalog. After the first successful build the catalog
//! is frozen and shared read-only.

use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::services::sources::{KeywordSource, fetch_all};
use lexicon::{AnalysisError, CatalogBuilder, KeywordCatalog, Normalizer, RawText, RowFilter};

#[derive(Default)]
pub struct CatalogCache {
    cell: OnceCell<Arc<KeywordCatalog>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached catalog, building it from `sources` on first use.
    ///
    /// A failed build leaves the cache empty so a later call can retry.
    pub fn get_or_build(
        &self,
        normalizer: &Normalizer,
        filter: &RowFilter,
        sources: &[Box<dyn KeywordSource>],
    ) -> Result<Arc<KeywordCatalog>, AnalysisError> {
        self.cell
            .get_or_try_init(|| {
                let fetched = fetch_all(sources)?;
                let catalog = fetched
                    .iter()
                    .fold(
                        CatalogBuilder::new(normalizer).filter(filter.clone()),
                        |b, (name, text)| b.source(name.as_str(), &RawText::keyword(text.as_str())),
                    )
                    .build();
                Ok(Arc::new(catalog))
            })
            .map(Arc::clone)
    }

    pub fn get(&self) -> Option<Arc<KeywordCatalog>> {
        self.cell.get().cloned()
    }
}

/// Process-wide cache used by the command facade.
pub fn shared_catalog() -> &'static CatalogCache {
    static CACHE: OnceCell<CatalogCache> = OnceCell::new();
    CACHE.get_or_init(CatalogCache::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sources::{EmbeddedSource, FileSource};
    use std::fs;

    #[test]
    fn builds_once_then_freezes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.txt");
        fs::write(&path, "malware\n").unwrap();

        let n = Normalizer::default();
        let cache = CatalogCache::new();
        let sources: Vec<Box<dyn KeywordSource>> = vec![Box::new(FileSource::new("l", &path))];

        let first = cache.get_or_build(&n, &RowFilter::new(), &sources).unwrap();
        fs::write(&path, "botnet\n").unwrap();
        let second = cache.get_or_build(&n, &RowFilter::new(), &sources).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.contains("malware"));
        assert!(!second.contains("botnet"));
    }

    #[test]
    fn failed_build_can_retry() {
        let n = Normalizer::default();
        let cache = CatalogCache::new();
        let bad: Vec<Box<dyn KeywordSource>> = vec![Box::new(EmbeddedSource::new("x", "missing.txt"))];
        assert!(cache.get_or_build(&n, &RowFilter::new(), &bad).is_err());
        assert!(cache.get().is_none());

        let good: Vec<Box<dyn KeywordSource>> =
            vec![Box::new(EmbeddedSource::new("s", "security_terms.txt"))];
        assert!(cache.get_or_build(&n, &RowFilter::new(), &good).unwrap().contains("phishing"));
    }
}
