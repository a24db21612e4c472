// src/commands/api.rs
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::commands::init::{InitReport, ensure_initialized_at, ensure_initialized_once};
use crate::config::CoreConfig;
use crate::services::analyzer::{Analyzer, FileVerdict};
use crate::services::catalog_cache::{CatalogCache, shared_catalog};
use crate::services::sources::sources_from_config;
use lexicon::{HostRecord, KeywordCatalog, SourceSummary};

pub struct Commands {
    root: PathBuf,
    config: CoreConfig,
    analyzer: Analyzer,
}

#[derive(Debug, Serialize)]
pub struct CatalogReport {
    pub entries: usize,
    pub fingerprint: String,
    pub max_phrase_len: usize,
    pub filtered_rows: usize,
    pub empty_rows: usize,
    pub sources: Vec<SourceSummary>,
}

impl Commands {
    /// Facade over the process-wide root (`TERMWATCH_ROOT` or `.termwatch`)
    /// and the process-wide catalog.
    pub fn new() -> Result<Self> {
        let report = ensure_initialized_once()?;
        Self::from_report(report, shared_catalog())
    }

    /// Facade over an explicit root with its own catalog.
    pub fn open(root: &Path) -> Result<Self> {
        let report = ensure_initialized_at(root)?;
        Self::from_report(&report, &CatalogCache::new())
    }

    fn from_report(report: &InitReport, cache: &CatalogCache) -> Result<Self> {
        let config = report.config.clone();
        let normalizer = config.build_normalizer();
        let sources = sources_from_config(&config.catalog);
        let catalog: Arc<KeywordCatalog> = cache
            .get_or_build(&normalizer, &config.row_filter(), &sources)
            .context("building keyword catalog")?;
        let analyzer = Analyzer::from_config(&config, normalizer, catalog);

        analyzer.auditor().record_action(
            "commands",
            "session_opened",
            &json!({
                "root": report.root.to_string_lossy(),
                "catalog_entries": analyzer.catalog().len(),
                "fingerprint": analyzer.catalog().fingerprint(),
            }),
            "low",
        );
        Ok(Self { root: report.root.clone(), config, analyzer })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn catalog(&self) -> &KeywordCatalog {
        self.analyzer.catalog()
    }

    /// The catalog itself, shared with every facade built from the same cache.
    pub fn catalog_handle(&self) -> Arc<KeywordCatalog> {
        self.analyzer.catalog_handle()
    }

    /// Analyze one file and render the record the host consumes.
    pub fn scan_file(&self, path: &Path) -> HostRecord {
        self.verdict(path).to_record()
    }

    pub fn verdict(&self, path: &Path) -> FileVerdict {
        self.analyzer.analyze_file(path)
    }

    pub fn scan_text(&self, text: &str) -> HostRecord {
        let outcome = self.analyzer.analyze_text(text);
        self.analyzer.auditor().record_action(
            "commands",
            "scan_text_called",
            &json!({
                "preview": self.analyzer.auditor().redact_preview(text),
                "matches": outcome.matches(),
            }),
            "low",
        );
        HostRecord::from_outcome(&outcome)
    }

    /// Canonical tokens of `text`, in pipeline order.
    pub fn normalize_text(&self, text: &str) -> Vec<String> {
        self.analyzer.normalizer().normalize_tokens(text)
    }

    pub fn catalog_report(&self) -> CatalogReport {
        let c = self.catalog();
        CatalogReport {
            entries: c.len(),
            fingerprint: c.fingerprint().to_string(),
            max_phrase_len: c.max_phrase_len(),
            filtered_rows: c.filtered_rows(),
            empty_rows: c.empty_rows(),
            sources: c.sources().to_vec(),
        }
    }
}
