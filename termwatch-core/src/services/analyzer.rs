//! services/analyzer.rs
//! Per-file analysis: gate -> extract -> normalize -> match -> audit.

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::{CoreConfig, IngestConfig};
use crate::services::audit::{Auditor, FileFacts};
use crate::services::extract::{DocumentKind, extract_bytes};
use lexicon::{
    AnalysisError, AnalysisOutcome, HostRecord, KeywordCatalog, Normalizer, PhraseMode, scan_text,
};

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileVerdict {
    /// Declined by the document-type gate; not an error.
    Skipped(String),
    Analyzed(AnalysisOutcome),
}

impl FileVerdict {
    pub fn to_record(&self) -> HostRecord {
        match self {
            FileVerdict::Skipped(reason) => HostRecord::skipped(reason),
            FileVerdict::Analyzed(outcome) => HostRecord::from_outcome(outcome),
        }
    }

    pub fn outcome(&self) -> Option<&AnalysisOutcome> {
        match self {
            FileVerdict::Analyzed(o) => Some(o),
            FileVerdict::Skipped(_) => None,
        }
    }
}

/// Which files are worth analyzing.
#[derive(Debug, Clone)]
pub struct IngestGate {
    extensions: Vec<String>,
    max_bytes: u64,
}

enum GateDecision {
    Analyze(DocumentKind),
    Skip(String),
}

impl Default for IngestGate {
    fn default() -> Self {
        Self::from_config(&IngestConfig::default())
    }
}

impl IngestGate {
    pub fn from_config(cfg: &IngestConfig) -> Self {
        Self {
            extensions: cfg.extensions.iter().map(|e| e.trim_start_matches('.').to_ascii_lowercase()).collect(),
            max_bytes: cfg.max_file_mb.saturating_mul(1024 * 1024),
        }
    }

    fn check(&self, path: &Path) -> std::io::Result<GateDecision> {
        let meta = fs::metadata(path)?;
        if meta.is_dir() {
            return Ok(GateDecision::Skip("directory".to_string()));
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let kind = match DocumentKind::from_extension(&ext) {
            Some(kind) if self.extensions.contains(&ext) => kind,
            _ if ext.is_empty() => return Ok(GateDecision::Skip("no file extension".to_string())),
            _ => return Ok(GateDecision::Skip(format!("unsupported extension .{ext}"))),
        };
        if meta.len() == 0 {
            return Ok(GateDecision::Skip("zero-byte file".to_string()));
        }
        if self.max_bytes > 0 && meta.len() > self.max_bytes {
            return Ok(GateDecision::Skip(format!("file larger than {} bytes", self.max_bytes)));
        }
        Ok(GateDecision::Analyze(kind))
    }
}

/// Everything needed to analyze files against one frozen catalog.
///
/// Cheap to clone; clones share the catalog.
#[derive(Debug, Clone)]
pub struct Analyzer {
    normalizer: Normalizer,
    catalog: Arc<KeywordCatalog>,
    mode: PhraseMode,
    gate: IngestGate,
    auditor: Auditor,
    budget: Option<Duration>,
    workers: Arc<AtomicUsize>,
}

/// Counts one budgeted worker thread until it exits, panics included.
struct WorkerSlot(Arc<AtomicUsize>);

impl WorkerSlot {
    fn claim(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Analyzer {
    /// `normalizer` must be the one the catalog was built with.
    pub fn new(normalizer: Normalizer, catalog: Arc<KeywordCatalog>) -> Self {
        Self {
            normalizer,
            catalog,
            mode: PhraseMode::default(),
            gate: IngestGate::default(),
            auditor: Auditor::disabled(),
            budget: None,
            workers: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn from_config(cfg: &CoreConfig, normalizer: Normalizer, catalog: Arc<KeywordCatalog>) -> Self {
        let budget = (cfg.ingest.timeout_secs > 0).then(|| Duration::from_secs(cfg.ingest.timeout_secs));
        Self::new(normalizer, catalog)
            .with_mode(cfg.normalizer.phrase_mode)
            .with_gate(IngestGate::from_config(&cfg.ingest))
            .with_auditor(Auditor::from_config(cfg))
            .with_budget(budget)
    }

    pub fn with_mode(mut self, mode: PhraseMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_gate(mut self, gate: IngestGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_auditor(mut self, auditor: Auditor) -> Self {
        self.auditor = auditor;
        self
    }

    /// Per-file wall-clock budget used by [`Analyzer::analyze_file`].
    pub fn with_budget(mut self, budget: Option<Duration>) -> Self {
        self.budget = budget;
        self
    }

    pub fn catalog(&self) -> &KeywordCatalog {
        &self.catalog
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn auditor(&self) -> &Auditor {
        &self.auditor
    }

    /// Shared handle to the frozen catalog.
    pub fn catalog_handle(&self) -> Arc<KeywordCatalog> {
        Arc::clone(&self.catalog)
    }

    /// Budgeted worker threads still running across this analyzer and its
    /// clones, including ones whose caller already gave up on them.
    pub fn outstanding_workers(&self) -> usize {
        self.workers.load(Ordering::SeqCst)
    }

    /// Match already-extracted text. Never fails.
    pub fn analyze_text(&self, text: &str) -> AnalysisOutcome {
        AnalysisOutcome::Ok(scan_text(&self.normalizer, &self.catalog, self.mode, text))
    }

    /// Analyze one file with the configured budget, if any.
    pub fn analyze_file(&self, path: &Path) -> FileVerdict {
        match self.budget {
            Some(budget) => self.analyze_path_with_budget(path, budget),
            None => self.analyze_path(path),
        }
    }

    pub fn analyze_path(&self, path: &Path) -> FileVerdict {
        let started = Instant::now();
        let (verdict, facts) = self.evaluate(path);
        self.audit(path, &verdict, &facts, started);
        verdict
    }

    /// Like [`Analyzer::analyze_path`], but gives up after `budget`.
    ///
    /// The worker thread is detached on timeout; its late result is dropped.
    /// Detached workers stay counted in [`Analyzer::outstanding_workers`]
    /// until they finish.
    pub fn analyze_path_with_budget(&self, path: &Path, budget: Duration) -> FileVerdict {
        let started = Instant::now();
        let (tx, rx) = mpsc::channel();
        let worker = self.clone();
        let owned: PathBuf = path.to_path_buf();
        let slot = WorkerSlot::claim(&self.workers);
        let spawned = thread::Builder::new()
            .name("termwatch-analyze".to_string())
            .spawn(move || {
                let _slot = slot;
                let _ = tx.send(worker.evaluate(&owned));
            });
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "could not spawn analysis worker; analyzing inline");
            return self.analyze_path(path);
        }

        let (verdict, facts) = match rx.recv_timeout(budget) {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    path = %path.display(),
                    budget_ms = budget.as_millis(),
                    outstanding_workers = self.outstanding_workers(),
                    "analysis timed out; worker left running"
                );
                let err = AnalysisError::TimedOut(budget.as_millis());
                (FileVerdict::Analyzed(err.into()), FileFacts::default())
            }
        };
        self.audit(path, &verdict, &facts, started);
        verdict
    }

    fn evaluate(&self, path: &Path) -> (FileVerdict, FileFacts) {
        let kind = match self.gate.check(path) {
            Ok(GateDecision::Analyze(kind)) => kind,
            Ok(GateDecision::Skip(reason)) => return (FileVerdict::Skipped(reason), FileFacts::default()),
            Err(e) => return (unreadable(e), FileFacts::default()),
        };
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => return (unreadable(e), FileFacts::default()),
        };
        let facts = FileFacts::of_bytes(&bytes);
        let verdict = match extract_bytes(kind, &bytes) {
            Ok(text) => FileVerdict::Analyzed(self.analyze_text(&text)),
            Err(e) => unreadable(e),
        };
        (verdict, facts)
    }

    fn audit(&self, path: &Path, verdict: &FileVerdict, facts: &FileFacts, started: Instant) {
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        match verdict {
            FileVerdict::Skipped(reason) => {
                tracing::debug!(path = %path.display(), %reason, "file skipped");
                self.auditor.record_action(
                    "analyzer",
                    "file_skipped",
                    &json!({ "path": path.to_string_lossy(), "reason": reason }),
                    "low",
                );
            }
            FileVerdict::Analyzed(outcome) => {
                tracing::debug!(
                    path = %path.display(),
                    ok = outcome.is_ok(),
                    matches = outcome.matches().len(),
                    latency_ms,
                    "file analyzed"
                );
                self.auditor
                    .record_analysis(path, facts, outcome, self.catalog.fingerprint(), latency_ms);
            }
        }
    }
}

fn unreadable(e: impl std::fmt::Display) -> FileVerdict {
    tracing::warn!(error = %e, "document unreadable");
    FileVerdict::Analyzed(AnalysisError::UnreadableDocument(e.to_string()).into())
}
