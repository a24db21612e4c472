//! services/audit.rs
//! Analysis logbook: one JSONL line per analyzed file, plus lightweight action events.
//!
//! - Writes under `<root>/logbook/` by default.
//! - Write failures are swallowed; auditing never changes an analysis result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::CoreConfig;
use lexicon::{AnalysisOutcome, Status};

/// A normalized record of a single file analysis, suitable for JSONL logging.
///
/// # Fields
/// - `timestamp`: when the analysis finished.
/// - `run_id`: identifies the process run that produced the record.
/// - `path`, `size`, `digest`: the file and a blake3 digest of its bytes.
/// - `status`, `matches`, `message`: mirror the host record.
/// - `catalog_fingerprint`: which watchlist the result was matched against.
/// - `latency_ms`: end-to-end analysis latency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub timestamp: DateTime<Utc>,
    pub event: String,
    pub run_id: Uuid,
    pub path: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    pub status: Status,
    pub matches: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub catalog_fingerprint: String,
    pub latency_ms: f64,
}

/// File facts gathered by the analyzer before extraction.
#[derive(Debug, Clone, Default)]
pub struct FileFacts {
    pub size: u64,
    pub digest: Option<String>,
}

impl FileFacts {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self {
            size: bytes.len() as u64,
            digest: Some(blake3::hash(bytes).to_hex().to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Auditor {
    enabled: bool,
    run_id: Uuid,
    analyses: PathBuf,
    actions: PathBuf,
    preview_len: usize,
}

impl Auditor {
    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self {
            enabled: cfg.logbook.enabled,
            run_id: Uuid::new_v4(),
            analyses: cfg.logbook.analyses_log.clone(),
            actions: cfg.logbook.actions_log.clone(),
            preview_len: cfg.logbook.preview_len,
        }
    }

    /// An auditor that writes nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            run_id: Uuid::nil(),
            analyses: PathBuf::new(),
            actions: PathBuf::new(),
            preview_len: 0,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn analyses_path(&self) -> &Path {
        &self.analyses
    }

    /// Append one analysis line to `analyses.jsonl`.
    pub fn record_analysis(
        &self,
        path: &Path,
        facts: &FileFacts,
        outcome: &AnalysisOutcome,
        catalog_fingerprint: &str,
        latency_ms: f64,
    ) {
        if !self.enabled {
            return;
        }
        let (status, matches, message) = match outcome {
            AnalysisOutcome::Ok(m) => (Status::Ok, m.terms.clone(), None),
            AnalysisOutcome::Error(reason) => (Status::Error, Vec::new(), Some(reason.clone())),
        };
        let rec = AnalysisRecord {
            timestamp: Utc::now(),
            event: "analysis".to_string(),
            run_id: self.run_id,
            path: path.to_string_lossy().into_owned(),
            size: facts.size,
            digest: facts.digest.clone(),
            status,
            matches,
            message,
            catalog_fingerprint: catalog_fingerprint.to_string(),
            latency_ms,
        };
        append_jsonl(&self.analyses, &rec);
    }

    /// Record a generic action event (lightweight telemetry).
    ///
    /// * `agent`: logical component name (e.g., `"commands"`, `"analyzer"`).
    /// * `action`: short verb label (e.g., `"scan_called"`, `"file_skipped"`).
    /// * `severity`: `"low" | "medium" | "high"`.
    pub fn record_action(&self, agent: &str, action: &str, details: &Value, severity: &str) {
        if !self.enabled {
            return;
        }
        let entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event": "action",
            "run_id": self.run_id,
            "agent": agent,
            "action": action,
            "severity": severity,
            "details": details
        });
        append_jsonl(&self.actions, &entry);
    }

    /// Single-line preview of `s`, truncated to the configured length.
    pub fn redact_preview(&self, s: &str) -> String {
        redact_preview(s, self.preview_len)
    }
}

/// ----------- Helpers -----------

/// Append a single JSON value as a line to a JSONL file.
/// Creates parent directories if missing; ignores write errors.
fn append_jsonl<P: AsRef<Path>, S: Serialize>(path: P, val: &S) {
    let path = path.as_ref();
    let Ok(line) = serde_json::to_string(val) else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match fs::OpenOptions::new().create(true).append(true).open(path) {
        Ok(mut f) => {
            let _ = writeln!(f, "{}", line);
        }
        Err(e) => tracing::debug!(path = %path.display(), error = %e, "audit write skipped"),
    }
}

fn redact_preview(s: &str, max_len: usize) -> String {
    let t = s.replace(['\n', '\r'], " ");
    if t.chars().count() <= max_len {
        return t;
    }
    let mut out: String = t.chars().take(max_len).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexicon::MatchResult;

    fn auditor_in(dir: &Path) -> Auditor {
        let mut cfg = CoreConfig::default();
        cfg.logbook.analyses_log = dir.join("logbook/analyses.jsonl");
        cfg.logbook.actions_log = dir.join("logbook/actions.jsonl");
        cfg.logbook.preview_len = 8;
        Auditor::from_config(&cfg)
    }

    #[test]
    fn analysis_line_carries_digest_and_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let auditor = auditor_in(dir.path());
        let outcome = AnalysisOutcome::Ok(MatchResult { terms: vec!["malware".into()] });
        auditor.record_analysis(
            Path::new("case/a.txt"),
            &FileFacts::of_bytes(b"malware"),
            &outcome,
            "abc123",
            1.5,
        );

        let text = fs::read_to_string(auditor.analyses_path()).unwrap();
        let rec: AnalysisRecord = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(rec.status, Status::Ok);
        assert_eq!(rec.matches, vec!["malware"]);
        assert_eq!(rec.size, 7);
        assert_eq!(rec.digest.unwrap(), blake3::hash(b"malware").to_hex().to_string());
        assert_eq!(rec.catalog_fingerprint, "abc123");
        assert_eq!(rec.run_id, auditor.run_id());
    }

    #[test]
    fn disabled_auditor_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = CoreConfig::default();
        cfg.logbook.enabled = false;
        cfg.logbook.actions_log = dir.path().join("actions.jsonl");
        let auditor = Auditor::from_config(&cfg);
        auditor.record_action("test", "noop", &json!({}), "low");
        assert!(!dir.path().join("actions.jsonl").exists());
    }

    #[test]
    fn preview_is_single_line_and_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let auditor = auditor_in(dir.path());
        assert_eq!(auditor.redact_preview("ab\ncd"), "ab cd");
        assert_eq!(auditor.redact_preview("0123456789"), "01234567…");
    }
}
