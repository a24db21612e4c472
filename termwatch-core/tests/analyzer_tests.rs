use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lexicon::{AnalysisOutcome, CatalogBuilder, MatchResult, Normalizer, Status};
use termwatch_core::config::{CoreConfig, IngestConfig};
use termwatch_core::services::analyzer::IngestGate;
use termwatch_core::services::audit::{AnalysisRecord, Auditor};
use termwatch_core::{Analyzer, FileVerdict};

fn analyzer() -> Analyzer {
    let n = Normalizer::default();
    let catalog = CatalogBuilder::new(&n)
        .rows("list", ["bad", "cyberattack", "malware"])
        .build();
    Analyzer::new(n, Arc::new(catalog))
}

fn write(dir: &Path, name: &str, body: &[u8]) -> std::path::PathBuf {
    let p = dir.join(name);
    fs::write(&p, body).unwrap();
    p
}

fn ok(terms: &[&str]) -> FileVerdict {
    FileVerdict::Analyzed(AnalysisOutcome::Ok(MatchResult {
        terms: terms.iter().map(|s| s.to_string()).collect(),
    }))
}

#[test]
fn text_file_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(dir.path(), "a.txt", b"This is a bad cyberattack.");
    assert_eq!(analyzer().analyze_path(&p), ok(&["bad", "cyberattack"]));
}

#[test]
fn extension_gate_ignores_case() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(dir.path(), "LOUD.TXT", b"MALWARE");
    assert_eq!(analyzer().analyze_path(&p), ok(&["malware"]));
}

#[test]
fn unsupported_files_are_skipped_as_success() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(dir.path(), "photo.png", b"malware");
    let verdict = analyzer().analyze_path(&p);
    assert_eq!(verdict, FileVerdict::Skipped("unsupported extension .png".to_string()));

    let record = verdict.to_record();
    assert_eq!(record.status, Status::Ok);
    assert!(record.matches.is_empty());
    assert_eq!(record.message.as_deref(), Some("skipped: unsupported extension .png"));
}

#[test]
fn zero_byte_files_and_directories_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let empty = write(dir.path(), "empty.txt", b"");
    let sub = dir.path().join("nested.txt");
    fs::create_dir(&sub).unwrap();

    let a = analyzer();
    assert!(matches!(a.analyze_path(&empty), FileVerdict::Skipped(_)));
    assert_eq!(a.analyze_path(&sub), FileVerdict::Skipped("directory".to_string()));
}

#[test]
fn whitespace_document_is_an_empty_success() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(dir.path(), "blank.txt", b"   \n\n\t ");
    let record = analyzer().analyze_path(&p).to_record();
    assert_eq!(record.status, Status::Ok);
    assert!(record.matches.is_empty());
    assert!(record.message.is_none());
}

#[test]
fn unreadable_document_is_an_error_record() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(dir.path(), "fake.docx", b"not a zip archive");
    let record = analyzer().analyze_path(&p).to_record();
    assert_eq!(record.status, Status::Error);
    assert!(record.matches.is_empty());
    assert!(record.message.unwrap().starts_with("could not read document"));
}

#[test]
fn missing_file_is_an_error_record() {
    let dir = tempfile::tempdir().unwrap();
    let record = analyzer().analyze_path(&dir.path().join("gone.txt")).to_record();
    assert_eq!(record.status, Status::Error);
}

#[test]
fn configured_extensions_narrow_the_gate() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(dir.path(), "mail.eml", b"Subject: x\n\nmalware");
    let gate = IngestGate::from_config(&IngestConfig {
        extensions: vec!["txt".to_string()],
        ..IngestConfig::default()
    });
    let verdict = analyzer().with_gate(gate).analyze_path(&p);
    assert!(matches!(verdict, FileVerdict::Skipped(_)));
}

#[test]
fn oversize_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(dir.path(), "big.txt", &vec![b'a'; 2 * 1024 * 1024]);
    let gate = IngestGate::from_config(&IngestConfig { max_file_mb: 1, ..IngestConfig::default() });
    assert!(matches!(analyzer().with_gate(gate).analyze_path(&p), FileVerdict::Skipped(_)));
}

#[test]
fn generous_budget_matches_unbudgeted_run() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(dir.path(), "a.txt", b"bad malware");
    let a = analyzer();
    assert_eq!(a.analyze_path_with_budget(&p, Duration::from_secs(30)), a.analyze_path(&p));
}

#[test]
fn exhausted_budget_yields_timeout_error() {
    let dir = tempfile::tempdir().unwrap();
    let body = "bad malware cyberattack report line\n".repeat(20_000);
    let p = write(dir.path(), "long.txt", body.as_bytes());

    let verdict = analyzer().analyze_path_with_budget(&p, Duration::ZERO);
    let record = verdict.to_record();
    assert_eq!(record.status, Status::Error);
    assert!(record.message.unwrap().contains("time budget"));
}

fn wait_for_idle(a: &Analyzer) -> usize {
    let deadline = Instant::now() + Duration::from_secs(60);
    while a.outstanding_workers() > 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    a.outstanding_workers()
}

#[test]
fn timed_out_workers_are_counted_until_they_finish() {
    let dir = tempfile::tempdir().unwrap();
    let body = "bad malware cyberattack report line\n".repeat(20_000);
    let p = write(dir.path(), "long.txt", body.as_bytes());
    let a = analyzer();
    assert_eq!(a.outstanding_workers(), 0);

    let clone = a.clone();
    for _ in 0..3 {
        let _ = clone.analyze_path_with_budget(&p, Duration::ZERO);
    }
    assert!(a.outstanding_workers() <= 3);
    assert_eq!(wait_for_idle(&a), 0);

    let _ = a.analyze_path_with_budget(&p, Duration::from_secs(30));
    assert_eq!(wait_for_idle(&a), 0);
}

#[test]
fn analyses_are_audited_with_catalog_fingerprint() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = CoreConfig::default();
    cfg.logbook.analyses_log = dir.path().join("logbook/analyses.jsonl");
    cfg.logbook.actions_log = dir.path().join("logbook/actions.jsonl");

    let a = analyzer().with_auditor(Auditor::from_config(&cfg));
    let p = write(dir.path(), "a.txt", b"malware here");
    a.analyze_path(&p);
    a.analyze_path(&write(dir.path(), "skip.bin", b"x"));

    let text = fs::read_to_string(dir.path().join("logbook/analyses.jsonl")).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 1);
    let rec: AnalysisRecord = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(rec.matches, vec!["malware"]);
    assert_eq!(rec.catalog_fingerprint, a.catalog().fingerprint());
    assert_eq!(rec.size, 12);

    let actions = fs::read_to_string(dir.path().join("logbook/actions.jsonl")).unwrap();
    assert!(actions.contains("file_skipped"));
}

#[test]
fn analyzer_is_shared_across_threads() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<_> = (0..8)
        .map(|i| write(dir.path(), &format!("f{i}.txt"), b"a bad day for malware"))
        .collect();
    let a = &analyzer();

    std::thread::scope(|s| {
        let handles: Vec<_> = paths.iter().map(|p| s.spawn(move || a.analyze_path(p))).collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), ok(&["bad", "malware"]));
        }
    });
}
