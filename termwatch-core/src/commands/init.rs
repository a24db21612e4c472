// termwatch-core/src/commands/init.rs

use anyhow::{Context, Result};
use chrono::Utc;
use once_cell::sync::OnceCell;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::CoreConfig;
use lexicon::assets::write_default_lists;

#[derive(Debug, Clone)]
pub struct InitReport {
    pub root: PathBuf,
    pub config: CoreConfig,
    pub created: Vec<String>,
    pub existed: Vec<String>,
}

// ---------- single global init gate ----------

static INIT: OnceCell<InitReport> = OnceCell::new();

/// Idempotent global initializer for the process-wide root.
pub fn ensure_initialized_once() -> Result<&'static InitReport> {
    INIT.get_or_try_init(|| ensure_initialized_at(&termwatch_root()))
}

/// Resolve the termwatch root. `TERMWATCH_ROOT` overrides the default.
pub fn termwatch_root() -> PathBuf {
    std::env::var_os("TERMWATCH_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".termwatch"))
}

/// Lay out `root` (idempotent) and load its config.
pub fn ensure_initialized_at(root: &Path) -> Result<InitReport> {
    let root = root.to_path_buf();
    let mut created = Vec::new();
    let mut existed = Vec::new();

    ensure_dir(&root, "", &mut created, &mut existed)?;
    ensure_dir(&root, "lists", &mut created, &mut existed)?;
    ensure_dir(&root, "logbook", &mut created, &mut existed)?;

    ensure_file(
        &root,
        "config.toml",
        Some(DEFAULT_CONFIG_TOML),
        &mut created,
        &mut existed,
    )?;

    for name in write_default_lists(root.join("lists"))? {
        created.push(format!("lists/{name}"));
    }

    initialize_logbook_files(&root, &mut created, &mut existed)?;

    let config = CoreConfig::load(&root)?;
    tracing::debug!(root = %root.display(), created = created.len(), "termwatch root ready");
    Ok(InitReport { root, config, created, existed })
}

fn ensure_dir(
    base: &Path,
    rel: &str,
    created: &mut Vec<String>,
    existed: &mut Vec<String>,
) -> Result<()> {
    let p = if rel.is_empty() { base.to_path_buf() } else { base.join(rel) };
    let label = if rel.is_empty() { ".".to_string() } else { rel.to_string() };
    if p.exists() {
        existed.push(label);
        return Ok(());
    }
    fs::create_dir_all(&p).with_context(|| format!("create_dir_all({:?})", p))?;
    created.push(label);
    Ok(())
}

fn ensure_file(
    base: &Path,
    rel_file: &str,
    content_if_absent: Option<&str>,
    created: &mut Vec<String>,
    existed: &mut Vec<String>,
) -> Result<()> {
    let p = base.join(rel_file);
    if p.exists() {
        existed.push(rel_file.to_string());
        return Ok(());
    }
    write_atomic(&p, content_if_absent.unwrap_or("").as_bytes())?;
    created.push(rel_file.to_string());
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create_dir_all({:?})", parent))?;
    }
    let tmp = path.with_extension("tmp");
    {
        let mut f = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&tmp)
            .with_context(|| format!("open temp file {:?}", tmp))?;
        f.write_all(bytes)?;
        f.flush()?;
    }
    fs::rename(&tmp, path).with_context(|| format!("rename {:?} -> {:?}", tmp, path))?;
    Ok(())
}

fn initialize_logbook_files(
    root: &Path,
    created: &mut Vec<String>,
    existed: &mut Vec<String>,
) -> Result<()> {
    let init_event = serde_json::json!({
        "timestamp": Utc::now().to_rfc3339(),
        "event": "system_init",
        "agent": "system",
        "details": { "version": env!("CARGO_PKG_VERSION") },
    });
    let init_line = format!("{init_event}\n");

    // analyses.jsonl holds analysis records only
    ensure_file(root, "logbook/analyses.jsonl", None, created, existed)?;
    ensure_file(root, "logbook/actions.jsonl", Some(&init_line), created, existed)?;
    Ok(())
}

// ---------- defaults ----------

const DEFAULT_CONFIG_TOML: &str = r#"[system]
name = "termwatch"
version = "0.1.0"

[logbook]
enabled = true
path = "logbook"
analyses_log = "logbook/analyses.jsonl"
actions_log = "logbook/actions.jsonl"
preview_len = 160

[normalizer]
# "drop" discards plural nouns; "singularize" folds them onto the singular.
plural_policy = "drop"
spell_numerals = true
max_length = 1000000
# "exact" matches single tokens; "sequence" also matches multi-word entries.
phrase_mode = "exact"

[catalog]
# Row indices (0-based, across all sources in order) to ignore.
skip_rows = []
lock_lists = false
http_timeout_secs = 30

[[catalog.sources]]
name = "profanity"
kind = "file"
location = "lists/profanity.txt"

[[catalog.sources]]
name = "security_terms"
kind = "file"
location = "lists/security_terms.txt"

[ingest]
extensions = ["txt", "pdf", "docx", "eml"]
max_file_mb = 256
# 0 disables the per-file time budget.
timeout_secs = 0
"#;
