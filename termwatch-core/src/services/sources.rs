//! services/sources.rs
//! Keyword sources: embedded defaults, local files, or remote lists.

use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{CatalogConfig, SourceKind, SourceSpec};
use lexicon::AnalysisError;
use lexicon::assets::{default_list_text, read_list_or_embedded};

/// Anything that can hand over raw list text, one term per row.
pub trait KeywordSource: Send + Sync {
    fn name(&self) -> &str;
    fn fetch(&self) -> Result<String>;
}

pub struct EmbeddedSource {
    name: String,
    list: String,
}

impl EmbeddedSource {
    pub fn new(name: impl Into<String>, list: impl Into<String>) -> Self {
        Self { name: name.into(), list: list.into() }
    }
}

impl KeywordSource for EmbeddedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<String> {
        default_list_text(&self.list)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("no embedded list named {:?}", self.list))
    }
}

pub struct FileSource {
    name: String,
    path: PathBuf,
    locked: bool,
}

impl FileSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), path: path.into(), locked: false }
    }

    /// Restore a known default list when its contents drift.
    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }
}

impl KeywordSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<String> {
        let file_name = self
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let text = read_list_or_embedded(&self.path, file_name, self.locked)?;
        Ok(text.into_owned())
    }
}

pub struct UrlSource {
    name: String,
    url: String,
    timeout: Duration,
}

impl UrlSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>, timeout: Duration) -> Self {
        Self { name: name.into(), url: url.into(), timeout }
    }
}

impl KeywordSource for UrlSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("building http client")?;
        let body = client
            .get(&self.url)
            .send()
            .with_context(|| format!("GET {}", self.url))?
            .error_for_status()
            .with_context(|| format!("GET {}", self.url))?
            .text()
            .with_context(|| format!("reading body of {}", self.url))?;
        tracing::info!(source = %self.name, url = %self.url, bytes = body.len(), "keyword list fetched");
        Ok(body)
    }
}

/// Build the configured sources in order.
pub fn sources_from_config(cfg: &CatalogConfig) -> Vec<Box<dyn KeywordSource>> {
    cfg.sources
        .iter()
        .map(|spec| source_from_spec(spec, cfg))
        .collect()
}

fn source_from_spec(spec: &SourceSpec, cfg: &CatalogConfig) -> Box<dyn KeywordSource> {
    match spec.kind {
        SourceKind::Embedded => Box::new(EmbeddedSource::new(&spec.name, &spec.location)),
        SourceKind::File => {
            Box::new(FileSource::new(&spec.name, &spec.location).locked(cfg.lock_lists))
        }
        SourceKind::Url => Box::new(UrlSource::new(
            &spec.name,
            &spec.location,
            Duration::from_secs(cfg.http_timeout_secs),
        )),
    }
}

/// Fetch every source; the first failure names the source that broke.
pub fn fetch_all(sources: &[Box<dyn KeywordSource>]) -> Result<Vec<(String, String)>, AnalysisError> {
    sources
        .iter()
        .map(|s| {
            s.fetch()
                .map(|text| (s.name().to_string(), text))
                .map_err(|e| AnalysisError::CatalogSourceUnavailable {
                    source_name: s.name().to_string(),
                    reason: format!("{e:#}"),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn embedded_source_serves_default_lists() {
        let s = EmbeddedSource::new("security", "security_terms.txt");
        assert!(s.fetch().unwrap().lines().any(|l| l == "malware"));
        assert!(EmbeddedSource::new("x", "nope.txt").fetch().is_err());
    }

    #[test]
    fn file_source_prefers_local_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profanity.txt");
        fs::write(&path, "custom\n").unwrap();
        assert_eq!(FileSource::new("p", &path).fetch().unwrap(), "custom\n");
    }

    #[test]
    fn locked_file_source_restores_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profanity.txt");
        fs::write(&path, "custom\n").unwrap();
        let text = FileSource::new("p", &path).locked(true).fetch().unwrap();
        assert_eq!(text, lexicon::assets::PROFANITY_LIST);
        assert_eq!(fs::read_to_string(&path).unwrap(), lexicon::assets::PROFANITY_LIST);
    }

    #[test]
    fn missing_unknown_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let sources: Vec<Box<dyn KeywordSource>> =
            vec![Box::new(FileSource::new("mine", dir.path().join("mine.txt")))];
        match fetch_all(&sources) {
            Err(AnalysisError::CatalogSourceUnavailable { source_name, .. }) => {
                assert_eq!(source_name, "mine")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
