use anyhow::{Context, Result};
use lexicon::{EnglishModel, Normalizer, NormalizerConfig, PhraseMode, PluralPolicy, RowFilter};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub logbook: LogbookConfig,
    #[serde(default)]
    pub normalizer: NormalizerSettings,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl CoreConfig {
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join("config.toml");
        let mut cfg = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str::<CoreConfig>(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?
        } else {
            tracing::info!(
                "No config file found at {}. Using CoreConfig::default().",
                path.display()
            );
            CoreConfig::default()
        };
        cfg.resolve_paths(root);
        Ok(cfg)
    }

    fn resolve_paths(&mut self, root: &Path) {
        self.logbook.path = absolutize(root, &self.logbook.path);
        self.logbook.analyses_log = absolutize(root, &self.logbook.analyses_log);
        self.logbook.actions_log = absolutize(root, &self.logbook.actions_log);
        for source in &mut self.catalog.sources {
            if source.kind == SourceKind::File {
                source.location = absolutize(root, Path::new(&source.location))
                    .to_string_lossy()
                    .into_owned();
            }
        }
    }

    /// The one normalizer used for both the catalog and every document.
    pub fn build_normalizer(&self) -> Normalizer {
        Normalizer::english(
            EnglishModel::with_max_length(self.normalizer.max_length),
            NormalizerConfig {
                plural_policy: self.normalizer.plural_policy,
                spell_numerals: self.normalizer.spell_numerals,
            },
        )
    }

    pub fn row_filter(&self) -> RowFilter {
        RowFilter::skipping(self.catalog.skip_rows.iter().copied())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "SystemConfig::default_name")]
    pub name: String,
    #[serde(default = "SystemConfig::default_version")]
    pub version: String,
}

impl SystemConfig {
    fn default_name() -> String {
        "termwatch".to_string()
    }

    fn default_version() -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            version: Self::default_version(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogbookConfig {
    #[serde(default = "LogbookConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "LogbookConfig::default_path")]
    pub path: PathBuf,
    #[serde(default = "LogbookConfig::default_analyses_log")]
    pub analyses_log: PathBuf,
    #[serde(default = "LogbookConfig::default_actions_log")]
    pub actions_log: PathBuf,
    #[serde(default = "LogbookConfig::default_preview_len")]
    pub preview_len: usize,
}

impl LogbookConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_path() -> PathBuf {
        PathBuf::from("logbook")
    }

    fn default_analyses_log() -> PathBuf {
        PathBuf::from("logbook/analyses.jsonl")
    }

    fn default_actions_log() -> PathBuf {
        PathBuf::from("logbook/actions.jsonl")
    }

    fn default_preview_len() -> usize {
        160
    }
}

impl Default for LogbookConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            path: Self::default_path(),
            analyses_log: Self::default_analyses_log(),
            actions_log: Self::default_actions_log(),
            preview_len: Self::default_preview_len(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NormalizerSettings {
    #[serde(default)]
    pub plural_policy: PluralPolicy,
    #[serde(default = "NormalizerSettings::default_spell_numerals")]
    pub spell_numerals: bool,
    #[serde(default = "NormalizerSettings::default_max_length")]
    pub max_length: usize,
    #[serde(default)]
    pub phrase_mode: PhraseMode,
}

impl NormalizerSettings {
    fn default_spell_numerals() -> bool {
        true
    }

    fn default_max_length() -> usize {
        lexicon::english::DEFAULT_MAX_LENGTH
    }
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            plural_policy: PluralPolicy::default(),
            spell_numerals: Self::default_spell_numerals(),
            max_length: Self::default_max_length(),
            phrase_mode: PhraseMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Embedded,
    File,
    Url,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub name: String,
    pub kind: SourceKind,
    /// Embedded list name, file path, or URL depending on `kind`.
    pub location: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "CatalogConfig::default_sources")]
    pub sources: Vec<SourceSpec>,
    #[serde(default)]
    pub skip_rows: Vec<usize>,
    #[serde(default)]
    pub lock_lists: bool,
    #[serde(default = "CatalogConfig::default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl CatalogConfig {
    fn default_sources() -> Vec<SourceSpec> {
        lexicon::assets::DEFAULT_LISTS
            .iter()
            .map(|(name, _)| SourceSpec {
                name: name.trim_end_matches(".txt").to_string(),
                kind: SourceKind::Embedded,
                location: name.to_string(),
            })
            .collect()
    }

    fn default_http_timeout_secs() -> u64 {
        30
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            sources: Self::default_sources(),
            skip_rows: Vec::new(),
            lock_lists: false,
            http_timeout_secs: Self::default_http_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "IngestConfig::default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "IngestConfig::default_max_file_mb")]
    pub max_file_mb: u64,
    /// 0 disables the per-file time budget.
    #[serde(default)]
    pub timeout_secs: u64,
}

impl IngestConfig {
    fn default_extensions() -> Vec<String> {
        ["txt", "pdf", "docx", "eml"].iter().map(|s| s.to_string()).collect()
    }

    fn default_max_file_mb() -> u64 {
        256
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            extensions: Self::default_extensions(),
            max_file_mb: Self::default_max_file_mb(),
            timeout_secs: 0,
        }
    }
}

fn absolutize(root: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        root.join(value)
    }
}
