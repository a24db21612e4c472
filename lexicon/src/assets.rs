use anyhow::{Context, Result};
use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
};

/// === Embedded default watchlists ===
pub const PROFANITY_LIST_NAME: &str = "profanity.txt";
pub const PROFANITY_LIST: &str = include_str!("../assets/profanity.txt");

pub const SECURITY_TERMS_NAME: &str = "security_terms.txt";
pub const SECURITY_TERMS: &str = include_str!("../assets/security_terms.txt");

/// Default lists in the order their rows are concatenated.
pub const DEFAULT_LISTS: [(&str, &str); 2] = [
    (PROFANITY_LIST_NAME, PROFANITY_LIST),
    (SECURITY_TERMS_NAME, SECURITY_TERMS),
];

/// Return the embedded text for a known list, if any.
pub fn default_list_text(name: &str) -> Option<&'static str> {
    DEFAULT_LISTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, text)| *text)
}

/// Seed missing default lists into a destination directory (idempotent).
/// Returns the names of the files that were created.
pub fn write_default_lists(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("create_dir_all({:?})", dir))?;

    let mut created = Vec::new();
    for (name, text) in DEFAULT_LISTS {
        let path = dir.join(name);
        if !path.exists() {
            fs::write(&path, text).with_context(|| format!("write {:?}", path))?;
            created.push(name.to_string());
        }
    }
    Ok(created)
}

/// Read a list from disk, falling back to the embedded copy.
///
/// - File present, `locked == false`: local edits win.
/// - File present, `locked == true`, known name: if the blake3 digest differs
///   from the embedded copy, the file is restored and the embedded text returned.
/// - File missing, known name: embedded copy is written (best effort) and returned.
/// - File missing, unknown name: error, since there is nothing to fall back to.
pub fn read_list_or_embedded(path: &Path, name: &str, locked: bool) -> Result<Cow<'static, str>> {
    let embedded = default_list_text(name);

    if path.exists() {
        let bytes = fs::read(path).with_context(|| format!("read {:?}", path))?;
        if let (true, Some(embedded)) = (locked, embedded) {
            if blake3::hash(&bytes) != blake3::hash(embedded.as_bytes()) {
                tracing::warn!(path = %path.display(), "watchlist differs from embedded copy; restoring");
                fs::write(path, embedded).with_context(|| format!("restore embedded {:?}", path))?;
                return Ok(Cow::Borrowed(embedded));
            }
        }
        return Ok(Cow::Owned(String::from_utf8_lossy(&bytes).into_owned()));
    }

    match embedded {
        Some(embedded) => {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir).ok();
            }
            let _ = fs::write(path, embedded);
            Ok(Cow::Borrowed(embedded))
        }
        None => anyhow::bail!("watchlist {:?} not found", path),
    }
}

/// Convenience: resolve `<root>/lists/<name>`
pub fn lists_path(root: &Path, name: &str) -> PathBuf {
    root.join("lists").join(name)
}
