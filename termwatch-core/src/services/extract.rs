//! services/extract.rs
//! Per-format text extraction. Every extractor returns the document text or
//! an [`ExtractError`]; an empty string is a valid (empty) document.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io::{Cursor, Read};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Txt,
    Pdf,
    Docx,
    Eml,
}

impl DocumentKind {
    /// Case-insensitive extension lookup.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::Txt),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "eml" => Some(Self::Eml),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Eml => "eml",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unreadable {kind} document: {reason}")]
    Unreadable { kind: &'static str, reason: String },
}

impl ExtractError {
    fn unreadable(kind: DocumentKind, reason: impl ToString) -> Self {
        Self::Unreadable { kind: kind.extension(), reason: reason.to_string() }
    }
}

/// Read `path` and extract its text according to its extension.
pub fn extract(path: &Path) -> Result<String, ExtractError> {
    let kind = DocumentKind::from_path(path)
        .ok_or_else(|| ExtractError::UnsupportedFormat(path.display().to_string()))?;
    let bytes = fs::read(path).map_err(|source| ExtractError::Io {
        path: path.display().to_string(),
        source,
    })?;
    extract_bytes(kind, &bytes)
}

pub fn extract_bytes(kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractError> {
    let text = match kind {
        DocumentKind::Txt => Ok(String::from_utf8_lossy(bytes).into_owned()),
        DocumentKind::Pdf => pdf_text(bytes),
        DocumentKind::Docx => docx_text(bytes),
        DocumentKind::Eml => Ok(eml_text(bytes)),
    }?;
    tracing::debug!(kind = kind.extension(), bytes = bytes.len(), chars = text.len(), "extracted");
    Ok(text)
}

// ---------- pdf ----------

fn pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract can panic on malformed streams
    let result = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)));
    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::unreadable(DocumentKind::Pdf, e)),
        Err(_) => Err(ExtractError::unreadable(DocumentKind::Pdf, "decoder panicked")),
    }
}

// ---------- docx ----------

static DOCX_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:t(?:\s[^>]*)?/>|</w:p>|<w:tab\b[^>]*/>|<w:br\b[^>]*/>")
        .expect("valid docx run pattern")
});

fn docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let kind = DocumentKind::Docx;
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::unreadable(kind, e))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::unreadable(kind, e))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::unreadable(kind, e))?;
    Ok(docx_xml_to_text(&xml))
}

fn docx_xml_to_text(xml: &str) -> String {
    let mut out = String::new();
    for cap in DOCX_RUN.captures_iter(xml) {
        if let Some(run) = cap.get(1) {
            out.push_str(&unescape_xml(run.as_str()));
            continue;
        }
        let tag = &cap[0];
        if tag == "</w:p>" {
            out.push('\n');
        } else if tag.starts_with("<w:tab") {
            out.push('\t');
        } else if tag.starts_with("<w:br") {
            out.push('\n');
        }
    }
    out.trim_end_matches('\n').to_string()
}

fn unescape_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';') else { break };
        let entity = &rest[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|h| u32::from_str_radix(h, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// ---------- eml ----------

static HTML_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style)\b.*?</(script|style)>|<[^>]*>").expect("valid html tag pattern")
});

/// One MIME entity: lowercased header names, raw body.
struct Entity {
    headers: Vec<(String, String)>,
    body: String,
}

impl Entity {
    fn parse(raw: &str) -> Self {
        let (head, body) = if let Some(body) = raw.strip_prefix('\n') {
            ("", body)
        } else {
            match raw.find("\n\n") {
                Some(i) => (&raw[..i], &raw[i + 2..]),
                None => (raw, ""),
            }
        };
        Self { headers: parse_headers(head), body: body.to_string() }
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// `(mime type, parameters)`; defaults to `text/plain`.
    fn content_type(&self) -> (String, Vec<(String, String)>) {
        let Some(value) = self.header("content-type") else {
            return ("text/plain".to_string(), Vec::new());
        };
        let mut parts = value.split(';');
        let mime = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        let params = parts
            .filter_map(|p| {
                let (k, v) = p.split_once('=')?;
                Some((k.trim().to_ascii_lowercase(), v.trim().trim_matches('"').to_string()))
            })
            .collect();
        (mime, params)
    }

    fn decoded_body(&self) -> String {
        let encoding = self
            .header("content-transfer-encoding")
            .map(|v| v.trim().to_ascii_lowercase())
            .unwrap_or_default();
        match encoding.as_str() {
            "base64" => {
                let compact: String = self.body.chars().filter(|c| !c.is_whitespace()).collect();
                match STANDARD.decode(compact.as_bytes()) {
                    Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    Err(e) => {
                        tracing::warn!(error = %e, "bad base64 body; using raw text");
                        self.body.clone()
                    }
                }
            }
            "quoted-printable" => decode_quoted_printable(&self.body),
            _ => self.body.clone(),
        }
    }

    fn children(&self, boundary: &str) -> Vec<Entity> {
        let delimiter = format!("--{boundary}");
        let closing = format!("{delimiter}--");
        let mut parts = Vec::new();
        let mut current: Option<Vec<&str>> = None;
        for line in self.body.split('\n') {
            let trimmed = line.trim_end();
            if trimmed == delimiter || trimmed == closing {
                if let Some(lines) = current.take() {
                    parts.push(Entity::parse(&lines.join("\n")));
                }
                if trimmed == closing {
                    break;
                }
                current = Some(Vec::new());
            } else if let Some(lines) = current.as_mut() {
                lines.push(line);
            }
        }
        parts
    }
}

fn parse_headers(head: &str) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = Vec::new();
    for line in head.split('\n') {
        if line.starts_with([' ', '\t']) {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }
    headers
}

fn decode_quoted_printable(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'=' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        if bytes.get(i + 1) == Some(&b'\n') {
            i += 2;
            continue;
        }
        let hex = bytes.get(i + 1..i + 3).and_then(|h| std::str::from_utf8(h).ok());
        match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
            Some(b) => {
                out.push(b);
                i += 3;
            }
            None => {
                out.push(b'=');
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn strip_html(html: &str) -> String {
    let text = HTML_TAG.replace_all(html, " ");
    unescape_xml(&text.replace("&nbsp;", " "))
}

/// Depth-first search for the first part with `mime`.
fn find_part(entity: &Entity, mime: &str) -> Option<String> {
    let (ty, params) = entity.content_type();
    if ty.starts_with("multipart/") {
        let boundary = params.iter().find(|(k, _)| k == "boundary")?.1.clone();
        return entity.children(&boundary).iter().find_map(|c| find_part(c, mime));
    }
    (ty == mime).then(|| entity.decoded_body())
}

fn eml_text(bytes: &[u8]) -> String {
    let raw = String::from_utf8_lossy(bytes).replace("\r\n", "\n");
    let message = Entity::parse(&raw);
    let (ty, _) = message.content_type();

    if ty.starts_with("multipart/") {
        if let Some(plain) = find_part(&message, "text/plain") {
            return plain;
        }
        if let Some(html) = find_part(&message, "text/html") {
            return strip_html(&html);
        }
        return String::new();
    }
    if ty == "text/html" {
        return strip_html(&message.decoded_body());
    }
    message.decoded_body()
}
