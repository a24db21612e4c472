use std::fs;
use std::io::{Cursor, Write};

use termwatch_core::services::extract::{DocumentKind, ExtractError, extract, extract_bytes};

fn docx_with(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zw = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        zw.start_file(*name, zip::write::FileOptions::default()).unwrap();
        zw.write_all(body.as_bytes()).unwrap();
    }
    zw.finish().unwrap().into_inner()
}

const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t>Quarterly report</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">A bad </w:t></w:r><w:r><w:t>cyberattack &amp; malware</w:t></w:r></w:p>
</w:body></w:document>"#;

#[test]
fn txt_is_decoded_lossily() {
    let text = extract_bytes(DocumentKind::Txt, b"malware \xff\xfe found").unwrap();
    assert!(text.starts_with("malware "));
    assert!(text.ends_with(" found"));
}

#[test]
fn docx_paragraphs_become_lines() {
    let bytes = docx_with(&[("word/document.xml", DOCUMENT_XML)]);
    let text = extract_bytes(DocumentKind::Docx, &bytes).unwrap();
    assert_eq!(text, "Quarterly report\nA bad cyberattack & malware");
}

#[test]
fn docx_without_body_part_is_unreadable() {
    let bytes = docx_with(&[("docProps/core.xml", "<x/>")]);
    assert!(matches!(
        extract_bytes(DocumentKind::Docx, &bytes),
        Err(ExtractError::Unreadable { kind: "docx", .. })
    ));
}

#[test]
fn plain_text_renamed_to_docx_is_unreadable() {
    assert!(extract_bytes(DocumentKind::Docx, b"just text").is_err());
}

#[test]
fn corrupt_pdf_is_unreadable_not_empty() {
    let result = extract_bytes(DocumentKind::Pdf, b"%PDF-1.7\nthis is not really a pdf");
    assert!(matches!(result, Err(ExtractError::Unreadable { kind: "pdf", .. })));
}

#[test]
fn eml_prefers_plain_part() {
    let raw = "From: a@example.com\r\n\
Subject: weekly\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative;\r\n boundary=\"XYZ\"\r\n\
\r\n\
preamble\r\n\
--XYZ\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>html phishing</p>\r\n\
--XYZ\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
plain ransomware note\r\n\
--XYZ--\r\n";
    let text = extract_bytes(DocumentKind::Eml, raw.as_bytes()).unwrap();
    assert!(text.contains("plain ransomware note"));
    assert!(!text.contains("phishing"));
}

#[test]
fn eml_falls_back_to_stripped_html() {
    let raw = "Content-Type: multipart/alternative; boundary=b1\n\
\n\
--b1\n\
Content-Type: text/html\n\
\n\
<html><body><b>spyware</b> detected</body></html>\n\
--b1--\n";
    let text = extract_bytes(DocumentKind::Eml, raw.as_bytes()).unwrap();
    assert!(text.contains("spyware"));
    assert!(text.contains("detected"));
    assert!(!text.contains("<b>"));
}

#[test]
fn eml_walks_nested_multiparts_and_decodes_base64() {
    // "keylogger installed" in base64
    let raw = "Content-Type: multipart/mixed; boundary=outer\n\
\n\
--outer\n\
Content-Type: multipart/alternative; boundary=inner\n\
\n\
--inner\n\
Content-Type: text/plain\n\
Content-Transfer-Encoding: base64\n\
\n\
a2V5bG9nZ2VyIGlu\n\
c3RhbGxlZA==\n\
--inner--\n\
--outer\n\
Content-Type: application/octet-stream\n\
\n\
AAAA\n\
--outer--\n";
    let text = extract_bytes(DocumentKind::Eml, raw.as_bytes()).unwrap();
    assert_eq!(text, "keylogger installed");
}

#[test]
fn eml_single_part_quoted_printable_body() {
    let raw = "Subject: hi\nContent-Transfer-Encoding: quoted-printable\n\nzero=3Dday soft=\nbreak\n";
    let text = extract_bytes(DocumentKind::Eml, raw.as_bytes()).unwrap();
    assert_eq!(text, "zero=day softbreak\n");
}

#[test]
fn extract_reads_from_disk_and_rejects_unknown_kinds() {
    let dir = tempfile::tempdir().unwrap();
    let txt = dir.path().join("note.TXT");
    fs::write(&txt, "botnet").unwrap();
    assert_eq!(extract(&txt).unwrap(), "botnet");

    let png = dir.path().join("img.png");
    fs::write(&png, [0u8, 1, 2]).unwrap();
    assert!(matches!(extract(&png), Err(ExtractError::UnsupportedFormat(_))));

    let missing = dir.path().join("gone.txt");
    assert!(matches!(extract(&missing), Err(ExtractError::Io { .. })));
}
