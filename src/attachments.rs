//! Best-effort ingestion of per-turn attachments.
//!
//! Nothing in here returns an error to the caller. A broken attachment degrades
//! to an empty value (or the read-error sentinel for documents) and the turn
//! carries on without it.

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use lopdf::Document;
use tracing::{debug, warn};

pub const MAX_DOC_CHARS: usize = 12_000;
pub const MAX_PDF_PAGES: usize = 10;
pub const READ_ERROR_SENTINEL: &str = "[Error reading file]";

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("file not found: {0}")]
    Missing(PathBuf),
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("pdf parse failed: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("pdf parser panicked")]
    ParserPanicked,
}

/// Outcome of an ingestion that is not allowed to fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Ingested<T> {
    Ok(T),
    Degraded { value: T, reason: String },
}

impl<T> Ingested<T> {
    pub fn value(&self) -> &T {
        match self {
            Ingested::Ok(v) => v,
            Ingested::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Ingested::Ok(v) => v,
            Ingested::Degraded { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Ingested::Degraded { .. })
    }
}

/// An image ready to be embedded in a request as a data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime: &'static str,
    pub base64: String,
}

impl InlineImage {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64)
    }
}

/// Pulls plain text out of a document, capped at [`MAX_DOC_CHARS`] characters.
///
/// PDFs contribute their first [`MAX_PDF_PAGES`] pages, one page per line group.
/// Everything else is read as text with undecodable bytes skipped.
/// A missing file yields empty text; any other failure yields [`READ_ERROR_SENTINEL`].
pub fn extract_document_text(path: &Path) -> Ingested<String> {
    match read_document(path) {
        Ok(text) => {
            debug!(path = %path.display(), chars = text.chars().count(), "document extracted");
            Ingested::Ok(text)
        }
        Err(e @ IngestError::Missing(_)) => Ingested::Degraded { value: String::new(), reason: e.to_string() },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "document extraction failed");
            Ingested::Degraded { value: READ_ERROR_SENTINEL.to_string(), reason: e.to_string() }
        }
    }
}

/// Base64-encodes an image file. Missing or unreadable files yield an empty encoding.
pub fn encode_image(path: &Path) -> Ingested<String> {
    if !path.exists() {
        return Ingested::Degraded {
            value: String::new(),
            reason: IngestError::Missing(path.to_path_buf()).to_string(),
        };
    }
    match fs::read(path) {
        Ok(bytes) => Ingested::Ok(BASE64_STANDARD.encode(bytes)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "image read failed");
            Ingested::Degraded { value: String::new(), reason: IngestError::Io(e).to_string() }
        }
    }
}

/// Encodes `path` and tags it with a MIME type; `None` when nothing usable came out.
pub fn inline_image(path: &Path) -> Option<InlineImage> {
    let encoded = encode_image(path).into_value();
    if encoded.is_empty() {
        return None;
    }
    Some(InlineImage { mime: image_mime(path), base64: encoded })
}

pub fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

fn read_document(path: &Path) -> Result<String, IngestError> {
    if !path.exists() {
        return Err(IngestError::Missing(path.to_path_buf()));
    }
    if is_pdf(path) {
        let text = panic::catch_unwind(AssertUnwindSafe(|| read_pdf_pages(path)))
            .map_err(|_| IngestError::ParserPanicked)??;
        return Ok(truncate_chars(&text, MAX_DOC_CHARS));
    }
    let bytes = fs::read(path)?;
    Ok(truncate_chars(&decode_skipping_invalid(&bytes), MAX_DOC_CHARS))
}

fn read_pdf_pages(path: &Path) -> Result<String, IngestError> {
    let doc = Document::load(path)?;
    let pages: Vec<String> = doc
        .get_pages()
        .keys()
        .take(MAX_PDF_PAGES)
        // a page that will not give up its text counts as blank
        .map(|n| doc.extract_text(&[*n]).unwrap_or_default())
        .collect();
    Ok(pages.join("\n"))
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn decode_skipping_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};
    use tempfile::tempdir;

    fn write_pdf(path: &Path, page_texts: &[String]) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let mut kids: Vec<Object> = Vec::new();
        for text in page_texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![50.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(text.as_str())]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => Object::Array(vec![0.into(), 0.into(), 595.into(), 842.into()]),
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn missing_document_is_empty_and_degraded() {
        let dir = tempdir().unwrap();
        let got = extract_document_text(&dir.path().join("nope.txt"));
        assert!(got.is_degraded());
        assert_eq!(got.value(), "");
    }

    #[test]
    fn plain_text_is_capped_by_characters() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("notes.txt");
        fs::write(&p, "é".repeat(MAX_DOC_CHARS + 500)).unwrap();
        let got = extract_document_text(&p);
        assert!(!got.is_degraded());
        assert_eq!(got.value().chars().count(), MAX_DOC_CHARS);
    }

    #[test]
    fn pdf_text_is_capped_by_characters() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("transcript.pdf");
        let pages: Vec<String> = (0..12).map(|n| format!("page{n} ").repeat(300)).collect();
        write_pdf(&p, &pages);
        let got = extract_document_text(&p);
        assert!(!got.is_degraded(), "{got:?}");
        let text = got.into_value();
        assert_eq!(text.chars().count(), MAX_DOC_CHARS);
        assert!(text.starts_with("page0 "));
    }

    #[test]
    fn undecodable_bytes_are_skipped() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("mixed.txt");
        fs::write(&p, b"ab\xff\xfecd").unwrap();
        assert_eq!(extract_document_text(&p).into_value(), "abcd");
    }

    #[test]
    fn pdf_reads_only_first_ten_pages() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("book.PDF");
        let pages: Vec<String> = (1..=12).map(|n| format!("chapter{n}marker")).collect();
        write_pdf(&p, &pages);
        let got = extract_document_text(&p);
        assert!(!got.is_degraded(), "{got:?}");
        let text = got.into_value();
        assert!(text.contains("chapter1marker"));
        assert!(text.contains("chapter10marker"));
        assert!(!text.contains("chapter11marker"));
        assert!(!text.contains("chapter12marker"));
    }

    #[test]
    fn corrupt_pdf_yields_sentinel() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("broken.pdf");
        fs::write(&p, b"this is not a pdf at all").unwrap();
        let got = extract_document_text(&p);
        assert!(got.is_degraded());
        assert_eq!(got.value(), READ_ERROR_SENTINEL);
    }

    #[test]
    fn image_is_base64_with_mime_from_extension() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("diagram.png");
        fs::write(&p, [0u8, 1, 2, 255]).unwrap();
        assert_eq!(encode_image(&p), Ingested::Ok("AAEC/w==".to_string()));
        let img = inline_image(&p).unwrap();
        assert_eq!(img.data_url(), "data:image/png;base64,AAEC/w==");
        assert_eq!(image_mime(Path::new("photo.bin")), "image/jpeg");
    }

    #[test]
    fn missing_image_is_empty() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("gone.jpg");
        assert!(encode_image(&p).is_degraded());
        assert_eq!(encode_image(&p).into_value(), "");
        assert!(inline_image(&p).is_none());
    }
}
