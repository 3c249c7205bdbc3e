//! Text extraction: turn an uploaded document into plain text.
//!
//! The pipeline works on text, not files: everything downstream (prompting,
//! parsing, export) sees a single UTF-8 string. This module owns the only
//! format-aware code in the crate. PDFs go through `pdf-extract`, which
//! walks the page tree and concatenates page text in page order; a scanned
//! page with no text layer contributes an empty segment, which is not an
//! error. Plain text is decoded strictly — silently replacing invalid bytes
//! would feed mojibake to the model and produce garbage questions.

use crate::error::{ExtractError, McqGenError};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Declared format of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `application/pdf`
    Pdf,
    /// `text/plain`
    Text,
}

/// An uploaded document: raw bytes plus a declared format.
///
/// Created once per request, consumed by [`extract`], then discarded.
/// Nothing is persisted.
#[derive(Debug)]
pub struct SourceDocument {
    bytes: Vec<u8>,
    format: DocumentFormat,
}

impl SourceDocument {
    /// Wrap in-memory bytes with an explicit format.
    pub fn new(bytes: Vec<u8>, format: DocumentFormat) -> Self {
        Self { bytes, format }
    }

    /// Read a document from disk, inferring the format.
    ///
    /// A `.pdf` extension or `%PDF` magic bytes mean PDF; everything else is
    /// treated as plain text.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, McqGenError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => McqGenError::PermissionDenied {
                path: PathBuf::from(path),
            },
            _ => McqGenError::FileNotFound {
                path: PathBuf::from(path),
            },
        })?;

        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
            || bytes.starts_with(b"%PDF");

        let format = if is_pdf {
            DocumentFormat::Pdf
        } else {
            DocumentFormat::Text
        };
        debug!("Loaded {} ({} bytes, {:?})", path.display(), bytes.len(), format);

        Ok(Self { bytes, format })
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Extract plain text from a document.
///
/// # Errors
/// * [`ExtractError::PdfParse`] — the PDF structure cannot be parsed
/// * [`ExtractError::DecodeError`] — a text document with invalid UTF-8
/// * [`ExtractError::EmptyDocument`] — zero extractable characters after
///   decoding; the caller decides whether that is fatal
pub fn extract(document: &SourceDocument) -> Result<String, ExtractError> {
    let text = match document.format {
        DocumentFormat::Pdf => extract_pdf(&document.bytes)?,
        DocumentFormat::Text => extract_text(&document.bytes)?,
    };

    if text.trim().is_empty() {
        return Err(ExtractError::EmptyDocument);
    }
    Ok(text)
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::PdfParse {
        detail: e.to_string(),
    })
}

fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| ExtractError::DecodeError {
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_document_decodes() {
        let doc = SourceDocument::new(b"The sun is a star.".to_vec(), DocumentFormat::Text);
        assert_eq!(extract(&doc).unwrap(), "The sun is a star.");
    }

    #[test]
    fn invalid_utf8_is_decode_error() {
        let doc = SourceDocument::new(vec![0xff, 0xfe, 0x41], DocumentFormat::Text);
        assert!(matches!(
            extract(&doc),
            Err(ExtractError::DecodeError { .. })
        ));
    }

    #[test]
    fn empty_text_is_empty_document() {
        let doc = SourceDocument::new(b"  \n\t ".to_vec(), DocumentFormat::Text);
        assert!(matches!(extract(&doc), Err(ExtractError::EmptyDocument)));
    }

    #[test]
    fn garbage_pdf_is_parse_error() {
        let doc = SourceDocument::new(b"not a pdf at all".to_vec(), DocumentFormat::Pdf);
        assert!(matches!(extract(&doc), Err(ExtractError::PdfParse { .. })));
    }

    #[test]
    fn from_path_missing_file() {
        let err = SourceDocument::from_path("/nonexistent/notes.txt").unwrap_err();
        assert!(matches!(err, McqGenError::FileNotFound { .. }));
    }

    #[test]
    fn from_path_infers_text_format() {
        let mut f = tempfile::NamedTempFile::with_suffix(".txt").unwrap();
        std::io::Write::write_all(&mut f, b"plain notes").unwrap();
        let doc = SourceDocument::from_path(f.path()).unwrap();
        assert_eq!(doc.format(), DocumentFormat::Text);
    }

    #[test]
    fn from_path_infers_pdf_from_magic_bytes() {
        let mut f = tempfile::NamedTempFile::with_suffix(".bin").unwrap();
        std::io::Write::write_all(&mut f, b"%PDF-1.7 stub").unwrap();
        let doc = SourceDocument::from_path(f.path()).unwrap();
        assert_eq!(doc.format(), DocumentFormat::Pdf);
    }
}
