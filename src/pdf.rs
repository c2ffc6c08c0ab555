//! PDF text extraction for uploaded transcripts
//!
//! Parsing runs on the blocking pool; `pdf-extract` can panic on malformed
//! input, which surfaces here as a `Pdf` error instead of taking down the task.

use std::path::Path;

use serde::Serialize;

use crate::error::{Ready4UniError, Result};

const MIN_PDF_BYTES: u64 = 100;
const MAX_PDF_BYTES: u64 = 50 * 1024 * 1024;
const MIN_FIRST_PAGE_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfMetadata {
    pub filename: String,
    pub file_size_bytes: u64,
    pub file_size_mb: f64,
    pub num_pages: usize,
    pub char_count: usize,
    pub has_text: bool,
}

/// Text of every page of a PDF held in memory, in page order.
pub fn extract_pages_from_bytes(bytes: &[u8]) -> Result<Vec<String>> {
    pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| Ready4UniError::Pdf(format!("Failed to extract text from PDF: {}", e)))
}

/// Join page texts, marking each page after the first and skipping blank pages.
pub fn join_pages(pages: &[String]) -> String {
    let mut parts = Vec::new();
    for (idx, page) in pages.iter().enumerate() {
        if page.trim().is_empty() {
            log::debug!("Page {} has no extractable text", idx + 1);
            continue;
        }
        if idx > 0 {
            parts.push(format!("\n--- Page {} ---\n", idx + 1));
        }
        parts.push(page.clone());
    }
    parts.join("\n")
}

fn check_pdf_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Ready4UniError::Pdf(format!("PDF file not found: {}", path.display())));
    }
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(Ready4UniError::Pdf(format!("File is not a PDF: {}", path.display())));
    }
    Ok(())
}

async fn read_pages(path: &Path) -> Result<Vec<String>> {
    let bytes = tokio::fs::read(path).await?;
    tokio::task::spawn_blocking(move || extract_pages_from_bytes(&bytes))
        .await
        .map_err(|e| Ready4UniError::Pdf(format!("PDF parser crashed: {}", e)))?
}

/// Extract all text from a PDF file with `--- Page N ---` separators.
///
/// Returns an empty string when the PDF has no text layer (e.g. a scan).
pub async fn extract_text(path: &Path) -> Result<String> {
    check_pdf_path(path)?;
    log::info!("Extracting text from PDF: {}", path.display());

    let pages = read_pages(path).await?;
    if pages.is_empty() {
        log::warn!("PDF has no pages: {}", path.display());
        return Ok(String::new());
    }

    let text = join_pages(&pages);
    if text.trim().is_empty() {
        log::warn!("No text extracted from {} (might be scanned images)", path.display());
        return Ok(String::new());
    }

    log::info!("Extracted {} characters from PDF", text.chars().count());
    Ok(text)
}

/// Check that a file is a readable, text-bearing PDF of sensible size.
pub async fn validate_pdf(path: &Path) -> Result<()> {
    check_pdf_path(path)?;

    let size = tokio::fs::metadata(path).await?.len();
    if size < MIN_PDF_BYTES {
        return Err(Ready4UniError::Pdf("PDF file is too small (might be corrupted)".to_string()));
    }
    if size > MAX_PDF_BYTES {
        return Err(Ready4UniError::Pdf("PDF file is too large (max 50MB)".to_string()));
    }

    let pages = read_pages(path).await?;
    let Some(first) = pages.first() else {
        return Err(Ready4UniError::Pdf("PDF has no pages".to_string()));
    };
    if first.trim().chars().count() < MIN_FIRST_PAGE_CHARS {
        return Err(Ready4UniError::Pdf(
            "PDF appears to be empty or contains only images (OCR required)".to_string(),
        ));
    }
    Ok(())
}

/// Size, page count and amount of text in a PDF.
pub async fn metadata(path: &Path) -> Result<PdfMetadata> {
    check_pdf_path(path)?;

    let file_size_bytes = tokio::fs::metadata(path).await?.len();
    let pages = read_pages(path).await?;
    let text = join_pages(&pages);

    Ok(PdfMetadata {
        filename: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        file_size_bytes,
        file_size_mb: (file_size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
        num_pages: pages.len(),
        char_count: text.chars().count(),
        has_text: !text.trim().is_empty(),
    })
}

/// Tidy extracted text: drop page-number-only lines, squeeze runs of
/// spaces, and allow at most one blank line in a row.
pub fn clean_extracted_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;

    for (idx, line) in text.split('\n').enumerate() {
        if idx > 0 {
            newlines += 1;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        for _ in 0..newlines.min(2) {
            out.push('\n');
        }
        newlines = 0;

        let mut prev_space = false;
        for c in line.chars() {
            if c == ' ' {
                if !prev_space {
                    out.push(c);
                }
                prev_space = true;
            } else {
                out.push(c);
                prev_space = false;
            }
        }
    }

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_extract_pages_rejects_garbage() {
        assert!(extract_pages_from_bytes(b"This is not a PDF").is_err());
    }

    #[test]
    fn test_join_pages_adds_markers_and_skips_blank() {
        let pages = vec!["Matemática 15".to_string(), "  ".to_string(), "Física 14".to_string()];
        let joined = join_pages(&pages);
        assert_eq!(joined, "Matemática 15\n\n--- Page 3 ---\n\nFísica 14");
    }

    #[test]
    fn test_join_single_page_has_no_marker() {
        assert_eq!(join_pages(&["only".to_string()]), "only");
    }

    #[tokio::test]
    async fn test_extract_text_missing_file() {
        let err = extract_text(Path::new("/nonexistent/transcript.pdf")).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_extract_text_wrong_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grades.txt");
        std::fs::write(&path, "Math 15").unwrap();

        let err = extract_text(&path).await.unwrap_err();
        assert!(err.to_string().contains("not a PDF"));
    }

    #[tokio::test]
    async fn test_validate_rejects_tiny_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiny.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let err = validate_pdf(&path).await.unwrap_err();
        assert!(err.to_string().contains("too small"));
    }

    #[tokio::test]
    async fn test_validate_rejects_unparseable_pdf() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, vec![b'x'; 512]).unwrap();

        assert!(validate_pdf(&path).await.is_err());
    }

    #[test]
    fn test_clean_extracted_text() {
        let raw = "  Boletim   de  Notas\n\n\n\n12\nMatemática    15\n\n\nFísica 14  ";
        assert_eq!(clean_extracted_text(raw), "Boletim de Notas\n\nMatemática 15\n\nFísica 14");
    }

    #[test]
    fn test_clean_empty() {
        assert_eq!(clean_extracted_text(""), "");
        assert_eq!(clean_extracted_text("\n\n3\n\n"), "");
    }
}
