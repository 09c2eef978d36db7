//! Plain-text extraction from uploaded resume and job description files.
//!
//! Matching never inspects file formats. Handlers call `extract_text_or_empty`,
//! so an unreadable file becomes an empty input that scores poorly instead of
//! failing the request.

use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild, TableCellContent};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    #[error("Failed to extract text from PDF: {0}")]
    Pdf(String),

    #[error("Failed to read DOCX document: {0}")]
    Docx(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentKind {
    /// Resolves the kind from a filename or bare extension (`"cv.PDF"`, `"docx"`).
    pub fn from_filename(name: &str) -> Result<Self, DocumentError> {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or(name)
            .trim()
            .to_ascii_lowercase();

        match extension.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            "txt" | "md" => Ok(DocumentKind::PlainText),
            _ => Err(DocumentError::Unsupported(name.to_string())),
        }
    }
}

/// Extracts plain text from file bytes. CPU-bound: call from `spawn_blocking`
/// when handling requests.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<String, DocumentError> {
    let text = match DocumentKind::from_filename(filename)? {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| DocumentError::Pdf(e.to_string()))?,
        DocumentKind::Docx => docx_text(bytes)?,
        DocumentKind::PlainText => String::from_utf8_lossy(bytes).into_owned(),
    };
    Ok(text.trim().to_string())
}

/// `extract_text`, with any failure logged and turned into an empty string.
pub fn extract_text_or_empty(bytes: &[u8], filename: &str) -> String {
    extract_text(bytes, filename).unwrap_or_else(|e| {
        warn!("Text extraction failed for {filename}: {e}");
        String::new()
    })
}

fn docx_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| DocumentError::Docx(e.to_string()))?;

    let mut lines = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => lines.push(paragraph_text(paragraph)),
            DocumentChild::Table(table) => {
                for docx_rs::TableChild::TableRow(row) in &table.rows {
                    for docx_rs::TableRowChild::TableCell(cell) in &row.cells {
                        for content in &cell.children {
                            if let TableCellContent::Paragraph(paragraph) = content {
                                lines.push(paragraph_text(paragraph));
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(lines
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Runs concatenated; tabs and breaks kept as `\t` and `\n`.
fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    push_children(&paragraph.children, &mut text);
    text
}

fn push_children(children: &[ParagraphChild], text: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    match run_child {
                        RunChild::Text(t) => text.push_str(&t.text),
                        RunChild::Tab(_) => text.push('\t'),
                        RunChild::Break(_) => text.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_children(&link.children, text),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{BreakType, Docx, Run};
    use std::io::Cursor;

    fn docx_bytes(paragraphs: Vec<Paragraph>) -> Vec<u8> {
        let docx = paragraphs
            .into_iter()
            .fold(Docx::new(), |docx, p| docx.add_paragraph(p));
        let mut buffer = Cursor::new(Vec::new());
        docx.build().pack(&mut buffer).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_kind_from_filename_and_extension() {
        assert_eq!(DocumentKind::from_filename("cv.PDF").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_filename("docx").unwrap(), DocumentKind::Docx);
        assert_eq!(DocumentKind::from_filename("notes.md").unwrap(), DocumentKind::PlainText);
    }

    #[test]
    fn test_legacy_doc_is_unsupported() {
        assert!(matches!(
            DocumentKind::from_filename("resume.doc"),
            Err(DocumentError::Unsupported(_))
        ));
    }

    #[test]
    fn test_plain_text_is_trimmed() {
        let text = extract_text(b"  hello world \n", "resume.txt").unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn test_docx_paragraphs_become_lines() {
        let bytes = docx_bytes(vec![
            Paragraph::new().add_run(Run::new().add_text("Jane Doe")),
            Paragraph::new(),
            Paragraph::new()
                .add_run(Run::new().add_text("Skills: "))
                .add_run(Run::new().add_text("Rust & Go <core>")),
        ]);
        let text = extract_text(&bytes, "resume.docx").unwrap();
        assert_eq!(text, "Jane Doe\nSkills: Rust & Go <core>");
    }

    #[test]
    fn test_docx_keeps_tabs_breaks_and_typographic_quotes() {
        let bytes = docx_bytes(vec![Paragraph::new().add_run(
            Run::new()
                .add_text("Don\u{2019}t")
                .add_tab()
                .add_text("Python")
                .add_break(BreakType::TextWrapping)
                .add_text("AWS"),
        )]);
        let text = extract_text(&bytes, "resume.docx").unwrap();
        assert_eq!(text, "Don\u{2019}t\tPython\nAWS");
    }

    #[test]
    fn test_docx_words_stay_separate_for_matching() {
        let bytes = docx_bytes(vec![Paragraph::new().add_run(
            Run::new().add_text("SKILLS:").add_tab().add_text("Kubernetes"),
        )]);
        let text = extract_text(&bytes, "resume.docx").unwrap();
        assert!(text.split_whitespace().any(|w| w == "Kubernetes"));
    }

    #[test]
    fn test_non_docx_bytes_are_docx_error() {
        assert!(matches!(
            extract_text(b"not a zip archive", "resume.docx"),
            Err(DocumentError::Docx(_))
        ));
    }

    #[test]
    fn test_failures_become_empty_text() {
        assert_eq!(extract_text_or_empty(b"not a zip", "resume.docx"), "");
        assert_eq!(extract_text_or_empty(b"x", "resume.exe"), "");
    }
}
