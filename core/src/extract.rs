//! Document text extraction and paragraph segmentation.
//!
//! Documents arrive as bytes plus a file name; the extension picks the reader
//! (PDF through `pdf-extract`, or UTF-8 plain text). Extracted text is cut into
//! paragraph-sized chunks, cleaned, filtered and numbered across the whole
//! corpus. A document that cannot be read is skipped and reported, never
//! allowed to abort the batch.

use crate::config::ExtractConfig;
use crate::error::{Error, Result};
use crate::index::{Paragraph, ParagraphId};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;
use walkdir::WalkDir;

lazy_static! {
    static ref CHAPTER: Regex =
        Regex::new(r"(?i)^(?:chapter|bab|section|bagian)\s+(?:[ivxlcdm]+|\d+)\b").expect("valid regex");
    static ref NUMBERED: Regex =
        Regex::new(r"^(?:\d+(?:\.\d+)*\.?|[IVXLC]+\.)\s+\p{Lu}").expect("valid regex");
    static ref SECTION_NAME: Regex = Regex::new(
        r"(?i)^(?:\d+(?:\.\d+)*\.?\s+)?(?:abstract|introduction|background|methods?|methodology|materials and methods|results?|discussion|conclusions?|acknowledg(?:e)?ments?|abstrak|pendahuluan|latar belakang|metode|metodologi|hasil|pembahasan|hasil dan pembahasan|kesimpulan|simpulan|ucapan terima kasih)\s*:?$"
    )
    .expect("valid regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Picks the reader from the file extension; `None` for files the corpus ignores.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "txt" | "md" => Some(DocumentKind::PlainText),
            _ => None,
        }
    }
}

/// Why a single document produced no text. Never escapes the extractor.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unsupported document type: {0}")]
    Unsupported(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("document is not valid UTF-8 text")]
    Utf8,
    #[error("document is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("no readable text ({words} words extracted)")]
    Empty { words: usize },
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), bytes: bytes.into() }
    }
}

/// Paragraphs of every readable document, in corpus order, plus the names of
/// the documents that were read and those that were skipped.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub paragraphs: Vec<Paragraph>,
    pub documents: Vec<String>,
    pub skipped: Vec<SkippedDocument>,
}

pub fn extract_text(bytes: &[u8], kind: DocumentKind) -> std::result::Result<String, ExtractError> {
    match kind {
        DocumentKind::Pdf => extract_pdf(bytes),
        DocumentKind::PlainText => String::from_utf8(bytes.to_vec()).map_err(|_| ExtractError::Utf8),
    }
}

fn extract_pdf(bytes: &[u8]) -> std::result::Result<String, ExtractError> {
    // pdf-extract panics on some malformed files instead of returning an error.
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::Pdf(e.to_string())),
        Err(_) => Err(ExtractError::Pdf("parser panicked on malformed input".to_string())),
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// NFKC-folds (ligatures, full-width forms), collapses whitespace runs to a
/// single space and trims.
pub fn normalize_whitespace(text: &str) -> String {
    let folded = text.nfkc().collect::<String>();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn is_heading(line: &str, config: &ExtractConfig) -> bool {
    let line = line.trim();
    if line.is_empty() || word_count(line) > config.max_heading_words {
        return false;
    }
    if CHAPTER.is_match(line) || SECTION_NAME.is_match(line) {
        return true;
    }
    NUMBERED.is_match(line) && !line.ends_with(|c: char| matches!(c, '.' | ',' | ';'))
}

/// Splits raw extracted text into paragraph candidates.
///
/// Heading lines stand alone. Other lines accumulate until the buffer holds
/// more than `flush_words` words. A word hyphenated across a line break is
/// rejoined.
pub fn segment_paragraphs(text: &str, config: &ExtractConfig) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut buffer = String::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_heading(line, config) {
            flush(&mut buffer, &mut paragraphs);
            paragraphs.push(normalize_whitespace(line));
            continue;
        }
        append_line(&mut buffer, line);
        if word_count(&buffer) > config.flush_words {
            flush(&mut buffer, &mut paragraphs);
        }
    }
    flush(&mut buffer, &mut paragraphs);
    paragraphs
}

fn append_line(buffer: &mut String, line: &str) {
    let hyphenated = buffer.ends_with('-')
        && buffer.chars().rev().nth(1).is_some_and(char::is_alphabetic)
        && line.chars().next().is_some_and(char::is_lowercase);
    if hyphenated {
        buffer.pop();
    } else if !buffer.is_empty() {
        buffer.push(' ');
    }
    buffer.push_str(line);
}

fn flush(buffer: &mut String, paragraphs: &mut Vec<String>) {
    let paragraph = normalize_whitespace(buffer);
    if !paragraph.is_empty() {
        paragraphs.push(paragraph);
    }
    buffer.clear();
}

pub fn is_noise(text: &str, config: &ExtractConfig) -> bool {
    let upper = text.to_uppercase();
    config.noise_keywords.iter().any(|k| upper.contains(&k.to_uppercase()))
}

/// Drops paragraphs that are too short or contain a noise keyword.
pub fn clean_paragraphs(candidates: Vec<String>, config: &ExtractConfig) -> Vec<String> {
    candidates
        .into_iter()
        .filter(|p| word_count(p) >= config.min_words && !is_noise(p, config))
        .collect()
}

/// Extracts, segments and filters one document's text.
pub fn document_paragraphs(
    name: &str,
    bytes: &[u8],
    config: &ExtractConfig,
) -> std::result::Result<Vec<String>, ExtractError> {
    let kind = DocumentKind::from_name(name).ok_or_else(|| ExtractError::Unsupported(name.to_string()))?;
    if bytes.len() > config.max_document_bytes {
        return Err(ExtractError::TooLarge { size: bytes.len(), limit: config.max_document_bytes });
    }
    let text = extract_text(bytes, kind)?;
    let words = word_count(&text);
    if words < config.min_document_words {
        return Err(ExtractError::Empty { words });
    }
    Ok(clean_paragraphs(segment_paragraphs(&text, config), config))
}

struct Extractor<'a> {
    config: &'a ExtractConfig,
    next_id: ParagraphId,
    report: ExtractionReport,
}

impl<'a> Extractor<'a> {
    fn new(config: &'a ExtractConfig) -> Self {
        Self { config, next_id: 1, report: ExtractionReport::default() }
    }

    fn push(&mut self, name: String, bytes: std::result::Result<Vec<u8>, ExtractError>) {
        match bytes.and_then(|b| document_paragraphs(&name, &b, self.config)) {
            Ok(texts) => {
                tracing::debug!(document = %name, paragraphs = texts.len(), "extracted document");
                for text in texts {
                    self.report.paragraphs.push(Paragraph {
                        id: self.next_id,
                        source_document: name.clone(),
                        text,
                    });
                    self.next_id += 1;
                }
                self.report.documents.push(name);
            }
            Err(e) => {
                tracing::warn!(document = %name, reason = %e, "skipping document");
                self.report.skipped.push(SkippedDocument { name, reason: e.to_string() });
            }
        }
    }

    fn finish(self) -> ExtractionReport {
        tracing::info!(
            documents = self.report.documents.len(),
            skipped = self.report.skipped.len(),
            paragraphs = self.report.paragraphs.len(),
            "extraction finished"
        );
        self.report
    }
}

/// Extracts paragraphs from in-memory documents, in the order given.
pub fn extract_documents<I>(documents: I, config: &ExtractConfig) -> ExtractionReport
where
    I: IntoIterator<Item = SourceDocument>,
{
    let mut extractor = Extractor::new(config);
    for doc in documents {
        extractor.push(doc.name, Ok(doc.bytes));
    }
    extractor.finish()
}

/// Extracts every supported file directly inside `dir`, sorted by file name.
/// Files are read one at a time; a read failure skips that file only.
pub fn extract_corpus(dir: &Path, config: &ExtractConfig) -> Result<ExtractionReport> {
    if !dir.is_dir() {
        return Err(Error::Io {
            path: dir.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "corpus directory not found"),
        });
    }
    let mut extractor = Extractor::new(config);
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "cannot list corpus entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if DocumentKind::from_name(&name).is_none() {
            tracing::debug!(file = %name, "ignoring unsupported file");
            continue;
        }
        let bytes = std::fs::read(entry.path()).map_err(ExtractError::from);
        extractor.push(name, bytes);
    }
    Ok(extractor.finish())
}
