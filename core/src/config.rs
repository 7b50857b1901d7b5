use crate::preprocess::Language;
use serde::{Deserialize, Serialize};

/// Paragraph segmentation and filtering policy for the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Paragraphs with fewer words are dropped.
    pub min_words: usize,
    /// The line buffer is flushed once it holds more words than this.
    pub flush_words: usize,
    /// Lines longer than this are never treated as headings.
    pub max_heading_words: usize,
    /// Documents whose extracted text has fewer words are skipped as unreadable.
    pub min_document_words: usize,
    pub max_document_bytes: usize,
    /// Matched against the uppercased paragraph text.
    pub noise_keywords: Vec<String>,
}

pub const DEFAULT_NOISE_KEYWORDS: &[&str] = &[
    "REFERENCES",
    "BIBLIOGRAPHY",
    "ISSN",
    "DOI:",
    "COPYRIGHT",
    "DAFTAR PUSTAKA",
    "HAK CIPTA",
    "REFERENSI",
];

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_words: 15,
            flush_words: 40,
            max_heading_words: 10,
            min_document_words: 5,
            max_document_bytes: 50 * 1024 * 1024,
            noise_keywords: DEFAULT_NOISE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Settings baked into an index generation. Query-time processing reads them
/// back from the generation manifest, never from the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub language: Language,
    /// Use `1 + ln(count)` instead of the raw count as term frequency.
    pub sublinear_tf: bool,
}
