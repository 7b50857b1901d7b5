use crate::config::{ExtractConfig, IndexConfig};
use crate::error::Result;
use crate::extract::{extract_corpus, extract_documents, ExtractionReport, SkippedDocument, SourceDocument};
use crate::handle::IndexHandle;
use crate::index::build_index;
use crate::persist::IndexStore;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Outcome of one reindex run, returned to whoever triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReindexReport {
    pub generation: u64,
    pub documents: usize,
    pub paragraphs: usize,
    pub terms: usize,
    pub skipped: Vec<SkippedDocument>,
}

impl ReindexReport {
    fn from_handle(handle: &IndexHandle) -> Self {
        let meta = handle.meta();
        Self {
            generation: meta.generation,
            documents: meta.num_documents,
            paragraphs: meta.num_paragraphs,
            terms: meta.num_terms,
            skipped: meta.skipped_documents.clone(),
        }
    }
}

/// Extract → preprocess → build → publish over every document in `corpus_dir`.
///
/// Callers must not run two rebuilds against the same store at once.
pub fn rebuild_index(
    corpus_dir: &Path,
    store: &IndexStore,
    extract: &ExtractConfig,
    index: IndexConfig,
) -> Result<(ReindexReport, IndexHandle)> {
    let extraction = extract_corpus(corpus_dir, extract)?;
    publish_extraction(extraction, store, index)
}

/// Same pipeline over documents already held in memory.
pub fn rebuild_from_documents<I>(
    documents: I,
    store: &IndexStore,
    extract: &ExtractConfig,
    index: IndexConfig,
) -> Result<(ReindexReport, IndexHandle)>
where
    I: IntoIterator<Item = SourceDocument>,
{
    publish_extraction(extract_documents(documents, extract), store, index)
}

fn publish_extraction(
    extraction: ExtractionReport,
    store: &IndexStore,
    index: IndexConfig,
) -> Result<(ReindexReport, IndexHandle)> {
    let ExtractionReport { paragraphs, documents, skipped } = extraction;
    if !skipped.is_empty() {
        tracing::warn!(skipped = skipped.len(), "some documents were skipped");
    }
    let built = build_index(paragraphs, index)?;
    let handle = store.publish(built, documents.len(), skipped)?;
    let report = ReindexReport::from_handle(&handle);
    tracing::info!(
        generation = report.generation,
        documents = report.documents,
        paragraphs = report.paragraphs,
        terms = report.terms,
        "reindex complete"
    );
    Ok((report, handle))
}
