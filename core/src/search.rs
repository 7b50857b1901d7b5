//! Query-time retrieval over one index generation.
//!
//! Every paragraph row is scored by cosine similarity against the query
//! vector. Rows and queries are both L2-normalized, so the cosine is a plain
//! dot product. This is a linear scan over the whole matrix.

use crate::error::{Error, Result};
use crate::handle::IndexHandle;
use crate::highlight::{highlight, Markup};
use crate::index::ParagraphId;
use crate::summarize::{summarize, DEFAULT_SUMMARY_SENTENCES};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub rank: usize,
    pub score: f32,
    pub paragraph_id: ParagraphId,
    pub source_document: String,
    pub paragraph_text_highlighted: String,
    pub summary_highlighted: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub top_k: usize,
    pub summary_sentences: usize,
    pub markup: Markup,
}

impl SearchOptions {
    pub fn new(top_k: usize) -> Self {
        Self { top_k, summary_sentences: DEFAULT_SUMMARY_SENTENCES, markup: Markup::default() }
    }
}

/// A paragraph position in the generation together with its similarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredParagraph {
    pub index: usize,
    pub id: ParagraphId,
    pub score: f32,
}

/// Searches with default summary length and markup.
pub fn search(handle: Option<&IndexHandle>, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
    search_with(handle, query, &SearchOptions::new(top_k))
}

/// Ranks paragraphs for `query` and annotates the best `top_k` of them.
///
/// No index, a blank query, or a query sharing no term with the vocabulary
/// all yield an empty list.
pub fn search_with(handle: Option<&IndexHandle>, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
    if options.top_k == 0 {
        return Err(Error::invalid("top_k must be a positive integer"));
    }
    if options.summary_sentences == 0 {
        return Err(Error::invalid("summary sentence count must be positive"));
    }
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }
    let Some(handle) = handle else {
        tracing::debug!("no index generation published yet");
        return Ok(Vec::new());
    };

    let model = handle.model();
    let language = handle.config().language;
    let ranked = rank(handle, query, options.top_k);
    tracing::debug!(generation = handle.generation(), hits = ranked.len(), "ranked query");

    ranked
        .into_iter()
        .enumerate()
        .map(|(i, hit)| {
            let paragraph = &handle.paragraphs()[hit.index];
            let summary = summarize(&paragraph.text, &model, options.summary_sentences)?;
            Ok(SearchResult {
                rank: i + 1,
                score: hit.score,
                paragraph_id: paragraph.id,
                source_document: paragraph.source_document.clone(),
                paragraph_text_highlighted: highlight(&paragraph.text, query, language, &options.markup),
                summary_highlighted: highlight(&summary, query, language, &options.markup),
            })
        })
        .collect()
}

/// Scores every paragraph against `query` and returns the strictly positive
/// ones, best first, ties broken by ascending paragraph id, at most `top_k`.
pub fn rank(handle: &IndexHandle, query: &str, top_k: usize) -> Vec<ScoredParagraph> {
    let query_vec = handle.model().vectorize(query);
    if query_vec.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<ScoredParagraph> = handle
        .matrix()
        .rows
        .iter()
        .zip(handle.paragraphs())
        .enumerate()
        .filter_map(|(index, (row, paragraph))| {
            let score = row.dot(&query_vec).clamp(0.0, 1.0);
            (score > 0.0).then_some(ScoredParagraph { index, id: paragraph.id, score })
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal).then(a.id.cmp(&b.id)));
    scored.truncate(top_k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::index::{build_index, Paragraph};

    fn handle(texts: &[&str]) -> IndexHandle {
        let paragraphs = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Paragraph { id: i as u32 + 1, source_document: format!("doc{}.pdf", i + 1), text: t.to_string() })
            .collect();
        IndexHandle::from_built(build_index(paragraphs, IndexConfig::default()).unwrap(), 1, texts.len(), vec![]).unwrap()
    }

    #[test]
    fn leukemia_query_prefers_the_blood_paragraph() {
        let h = handle(&["leukemia is a cancer of blood cells", "mitochondria produce cellular energy"]);
        let results = search(Some(&h), "leukemia blood", 5).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[0].paragraph_id, 1);
        assert!(results[0].score > 0.0 && results[0].score <= 1.0);
        assert_eq!(
            results[0].paragraph_text_highlighted,
            "<em>leukemia</em> is a cancer of <em>blood</em> cells"
        );
    }

    #[test]
    fn folded_hits_are_still_highlighted() {
        let h = handle(&[
            "\u{fb01}brosis of marrow",
            "COVID-19 patients with leukemia",
            "mitochondria produce cellular energy",
        ]);
        let results = search(Some(&h), "fibrosis", 3).unwrap();
        assert_eq!(results[0].paragraph_id, 1);
        assert_eq!(results[0].paragraph_text_highlighted, "<em>\u{fb01}brosis</em> of marrow");

        let results = search(Some(&h), "COVID-19", 3).unwrap();
        assert_eq!(results[0].paragraph_id, 2);
        assert_eq!(results[0].paragraph_text_highlighted, "<em>COVID-19</em> patients with leukemia");
        assert_eq!(results[0].summary_highlighted, results[0].paragraph_text_highlighted);
    }

    #[test]
    fn ties_break_on_paragraph_id() {
        let h = handle(&["marrow biopsy", "unrelated words", "marrow biopsy"]);
        let ranked = rank(&h, "marrow", 10);
        assert_eq!(ranked.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(ranked[0].score, ranked[1].score);
    }

    #[test]
    fn top_k_bounds_results() {
        let h = handle(&["blood one", "blood two", "blood three", "energy"]);
        assert_eq!(search(Some(&h), "blood", 2).unwrap().len(), 2);
        assert_eq!(search(Some(&h), "blood", 10).unwrap().len(), 3);
    }

    #[test]
    fn no_overlap_yields_nothing() {
        let h = handle(&["blood cells", "cellular energy"]);
        assert!(search(Some(&h), "quantum chromodynamics", 3).unwrap().is_empty());
        assert!(search(Some(&h), "the of and", 3).unwrap().is_empty());
    }

    #[test]
    fn blank_query_and_missing_index_are_empty() {
        let h = handle(&["blood cells"]);
        assert!(search(Some(&h), "   \t", 3).unwrap().is_empty());
        assert!(search(None, "blood", 3).unwrap().is_empty());
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let h = handle(&["blood cells"]);
        assert!(matches!(search(Some(&h), "blood", 0), Err(Error::InvalidInput(_))));
        assert!(matches!(search(None, "", 0), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn summary_sentences_must_be_positive() {
        let h = handle(&["blood cells"]);
        let options = SearchOptions { summary_sentences: 0, ..SearchOptions::new(3) };
        assert!(matches!(search_with(Some(&h), "blood", &options), Err(Error::InvalidInput(_))));
    }
}
