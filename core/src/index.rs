use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::preprocess::{preprocess, tokens, Language};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type TermId = u32;
pub type ParagraphId = u32;

/// A cleaned paragraph as produced by the extractor. Ids are sequential from 1
/// in extraction order across the whole corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub id: ParagraphId,
    pub source_document: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessedParagraph {
    #[serde(flatten)]
    pub paragraph: Paragraph,
    pub normalized_text: String,
}

impl PreprocessedParagraph {
    pub fn new(paragraph: Paragraph, language: Language) -> Self {
        let normalized_text = preprocess(&paragraph.text, language);
        Self { paragraph, normalized_text }
    }
}

/// Token to column mapping plus the smoothed IDF of every column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub dictionary: HashMap<String, TermId>,
    pub idf: Vec<f32>,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.dictionary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionary.is_empty()
    }

    pub fn term_id(&self, token: &str) -> Option<TermId> {
        self.dictionary.get(token).copied()
    }

    pub fn idf(&self, term_id: TermId) -> f32 {
        self.idf.get(term_id as usize).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermWeight {
    pub term_id: TermId,
    pub weight: f32,
}

/// One row of the weight matrix, stored sparsely and sorted by term id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub entries: Vec<TermWeight>,
}

impl SparseVector {
    /// Sorts the entries by term id and scales them to unit L2 norm. A vector
    /// with zero norm is returned unchanged.
    pub fn normalized(mut entries: Vec<TermWeight>) -> Self {
        entries.sort_by_key(|e| e.term_id);
        let norm = entries.iter().map(|e| e.weight * e.weight).sum::<f32>().sqrt();
        if norm > 0.0 {
            for e in entries.iter_mut() {
                e.weight /= norm;
            }
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge-join dot product of two term-sorted vectors.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < self.entries.len() && j < other.entries.len() {
            let (a, b) = (&self.entries[i], &other.entries[j]);
            match a.term_id.cmp(&b.term_id) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a.weight * b.weight;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    pub fn total_weight(&self) -> f32 {
        self.entries.iter().map(|e| e.weight).sum()
    }
}

/// Paragraph-by-term weights. `rows[i]` belongs to the i-th paragraph of the
/// same generation; `cols` must equal the vocabulary size.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightMatrix {
    pub cols: usize,
    pub rows: Vec<SparseVector>,
}

/// Smoothed inverse document frequency: `ln((1 + n) / (1 + df)) + 1`.
/// A term present in every paragraph still weighs 1.
pub fn smoothed_idf(num_paragraphs: usize, df: u32) -> f32 {
    ((1.0 + num_paragraphs as f32) / (1.0 + df as f32)).ln() + 1.0
}

pub fn tf_weight(count: u32, sublinear: bool) -> f32 {
    match (count, sublinear) {
        (0, _) => 0.0,
        (c, true) => 1.0 + (c as f32).ln(),
        (c, false) => c as f32,
    }
}

/// The TF-IDF weighting of one generation, applied to text that was not part
/// of the build (queries, summary sentences).
#[derive(Debug, Clone, Copy)]
pub struct WeightModel<'a> {
    pub vocabulary: &'a Vocabulary,
    pub config: IndexConfig,
}

impl<'a> WeightModel<'a> {
    pub fn new(vocabulary: &'a Vocabulary, config: IndexConfig) -> Self {
        Self { vocabulary, config }
    }

    /// Preprocesses `text` and projects it onto the vocabulary. Tokens outside
    /// the vocabulary are dropped; the result is L2-normalized like the rows.
    pub fn vectorize(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<TermId, u32> = HashMap::new();
        for token in tokens(text, self.config.language) {
            if let Some(tid) = self.vocabulary.term_id(&token) {
                *counts.entry(tid).or_insert(0) += 1;
            }
        }
        let entries = counts
            .into_iter()
            .map(|(term_id, count)| TermWeight {
                term_id,
                weight: tf_weight(count, self.config.sublinear_tf) * self.vocabulary.idf(term_id),
            })
            .collect();
        SparseVector::normalized(entries)
    }
}

/// Everything one reindex run produces before it is published.
#[derive(Debug, Clone)]
pub struct BuiltIndex {
    pub config: IndexConfig,
    pub paragraphs: Vec<PreprocessedParagraph>,
    pub vocabulary: Vocabulary,
    pub matrix: WeightMatrix,
}

/// Preprocesses `paragraphs` and builds the vocabulary and weight matrix.
pub fn build_index(paragraphs: Vec<Paragraph>, config: IndexConfig) -> Result<BuiltIndex> {
    let preprocessed = paragraphs
        .into_iter()
        .map(|p| PreprocessedParagraph::new(p, config.language))
        .collect::<Vec<_>>();
    let (vocabulary, matrix) = build_weights(&preprocessed, config.sublinear_tf)?;
    tracing::info!(
        num_paragraphs = matrix.rows.len(),
        num_terms = vocabulary.len(),
        sublinear_tf = config.sublinear_tf,
        "built weight matrix"
    );
    Ok(BuiltIndex { config, paragraphs: preprocessed, vocabulary, matrix })
}

/// Vocabulary columns are assigned in lexicographic token order so identical
/// corpora always produce identical generations.
pub fn build_weights(
    paragraphs: &[PreprocessedParagraph],
    sublinear_tf: bool,
) -> Result<(Vocabulary, WeightMatrix)> {
    if paragraphs.is_empty() {
        return Err(Error::EmptyCorpus);
    }

    let counts: Vec<BTreeMap<&str, u32>> = paragraphs
        .iter()
        .map(|p| {
            let mut tf: BTreeMap<&str, u32> = BTreeMap::new();
            for token in p.normalized_text.split_whitespace() {
                *tf.entry(token).or_insert(0) += 1;
            }
            tf
        })
        .collect();

    let mut df: BTreeMap<&str, u32> = BTreeMap::new();
    for row in &counts {
        for token in row.keys() {
            *df.entry(token).or_insert(0) += 1;
        }
    }
    if df.is_empty() {
        return Err(Error::EmptyCorpus);
    }

    let n = paragraphs.len();
    let mut vocabulary = Vocabulary {
        dictionary: HashMap::with_capacity(df.len()),
        idf: Vec::with_capacity(df.len()),
    };
    for (column, (token, df_t)) in df.into_iter().enumerate() {
        vocabulary.dictionary.insert(token.to_string(), column as TermId);
        vocabulary.idf.push(smoothed_idf(n, df_t));
    }

    let rows = counts
        .iter()
        .map(|row| {
            let entries = row
                .iter()
                .filter_map(|(token, &count)| {
                    let term_id = vocabulary.term_id(token)?;
                    Some(TermWeight {
                        term_id,
                        weight: tf_weight(count, sublinear_tf) * vocabulary.idf(term_id),
                    })
                })
                .collect();
            SparseVector::normalized(entries)
        })
        .collect();

    let matrix = WeightMatrix { cols: vocabulary.len(), rows };
    Ok((vocabulary, matrix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(id: ParagraphId, text: &str) -> Paragraph {
        Paragraph { id, source_document: "paper.pdf".into(), text: text.into() }
    }

    #[test]
    fn empty_corpus_is_rejected() {
        assert!(matches!(build_index(vec![], IndexConfig::default()), Err(Error::EmptyCorpus)));
    }

    #[test]
    fn stopword_only_corpus_is_rejected() {
        let err = build_index(vec![paragraph(1, "the and of")], IndexConfig::default());
        assert!(matches!(err, Err(Error::EmptyCorpus)));
    }

    #[test]
    fn columns_are_lexicographic_and_match_vocabulary() {
        let built = build_index(
            vec![paragraph(1, "zebra apple"), paragraph(2, "mango apple")],
            IndexConfig::default(),
        )
        .unwrap();
        assert_eq!(built.vocabulary.term_id("apple"), Some(0));
        assert_eq!(built.vocabulary.term_id("mango"), Some(1));
        assert_eq!(built.vocabulary.term_id("zebra"), Some(2));
        assert_eq!(built.matrix.cols, built.vocabulary.len());
        assert_eq!(built.matrix.rows.len(), 2);
    }

    #[test]
    fn rows_are_unit_length() {
        let built = build_index(
            vec![paragraph(1, "blood blood cells"), paragraph(2, "energy cells")],
            IndexConfig::default(),
        )
        .unwrap();
        for row in &built.matrix.rows {
            assert!((row.dot(row) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn ubiquitous_terms_keep_positive_idf() {
        assert!((smoothed_idf(4, 4) - 1.0).abs() < 1e-6);
        assert!(smoothed_idf(4, 1) > smoothed_idf(4, 2));
    }

    #[test]
    fn sublinear_tf_dampens_repeats() {
        assert_eq!(tf_weight(3, false), 3.0);
        assert!(tf_weight(3, true) < 3.0);
        assert_eq!(tf_weight(1, true), 1.0);
    }

    #[test]
    fn vectorize_drops_unknown_terms() {
        let built = build_index(vec![paragraph(1, "leukemia blood")], IndexConfig::default()).unwrap();
        let model = WeightModel::new(&built.vocabulary, built.config);
        assert!(model.vectorize("quantum chromodynamics").is_empty());
        let v = model.vectorize("Leukemia quantum");
        assert_eq!(v.entries.len(), 1);
        assert!((v.entries[0].weight - 1.0).abs() < 1e-6);
    }
}
