use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::extract::SkippedDocument;
use crate::index::{BuiltIndex, Paragraph, ParagraphId, Vocabulary, WeightMatrix, WeightModel};
use crate::persist::MetaFile;

/// One loaded index generation: paragraphs, vocabulary and weight matrix that
/// were built together. Retrieval and summarization only ever read through a
/// handle, so parts of different generations cannot be mixed.
#[derive(Debug, Clone)]
pub struct IndexHandle {
    meta: MetaFile,
    paragraphs: Vec<Paragraph>,
    vocabulary: Vocabulary,
    matrix: WeightMatrix,
}

impl IndexHandle {
    /// Assembles a handle, rejecting any shape mismatch as `IndexCorrupt`.
    pub fn new(
        meta: MetaFile,
        paragraphs: Vec<Paragraph>,
        vocabulary: Vocabulary,
        matrix: WeightMatrix,
    ) -> Result<Self> {
        validate(paragraphs.len(), &vocabulary, &matrix)?;
        Ok(Self { meta, paragraphs, vocabulary, matrix })
    }

    /// Wraps a freshly built index without publishing it.
    pub fn from_built(
        built: BuiltIndex,
        generation: u64,
        documents: usize,
        skipped: Vec<SkippedDocument>,
    ) -> Result<Self> {
        let meta = MetaFile::describe(&built, generation, documents, skipped);
        let BuiltIndex { paragraphs, vocabulary, matrix, .. } = built;
        let paragraphs = paragraphs.into_iter().map(|p| p.paragraph).collect();
        Self::new(meta, paragraphs, vocabulary, matrix)
    }

    pub fn generation(&self) -> u64 {
        self.meta.generation
    }

    pub fn meta(&self) -> &MetaFile {
        &self.meta
    }

    pub fn config(&self) -> IndexConfig {
        IndexConfig { language: self.meta.language, sublinear_tf: self.meta.sublinear_tf }
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn paragraph(&self, id: ParagraphId) -> Option<&Paragraph> {
        let direct = (id as usize)
            .checked_sub(1)
            .and_then(|i| self.paragraphs.get(i))
            .filter(|p| p.id == id);
        direct.or_else(|| self.paragraphs.iter().find(|p| p.id == id))
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn matrix(&self) -> &WeightMatrix {
        &self.matrix
    }

    pub fn model(&self) -> WeightModel<'_> {
        WeightModel::new(&self.vocabulary, self.config())
    }
}

/// Checks that a vocabulary and matrix describe `num_paragraphs` rows over the
/// same column space.
pub(crate) fn validate(num_paragraphs: usize, vocabulary: &Vocabulary, matrix: &WeightMatrix) -> Result<()> {
    if matrix.cols != vocabulary.len() {
        return Err(Error::corrupt(format!(
            "weight matrix has {} columns but the vocabulary has {} terms",
            matrix.cols,
            vocabulary.len()
        )));
    }
    if vocabulary.idf.len() != vocabulary.len() {
        return Err(Error::corrupt(format!(
            "vocabulary has {} terms but {} idf values",
            vocabulary.len(),
            vocabulary.idf.len()
        )));
    }
    if matrix.rows.len() != num_paragraphs {
        return Err(Error::corrupt(format!(
            "weight matrix has {} rows but there are {} paragraphs",
            matrix.rows.len(),
            num_paragraphs
        )));
    }
    let mut seen = vec![false; vocabulary.len()];
    for (token, &tid) in &vocabulary.dictionary {
        match seen.get_mut(tid as usize) {
            None => return Err(Error::corrupt(format!("vocabulary column {tid} is out of range"))),
            Some(true) => return Err(Error::corrupt(format!("vocabulary column {tid} is shared by {token:?}"))),
            Some(slot) => *slot = true,
        }
    }
    for (i, row) in matrix.rows.iter().enumerate() {
        if let Some(e) = row.entries.iter().find(|e| e.term_id as usize >= matrix.cols) {
            return Err(Error::corrupt(format!("row {i} references column {} of {}", e.term_id, matrix.cols)));
        }
        if row.entries.windows(2).any(|w| w[0].term_id >= w[1].term_id) {
            return Err(Error::corrupt(format!("row {i} is not sorted by column")));
        }
    }
    Ok(())
}
