use crate::error::{Error, Result};
use crate::extract::SkippedDocument;
use crate::handle::{validate, IndexHandle};
use crate::index::{BuiltIndex, Paragraph, PreprocessedParagraph, Vocabulary, WeightMatrix};
use crate::preprocess::Language;
use crate::search::{search, SearchResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

const CURRENT: &str = "CURRENT";
const GENERATION_PREFIX: &str = "gen-";
const TMP_SUFFIX: &str = ".tmp";

/// Manifest of one generation, stored as `meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub generation: u64,
    pub version: u32,
    pub created_at: String,
    pub num_paragraphs: usize,
    pub num_terms: usize,
    pub num_documents: usize,
    pub language: Language,
    pub sublinear_tf: bool,
    #[serde(default)]
    pub skipped_documents: Vec<SkippedDocument>,
}

impl MetaFile {
    pub fn describe(
        built: &BuiltIndex,
        generation: u64,
        num_documents: usize,
        skipped_documents: Vec<SkippedDocument>,
    ) -> Self {
        Self {
            generation,
            version: FORMAT_VERSION,
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            num_paragraphs: built.paragraphs.len(),
            num_terms: built.vocabulary.len(),
            num_documents,
            language: built.config.language,
            sublinear_tf: built.config.sublinear_tf,
            skipped_documents,
        }
    }
}

/// File layout of a single generation directory.
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    fn paragraphs(&self) -> PathBuf { self.root.join("paragraphs.json") }
    fn preprocessed(&self) -> PathBuf { self.root.join("preprocessed.json") }
    fn vocabulary(&self) -> PathBuf { self.root.join("vocabulary.bin") }
    fn matrix(&self) -> PathBuf { self.root.join("matrix.bin") }
}

/// Directory of index generations plus the `CURRENT` pointer naming the live one.
///
/// Writers build a complete generation under a temporary name, rename it into
/// place and only then swap `CURRENT`, so a reader that resolves the pointer
/// always finds a whole generation.
#[derive(Debug, Clone)]
pub struct IndexStore {
    root: PathBuf,
}

impl IndexStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pointer(&self) -> PathBuf {
        self.root.join(CURRENT)
    }

    fn generation_dir(&self, generation: u64) -> PathBuf {
        self.root.join(format!("{GENERATION_PREFIX}{generation:06}"))
    }

    /// Reads only the pointer file. `None` means nothing has been published yet.
    pub fn current_generation(&self) -> Result<Option<u64>> {
        let pointer = self.pointer();
        match fs::read_to_string(&pointer) {
            Ok(s) => s
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| Error::corrupt(format!("{} does not hold a generation number", pointer.display()))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(pointer)(e)),
        }
    }

    /// Loads whatever generation `CURRENT` names, or `None` before the first publish.
    pub fn load_current(&self) -> Result<Option<IndexHandle>> {
        match self.current_generation()? {
            Some(generation) => self.load_generation(generation).map(Some),
            None => Ok(None),
        }
    }

    pub fn load_generation(&self, generation: u64) -> Result<IndexHandle> {
        let paths = IndexPaths::new(self.generation_dir(generation));
        let meta: MetaFile = read_json(&paths.meta())?;
        if meta.generation != generation {
            return Err(Error::corrupt(format!(
                "manifest in {} claims generation {}",
                paths.root.display(),
                meta.generation
            )));
        }
        if meta.version != FORMAT_VERSION {
            return Err(Error::corrupt(format!("unsupported index format version {}", meta.version)));
        }
        let paragraphs: Vec<Paragraph> = read_json(&paths.paragraphs())?;
        let vocabulary: Vocabulary = read_bincode(&paths.vocabulary())?;
        let matrix: WeightMatrix = read_bincode(&paths.matrix())?;
        if meta.num_paragraphs != paragraphs.len() || meta.num_terms != vocabulary.len() {
            return Err(Error::corrupt(format!(
                "manifest records {} paragraphs and {} terms, artifacts hold {} and {}",
                meta.num_paragraphs,
                meta.num_terms,
                paragraphs.len(),
                vocabulary.len()
            )));
        }
        tracing::debug!(generation, num_paragraphs = paragraphs.len(), "loaded index generation");
        IndexHandle::new(meta, paragraphs, vocabulary, matrix)
    }

    /// Preprocessed paragraphs of a generation, kept for inspection. Builds
    /// preprocess from the raw paragraphs and never read this back.
    pub fn load_preprocessed(&self, generation: u64) -> Result<Vec<PreprocessedParagraph>> {
        read_json(&IndexPaths::new(self.generation_dir(generation)).preprocessed())
    }

    /// Writes `built` as the next generation and makes it current.
    pub fn publish(
        &self,
        built: BuiltIndex,
        num_documents: usize,
        skipped_documents: Vec<SkippedDocument>,
    ) -> Result<IndexHandle> {
        validate(built.paragraphs.len(), &built.vocabulary, &built.matrix)?;
        fs::create_dir_all(&self.root).map_err(Error::io(&self.root))?;
        self.remove_stale_tmp()?;

        let existing = self.list_generations()?;
        let latest = existing.iter().copied().max().into_iter().chain(self.current_generation()?).max();
        let generation = latest.unwrap_or(0) + 1;
        let meta = MetaFile::describe(&built, generation, num_documents, skipped_documents);

        let final_dir = self.generation_dir(generation);
        let tmp_dir = self.root.join(format!("{GENERATION_PREFIX}{generation:06}{TMP_SUFFIX}"));
        fs::create_dir_all(&tmp_dir).map_err(Error::io(&tmp_dir))?;
        let paths = IndexPaths::new(&tmp_dir);
        let paragraphs: Vec<&Paragraph> = built.paragraphs.iter().map(|p| &p.paragraph).collect();
        write_json(&paths.paragraphs(), &paragraphs)?;
        write_json(&paths.preprocessed(), &built.paragraphs)?;
        write_bincode(&paths.vocabulary(), &built.vocabulary)?;
        write_bincode(&paths.matrix(), &built.matrix)?;
        write_json(&paths.meta(), &meta)?;
        fs::rename(&tmp_dir, &final_dir).map_err(Error::io(&final_dir))?;

        let pointer_tmp = self.root.join(format!("{CURRENT}{TMP_SUFFIX}"));
        write_file(&pointer_tmp, format!("{generation}\n").as_bytes())?;
        fs::rename(&pointer_tmp, self.pointer()).map_err(Error::io(self.pointer()))?;
        tracing::info!(generation, num_paragraphs = meta.num_paragraphs, num_terms = meta.num_terms, "published index generation");

        self.prune(generation)?;
        let BuiltIndex { paragraphs, vocabulary, matrix, .. } = built;
        let paragraphs = paragraphs.into_iter().map(|p| p.paragraph).collect();
        IndexHandle::new(meta, paragraphs, vocabulary, matrix)
    }

    /// Loads the current generation fresh and searches it.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let handle = self.load_current()?;
        search(handle.as_ref(), query, top_k)
    }

    fn list_generations(&self) -> Result<Vec<u64>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&self.root)(e)),
        };
        let mut generations = Vec::new();
        for entry in entries {
            let entry = entry.map_err(Error::io(&self.root))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(generation) = name.strip_prefix(GENERATION_PREFIX).and_then(|n| n.parse::<u64>().ok()) {
                generations.push(generation);
            }
        }
        generations.sort_unstable();
        Ok(generations)
    }

    fn remove_stale_tmp(&self) -> Result<()> {
        let entries = fs::read_dir(&self.root).map_err(Error::io(&self.root))?;
        for entry in entries {
            let entry = entry.map_err(Error::io(&self.root))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(GENERATION_PREFIX) && name.ends_with(TMP_SUFFIX) {
                tracing::warn!(dir = %name, "removing incomplete generation from an earlier build");
                fs::remove_dir_all(entry.path()).map_err(Error::io(entry.path()))?;
            }
        }
        Ok(())
    }

    // Keeps the current generation and the one before it, which a reader that
    // resolved the old pointer may still be loading.
    fn prune(&self, current: u64) -> Result<()> {
        for generation in self.list_generations()? {
            if generation + 1 < current {
                let dir = self.generation_dir(generation);
                fs::remove_dir_all(&dir).map_err(Error::io(&dir))?;
                tracing::debug!(generation, "pruned old index generation");
            }
        }
        Ok(())
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut f = File::create(path).map_err(Error::io(path))?;
    f.write_all(bytes).map_err(Error::io(path))?;
    f.sync_all().map_err(Error::io(path))?;
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value).map_err(|e| Error::Serialization(e.to_string()))?;
    write_file(path, &json)
}

fn write_bincode<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let bytes = bincode::serialize(value).map_err(|e| Error::Serialization(e.to_string()))?;
    write_file(path, &bytes)
}

// A missing artifact inside a generation the pointer names means the
// generation is broken, not that the index is absent.
fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::corrupt(format!("missing artifact {}", path.display())),
        _ => Error::io(path)(e),
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = read_artifact(path)?;
    serde_json::from_slice(&bytes).map_err(|e| Error::corrupt(format!("{}: {e}", path.display())))
}

fn read_bincode<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = read_artifact(path)?;
    bincode::deserialize(&bytes).map_err(|e| Error::corrupt(format!("{}: {e}", path.display())))
}
