//! Paragraph-level TF-IDF search over a corpus of research papers.
//!
//! Offline, [`pipeline::rebuild_index`] extracts paragraphs from PDF and text
//! documents, preprocesses them, builds a vocabulary and an L2-normalized
//! weight matrix, and publishes the result as a new index generation.
//! Online, [`search::search`] ranks the paragraphs of one loaded
//! [`IndexHandle`] by cosine similarity and annotates each hit with a
//! highlighted extractive summary.

pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod handle;
pub mod highlight;
pub mod index;
pub mod persist;
pub mod pipeline;
pub mod preprocess;
pub mod search;
pub mod summarize;

pub use cache::IndexCache;
pub use config::{ExtractConfig, IndexConfig};
pub use error::{Error, Result};
pub use extract::{SkippedDocument, SourceDocument};
pub use handle::IndexHandle;
pub use highlight::Markup;
pub use index::{Paragraph, ParagraphId, PreprocessedParagraph, TermId, Vocabulary, WeightMatrix};
pub use persist::{IndexStore, MetaFile};
pub use pipeline::{rebuild_from_documents, rebuild_index, ReindexReport};
pub use preprocess::{preprocess, Language};
pub use search::{search, search_with, SearchOptions, SearchResult};
