use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that escape the engine. Recoverable conditions (an unreadable
/// document, a missing index, query terms outside the vocabulary) are absorbed
/// before they get here.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied a parameter outside its domain (`top_k == 0`, zero summary sentences).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No paragraph survived extraction, or none of them left an indexable term.
    #[error("cannot build an index from an empty corpus")]
    EmptyCorpus,

    /// The published generation is internally inconsistent or unreadable.
    #[error("index corrupt, rebuild required: {0}")]
    IndexCorrupt(String),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.into();
        move |source| Error::Io { path, source }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Error {
        Error::InvalidInput(message.into())
    }

    pub(crate) fn corrupt(message: impl Into<String>) -> Error {
        Error::IndexCorrupt(message.into())
    }

    /// True for the "index corrupt, rebuild required" condition.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::IndexCorrupt(_))
    }
}
