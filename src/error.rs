//! Error types for table generation and lookup

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum T3cError {
    /// The table file could not be opened. Fatal to a lookup session.
    #[error("cannot open table file {path:?}: {source}")]
    TableOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot open wordlist {path:?}: {source}")]
    WordlistOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unknown digest algorithm '{0}' (expected SIMPLE or SHA256)")]
    UnknownAlgorithm(String),

    #[error("invalid size format: '{0}'")]
    InvalidSize(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, T3cError>;
