use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot extract text from PDF {}: {reason}", path.display())]
    Pdf { path: PathBuf, reason: String },

    #[error("Unsupported document type: {}", .0.display())]
    Unsupported(PathBuf),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Upsert of batch {batch} for '{doc}' failed: {reason}")]
    Upsert { doc: String, batch: usize, reason: String },

    #[error("Index directory {} is locked by another build", .0.display())]
    IndexLocked(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
