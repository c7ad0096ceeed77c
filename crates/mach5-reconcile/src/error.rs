//! Error types for asset reconciliation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by an [`AssetStore`](crate::AssetStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// MongoDB driver error.
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// Any other backend failure.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that abort a scan.
///
/// The artifact written so far is always closed before these are returned.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The store failed while reading the page at `offset`.
    #[error("store error at offset {offset} (partial artifact: {}): {source}", .artifact.display())]
    Store {
        /// Offset to pass as `--offset` to resume.
        offset: u64,
        artifact: PathBuf,
        #[source]
        source: StoreError,
    },

    /// The artifact could not be created or written. Entries written in full
    /// before the failure are kept.
    #[error("failed to write artifact {} at offset {offset}: {source}", .path.display())]
    Artifact {
        /// Offset of the first record whose entry did not make it to disk.
        offset: u64,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that abort a delete run.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// The artifact path does not exist.
    #[error("artifact file '{}' not found", .0.display())]
    ArtifactNotFound(PathBuf),

    /// The artifact exists but could not be read.
    #[error("failed to read artifact {}: {source}", .path.display())]
    ReadArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact is not a JSON array of missing-asset entries.
    #[error("malformed artifact {}: {source}", .path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A bulk delete failed. Batches already sent stay deleted.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment '{0}', expected dev or prod")]
    InvalidEnvironment(String),
}
