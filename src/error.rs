//! Error types for merge-versions.
//!
//! Version-level rule violations live in [`PhotoError`]; everything that
//! can go wrong while talking to a photo store is a [`StoreError`].

use std::path::PathBuf;

use thiserror::Error;

use crate::state::data::{PhotoId, VersionId};

/// Errors raised by operations on a single photo's version list.
#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("Photo {photo} has no version {version}")]
    VersionNotFound { photo: PhotoId, version: VersionId },

    #[error("Cannot rename the original version of photo {photo}")]
    CannotRenameOriginal { photo: PhotoId },

    #[error("Photo {photo} already has a version named '{name}'")]
    VersionNameExists { photo: PhotoId, name: String },

    #[error("Cannot delete the original version of photo {photo}")]
    CannotDeleteOriginal { photo: PhotoId },
}

/// Errors raised by a [`PhotoStore`](crate::state::store::PhotoStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Photo(#[from] PhotoError),

    #[error("Photo not found: {id}")]
    PhotoNotFound { id: PhotoId },

    #[error("Invalid capture timestamp {secs} for photo {id}")]
    InvalidTimestamp { id: PhotoId, secs: i64 },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias used by store implementations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine the user data directory; pass --catalog or set {env}")]
    NoDataDir { env: &'static str },
}
