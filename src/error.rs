//! Error types for facet_db

use crate::model::{BlobId, BucketId, LockKind};
use thiserror::Error;

/// Result type alias for facet_db operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in facet_db operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record encode failed: {0}")]
    Encode(#[source] bincode::Error),

    #[error("Record decode failed: {0}")]
    Decode(#[source] bincode::Error),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Blob not found: {0}")]
    BlobNotFound(BlobId),

    #[error("Bucket not found: {0}")]
    BucketNotFound(BucketId),

    #[error("Lock acquisition timed out")]
    LockTimeout,

    #[error("Unlock of {kind:?} lock that is not held on blob {blob}")]
    LockNotHeld { blob: BlobId, kind: LockKind },

    #[error("Table destroyed: {0}")]
    TableDestroyed(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Invalid store file: {0}")]
    InvalidFile(String),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}
