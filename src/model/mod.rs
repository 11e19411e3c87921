//! Core data model types for facet_db

mod id;
mod lock;
mod record;

pub use id::{BlobId, BucketId, ID_BYTES};
pub use lock::LockKind;
pub use record::{FieldValue, Record};
