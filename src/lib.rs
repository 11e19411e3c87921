//! # facet_db
//!
//! An embedded key-value table of field-structured records over pluggable
//! blob storage.
//!
//! facet_db stores each record - a mapping from field names to typed values -
//! as one encoded blob in a bucket of a [`BlobStore`]. Updates merge fields
//! into the stored record under an advisory write lock; reads decode under a
//! shared lock and can project a subset of fields.
//!
//! ## Core Concepts
//!
//! - **Records**: ordered field maps with typed values, persisted whole
//! - **Tables**: named record collections, each bound to one bucket
//! - **Blob store**: a pluggable backend; in-memory and single-file
//!   implementations ship in-crate
//! - **Advisory locks**: shared reads, exclusive writes, bracketing every
//!   record operation
//!
//! ## Example
//!
//! ```ignore
//! use facet_db::{KvStore, Record};
//!
//! let kv = KvStore::open_or_create("data.facet")?;
//! let users = kv.table("users")?;
//! users.insert("alice", Record::new().with("age", 30i64))?;
//! users.update("alice", Record::new().with("email", "alice@example.com"))?;
//! let rec = users.read("alice")?;
//! ```

pub mod codec;
pub mod model;
pub mod store;

mod error;
mod kvstore;
mod table;

pub use error::{Error, Result};
pub use kvstore::KvStore;
pub use model::{BlobId, BucketId, FieldValue, LockKind, Record};
pub use store::{Blob, BlobStore, FileStore, LockGuard, MemoryStore};
pub use table::Table;

/// Store file format version
pub const VERSION: u32 = 1;

/// Magic bytes identifying a store file
pub const MAGIC: &[u8; 8] = b"FACETDB\0";
