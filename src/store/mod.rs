//! Blob storage layer
//!
//! This module defines the [`BlobStore`] capability trait the table layer
//! depends on, plus the two backends that ship in-crate: a volatile
//! in-process store and a single-file durable store.

mod blob;
mod file_store;
mod lock_table;
mod memory;
mod traits;

pub use blob::Blob;
pub use file_store::FileStore;
pub use lock_table::LockTable;
pub use memory::MemoryStore;
pub use traits::{BlobStore, LockGuard};
