//! Store handle and composition root
//!
//! A `KvStore` owns the connection to a blob-store backend and hands out
//! [`Table`] handles. It is constructed explicitly and passed where needed;
//! there is no process-wide singleton.

use crate::store::{BlobStore, FileStore, MemoryStore};
use crate::table::Table;
use crate::Result;
use std::path::Path;
use std::sync::Arc;

/// The key-value store entry point
///
/// Cloning is cheap; clones share the same backend.
#[derive(Clone)]
pub struct KvStore {
    store: Arc<dyn BlobStore>,
}

impl KvStore {
    /// Build a store over any blob-store backend
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        KvStore { store }
    }

    /// Build a store over a fresh in-process backend
    pub fn in_memory() -> Self {
        KvStore::new(Arc::new(MemoryStore::new()))
    }

    /// Create a new store file at the given path
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(KvStore::new(Arc::new(FileStore::create(path)?)))
    }

    /// Open an existing store file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(KvStore::new(Arc::new(FileStore::open(path)?)))
    }

    /// Open or create a store file
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(KvStore::new(Arc::new(FileStore::open_or_create(path)?)))
    }

    /// Get or create a table by name
    ///
    /// Opening the same name twice yields handles over the same underlying
    /// data and locking domain.
    pub fn table(&self, name: &str) -> Result<Table> {
        Table::open(Arc::clone(&self.store), name)
    }

    /// Names of all tables in the store
    pub fn table_names(&self) -> Result<Vec<String>> {
        self.store.bucket_names()
    }

    /// Flush durable state
    pub fn sync(&self) -> Result<()> {
        self.store.sync()
    }
}
