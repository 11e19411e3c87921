//! Key-addressed record table over a blob store
//!
//! Each record is serialized as a single blob whose name is the record key.
//! The table performs no concurrency of its own; correctness under
//! concurrent callers comes from bracketing every blob access in the
//! appropriate advisory lock, released on every exit path.

use crate::codec;
use crate::model::{BlobId, BucketId, LockKind, Record};
use crate::store::{BlobStore, LockGuard};
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A named collection of records bound to one bucket
///
/// Obtained from [`KvStore::table`](crate::KvStore::table). Handles opened
/// under the same name share the same bucket and therefore the same locking
/// domain.
pub struct Table {
    name: String,
    store: Arc<dyn BlobStore>,
    bucket: BucketId,
    destroyed: AtomicBool,
}

impl Table {
    pub(crate) fn open(store: Arc<dyn BlobStore>, name: &str) -> Result<Self> {
        let bucket = store.open_bucket(name)?;
        Ok(Table {
            name: name.to_string(),
            store,
            bucket,
            destroyed: AtomicBool::new(false),
        })
    }

    /// The table name
    pub fn name(&self) -> &str {
        &self.name
    }

    fn ensure_live(&self) -> Result<()> {
        if self.destroyed.load(Ordering::Acquire) {
            return Err(Error::TableDestroyed(self.name.clone()));
        }
        Ok(())
    }

    fn resolve(&self, key: &str) -> Result<BlobId> {
        self.store.blob_id(self.bucket, key)
    }

    /// Insert a record, replacing whatever was stored under the key
    ///
    /// Unconditional whole-record overwrite; see [`update`](Self::update)
    /// for field-level merging. Assigns the key a blob id on first write.
    pub fn insert(&self, key: &str, record: Record) -> Result<()> {
        self.ensure_live()?;
        let blob = codec::encode(&record)?;
        self.store.put(self.bucket, key, blob)?;
        Ok(())
    }

    /// Merge fields into the record under the key
    ///
    /// Absent keys behave as [`insert`](Self::insert). Otherwise the stored
    /// record is fetched and decoded under an exclusive write lock, the
    /// given fields are merged in (new values win on duplicate names), and
    /// the merged record is written back. The lock is released on every
    /// exit path, including decode and encode failures.
    pub fn update(&self, key: &str, record: Record) -> Result<()> {
        self.ensure_live()?;
        let id = self.resolve(key)?;
        if id.is_null() {
            return self.insert(key, record);
        }

        let _lock = LockGuard::acquire(&*self.store, self.bucket, id, LockKind::ExternalWrite)?;
        let blob = self.store.get(self.bucket, id)?;
        let mut merged = codec::decode(&blob)?;
        merged.merge(record);
        let encoded = codec::encode(&merged)?;
        self.store.put(self.bucket, key, encoded)?;
        Ok(())
    }

    /// Read the full record under the key
    ///
    /// Fails with [`Error::KeyNotFound`] if the key has never been written.
    pub fn read(&self, key: &str) -> Result<Record> {
        self.read_fields(key, &[])
    }

    /// Read a subset of fields from the record under the key
    ///
    /// An empty subset means the full record. Names in the subset that the
    /// record does not carry are silently omitted from the result, not an
    /// error.
    pub fn read_fields(&self, key: &str, fields: &[&str]) -> Result<Record> {
        self.ensure_live()?;
        let id = self.resolve(key)?;
        if id.is_null() {
            return Err(Error::KeyNotFound(key.to_string()));
        }

        let record = {
            let _lock =
                LockGuard::acquire(&*self.store, self.bucket, id, LockKind::ExternalRead)?;
            let blob = self.store.get(self.bucket, id)?;
            codec::decode(&blob)?
        };

        if fields.is_empty() {
            Ok(record)
        } else {
            Ok(record.project(fields))
        }
    }

    /// Remove the record under the key
    ///
    /// A no-op for keys that were never written or already erased.
    pub fn erase(&self, key: &str) -> Result<()> {
        self.ensure_live()?;
        let id = self.resolve(key)?;
        if id.is_null() {
            return Ok(());
        }
        self.store.destroy_blob(self.bucket, id)
    }

    /// List the keys currently present in the table
    pub fn keys(&self) -> Result<Vec<String>> {
        self.ensure_live()?;
        self.store.blob_names(self.bucket)
    }

    /// Destroy the table and every record it contains
    ///
    /// The handle is unusable afterwards: every operation, including a
    /// second `destroy`, fails with [`Error::TableDestroyed`].
    pub fn destroy(&self) -> Result<()> {
        self.ensure_live()?;
        self.store.destroy_bucket(self.bucket)?;
        self.destroyed.store(true, Ordering::Release);
        Ok(())
    }
}
