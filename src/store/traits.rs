//! The storage capability the table layer depends on
//!
//! A `BlobStore` is the contract an actual storage engine fulfills. Keeping
//! it as a trait lets tables run against the in-process [`MemoryStore`] in
//! tests and an engine-backed implementation in production without either
//! side knowing the difference.
//!
//! [`MemoryStore`]: crate::store::MemoryStore

use crate::model::{BlobId, BucketId, LockKind};
use crate::store::Blob;
use crate::Result;

/// Blob storage organized into named buckets, with advisory per-blob locks
///
/// Identifier semantics: a blob name that has never been written resolves to
/// the null [`BlobId`]; once assigned, an id is stable across overwrites of
/// the same name. Locks are advisory - they only protect callers that take
/// them - and `lock` blocks until the requested kind is grantable. Any
/// timeout policy belongs to the implementation; when one applies it, the
/// failure surfaces as [`Error::LockTimeout`](crate::Error::LockTimeout) and
/// is never retried here.
pub trait BlobStore: Send + Sync {
    /// Open a bucket by name, creating it on first reference
    ///
    /// The same name always resolves to the same bucket, and therefore the
    /// same locking domain.
    fn open_bucket(&self, name: &str) -> Result<BucketId>;

    /// Names of all buckets in the store
    fn bucket_names(&self) -> Result<Vec<String>>;

    /// Resolve a blob name to its id; null if the name was never written
    fn blob_id(&self, bucket: BucketId, name: &str) -> Result<BlobId>;

    /// Write or overwrite the blob under `name`, returning its id
    fn put(&self, bucket: BucketId, name: &str, blob: Blob) -> Result<BlobId>;

    /// Fetch a blob by id
    fn get(&self, bucket: BucketId, id: BlobId) -> Result<Blob>;

    /// Remove a blob; succeeds even if already absent
    fn destroy_blob(&self, bucket: BucketId, id: BlobId) -> Result<()>;

    /// Names of all blobs in a bucket
    fn blob_names(&self, bucket: BucketId) -> Result<Vec<String>>;

    /// Acquire an advisory lock on a blob, blocking until grantable
    fn lock(&self, bucket: BucketId, id: BlobId, kind: LockKind) -> Result<()>;

    /// Release an advisory lock previously acquired with [`lock`](Self::lock)
    fn unlock(&self, bucket: BucketId, id: BlobId, kind: LockKind) -> Result<()>;

    /// Flush durable state; a no-op for volatile stores
    fn sync(&self) -> Result<()> {
        Ok(())
    }

    /// Remove a bucket and every blob it contains; succeeds if already gone
    fn destroy_bucket(&self, bucket: BucketId) -> Result<()>;
}

/// Scoped advisory lock
///
/// Acquires on construction and releases on drop, so the lock is returned on
/// every exit path - including error paths between acquire and release.
pub struct LockGuard<'s> {
    store: &'s dyn BlobStore,
    bucket: BucketId,
    blob: BlobId,
    kind: LockKind,
}

impl<'s> LockGuard<'s> {
    /// Block until the lock is granted
    pub fn acquire(
        store: &'s dyn BlobStore,
        bucket: BucketId,
        blob: BlobId,
        kind: LockKind,
    ) -> Result<Self> {
        store.lock(bucket, blob, kind)?;
        Ok(LockGuard {
            store,
            bucket,
            blob,
            kind,
        })
    }

    pub fn kind(&self) -> LockKind {
        self.kind
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        // Nothing useful to do with an unlock failure during unwind
        let _ = self.store.unlock(self.bucket, self.blob, self.kind);
    }
}
