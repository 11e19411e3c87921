//! In-process blob store
//!
//! Volatile implementation of [`BlobStore`] over plain hash maps. This is
//! the backend tests and embedded callers use; it honors the same
//! identifier and locking semantics as the durable store.

use crate::model::{BlobId, BucketId, LockKind};
use crate::store::lock_table::LockTable;
use crate::store::{Blob, BlobStore};
use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Blobs and name bindings for one bucket
struct BucketState {
    name: String,
    /// Blob name -> id; ids stay stable across overwrites
    names: HashMap<String, BlobId>,
    /// Id -> payload
    blobs: HashMap<BlobId, Blob>,
}

impl BucketState {
    fn new(name: &str) -> Self {
        BucketState {
            name: name.to_string(),
            names: HashMap::new(),
            blobs: HashMap::new(),
        }
    }
}

/// A volatile, in-process blob store
pub struct MemoryStore {
    node_id: u32,
    next_unique: AtomicU64,
    buckets: RwLock<HashMap<BucketId, BucketState>>,
    by_name: RwLock<HashMap<String, BucketId>>,
    locks: LockTable,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store owned by node 1
    pub fn new() -> Self {
        Self::with_node_id(1)
    }

    /// Create an empty store issuing identifiers under the given node id
    pub fn with_node_id(node_id: u32) -> Self {
        MemoryStore {
            node_id,
            // 0 is the null sentinel
            next_unique: AtomicU64::new(1),
            buckets: RwLock::new(HashMap::new()),
            by_name: RwLock::new(HashMap::new()),
            locks: LockTable::new(),
        }
    }

    fn alloc_unique(&self) -> u64 {
        self.next_unique.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of blobs across all buckets
    pub fn blob_count(&self) -> usize {
        self.buckets
            .read()
            .values()
            .map(|bkt| bkt.blobs.len())
            .sum()
    }
}

impl BlobStore for MemoryStore {
    fn open_bucket(&self, name: &str) -> Result<BucketId> {
        if let Some(id) = self.by_name.read().get(name) {
            return Ok(*id);
        }

        // Lock order is buckets before by_name, same as destroy_bucket
        let mut buckets = self.buckets.write();
        let mut by_name = self.by_name.write();
        // Lost the race to another opener
        if let Some(id) = by_name.get(name) {
            return Ok(*id);
        }

        let id = BucketId::new(self.alloc_unique(), self.node_id);
        by_name.insert(name.to_string(), id);
        buckets.insert(id, BucketState::new(name));
        debug!(bucket = name, id = %id, "Opened bucket");
        Ok(id)
    }

    fn bucket_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.by_name.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn blob_id(&self, bucket: BucketId, name: &str) -> Result<BlobId> {
        let buckets = self.buckets.read();
        let state = buckets.get(&bucket).ok_or(Error::BucketNotFound(bucket))?;
        Ok(state.names.get(name).copied().unwrap_or(BlobId::NULL))
    }

    fn put(&self, bucket: BucketId, name: &str, blob: Blob) -> Result<BlobId> {
        let mut buckets = self.buckets.write();
        let state = buckets
            .get_mut(&bucket)
            .ok_or(Error::BucketNotFound(bucket))?;

        let id = match state.names.get(name) {
            Some(existing) => *existing,
            None => {
                let id = BlobId::new(self.alloc_unique(), self.node_id);
                state.names.insert(name.to_string(), id);
                id
            }
        };
        trace!(blob = name, id = %id, size = blob.len(), "Put blob");
        state.blobs.insert(id, blob);
        Ok(id)
    }

    fn get(&self, bucket: BucketId, id: BlobId) -> Result<Blob> {
        if id.is_null() {
            return Err(Error::BlobNotFound(id));
        }
        let buckets = self.buckets.read();
        let state = buckets.get(&bucket).ok_or(Error::BucketNotFound(bucket))?;
        state.blobs.get(&id).cloned().ok_or(Error::BlobNotFound(id))
    }

    fn destroy_blob(&self, bucket: BucketId, id: BlobId) -> Result<()> {
        if id.is_null() {
            return Ok(());
        }
        let mut buckets = self.buckets.write();
        let state = match buckets.get_mut(&bucket) {
            Some(state) => state,
            None => return Ok(()),
        };
        if state.blobs.remove(&id).is_some() {
            state.names.retain(|_, blob_id| *blob_id != id);
            trace!(id = %id, "Destroyed blob");
        }
        Ok(())
    }

    fn blob_names(&self, bucket: BucketId) -> Result<Vec<String>> {
        let buckets = self.buckets.read();
        let state = buckets.get(&bucket).ok_or(Error::BucketNotFound(bucket))?;
        let mut names: Vec<String> = state.names.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn lock(&self, bucket: BucketId, id: BlobId, kind: LockKind) -> Result<()> {
        self.locks.lock(bucket, id, kind);
        Ok(())
    }

    fn unlock(&self, bucket: BucketId, id: BlobId, kind: LockKind) -> Result<()> {
        self.locks.unlock(bucket, id, kind)
    }

    fn destroy_bucket(&self, bucket: BucketId) -> Result<()> {
        let mut buckets = self.buckets.write();
        if let Some(state) = buckets.remove(&bucket) {
            self.by_name.write().remove(&state.name);
            self.locks.forget_bucket(bucket);
            debug!(bucket = %state.name, "Destroyed bucket");
        }
        Ok(())
    }
}
