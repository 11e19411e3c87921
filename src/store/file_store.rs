//! Single-file durable blob store
//!
//! File format:
//! ```text
//! [HEADER: 64 bytes]
//!   - magic: 8 bytes ("FACETDB\0")
//!   - version: 4 bytes (u32 LE)
//!   - flags: 4 bytes
//!   - blob_count: 8 bytes (u64 LE)
//!   - index_offset: 8 bytes (u64 LE)
//!   - bucket_offset: 8 bytes (u64 LE)
//!   - bucket_count: 8 bytes (u64 LE)
//!   - next_unique: 8 bytes (u64 LE)
//!   - node_id: 4 bytes (u32 LE)
//!   - reserved: 4 bytes
//!
//! [BLOBS: variable]
//!   - zstd-compressed payloads, concatenated
//!
//! [INDEX: variable]
//!   - blob_count entries of (blob_id, offset, size)
//!
//! [BUCKETS: variable]
//!   - per bucket: id, name, then its blob-name -> blob_id entries
//! ```
//!
//! Writes are append-only; overwriting a name appends a new payload and
//! repoints the existing id, leaving the superseded bytes behind. The index
//! and bucket sections are rewritten on `sync()`.

use crate::model::{BlobId, BucketId, LockKind, ID_BYTES};
use crate::store::lock_table::LockTable;
use crate::store::{Blob, BlobStore};
use crate::{Error, Result, MAGIC, VERSION};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, trace};

const HEADER_SIZE: u64 = 64;

/// Index entry: 12-byte id + 8-byte offset + 4-byte size
const INDEX_ENTRY_SIZE: usize = ID_BYTES + 8 + 4;

/// Location of one compressed payload
#[derive(Clone, Debug)]
struct IndexEntry {
    offset: u64,
    size: u32,
}

/// Name bindings for one bucket
struct BucketState {
    name: String,
    names: HashMap<String, BlobId>,
}

/// A durable blob store backed by a single file
pub struct FileStore {
    path: std::path::PathBuf,
    node_id: u32,
    file: RwLock<File>,
    index: RwLock<HashMap<BlobId, IndexEntry>>,
    buckets: RwLock<HashMap<BucketId, BucketState>>,
    by_name: RwLock<HashMap<String, BucketId>>,
    write_offset: RwLock<u64>,
    next_unique: AtomicU64,
    locks: LockTable,
}

impl FileStore {
    /// Create a new store file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        let node_id: u32 = 1;
        let mut header = [0u8; HEADER_SIZE as usize];
        header[0..8].copy_from_slice(MAGIC);
        header[8..12].copy_from_slice(&VERSION.to_le_bytes());
        // flags, counts, offsets: 0
        header[48..56].copy_from_slice(&1u64.to_le_bytes()); // next_unique
        header[56..60].copy_from_slice(&node_id.to_le_bytes());
        file.write_all(&header)?;
        file.sync_all()?;

        info!(path = %path.display(), "Created store file");

        Ok(FileStore {
            path,
            node_id,
            file: RwLock::new(file),
            index: RwLock::new(HashMap::new()),
            buckets: RwLock::new(HashMap::new()),
            by_name: RwLock::new(HashMap::new()),
            write_offset: RwLock::new(HEADER_SIZE),
            next_unique: AtomicU64::new(1),
            locks: LockTable::new(),
        })
    }

    /// Open an existing store file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;

        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;

        if &header[0..8] != MAGIC {
            return Err(Error::InvalidFile("Invalid magic bytes".into()));
        }

        let version = u32::from_le_bytes(header[8..12].try_into().unwrap());
        if version != VERSION {
            return Err(Error::VersionMismatch {
                expected: VERSION,
                found: version,
            });
        }

        let blob_count = u64::from_le_bytes(header[16..24].try_into().unwrap());
        let index_offset = u64::from_le_bytes(header[24..32].try_into().unwrap());
        let bucket_offset = u64::from_le_bytes(header[32..40].try_into().unwrap());
        let bucket_count = u64::from_le_bytes(header[40..48].try_into().unwrap());
        let next_unique = u64::from_le_bytes(header[48..56].try_into().unwrap());
        let node_id = u32::from_le_bytes(header[56..60].try_into().unwrap());

        // Load the blob index
        let mut index = HashMap::new();
        if index_offset > 0 && blob_count > 0 {
            file.seek(SeekFrom::Start(index_offset))?;
            for _ in 0..blob_count {
                let mut entry_buf = [0u8; INDEX_ENTRY_SIZE];
                file.read_exact(&mut entry_buf)?;

                let id = BlobId::from_bytes(entry_buf[0..ID_BYTES].try_into().unwrap());
                let offset =
                    u64::from_le_bytes(entry_buf[ID_BYTES..ID_BYTES + 8].try_into().unwrap());
                let size = u32::from_le_bytes(
                    entry_buf[ID_BYTES + 8..INDEX_ENTRY_SIZE].try_into().unwrap(),
                );

                index.insert(id, IndexEntry { offset, size });
            }
        }

        // Load the bucket section
        let mut buckets = HashMap::new();
        let mut by_name = HashMap::new();
        if bucket_offset > 0 && bucket_count > 0 {
            file.seek(SeekFrom::Start(bucket_offset))?;
            for _ in 0..bucket_count {
                let bucket_id = read_id(&mut file).map(BucketId::from_bytes)?;
                let bucket_name = read_name(&mut file)?;

                let mut len_buf = [0u8; 8];
                file.read_exact(&mut len_buf)?;
                let entry_count = u64::from_le_bytes(len_buf);

                let mut names = HashMap::new();
                for _ in 0..entry_count {
                    let blob_id = read_id(&mut file).map(BlobId::from_bytes)?;
                    let blob_name = read_name(&mut file)?;
                    names.insert(blob_name, blob_id);
                }

                by_name.insert(bucket_name.clone(), bucket_id);
                buckets.insert(
                    bucket_id,
                    BucketState {
                        name: bucket_name,
                        names,
                    },
                );
            }
        }

        // Appends resume where the index was written
        let write_offset = if index_offset > 0 {
            index_offset
        } else {
            file.seek(SeekFrom::End(0))?
        };

        info!(
            path = %path.display(),
            blobs = index.len(),
            buckets = buckets.len(),
            "Opened store file"
        );

        Ok(FileStore {
            path,
            node_id,
            file: RwLock::new(file),
            index: RwLock::new(index),
            buckets: RwLock::new(buckets),
            by_name: RwLock::new(by_name),
            write_offset: RwLock::new(write_offset),
            next_unique: AtomicU64::new(next_unique),
            locks: LockTable::new(),
        })
    }

    /// Open or create a store file
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    fn alloc_unique(&self) -> u64 {
        self.next_unique.fetch_add(1, Ordering::Relaxed)
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of blobs in the store
    pub fn blob_count(&self) -> usize {
        self.index.read().len()
    }

    /// Flush the index and bucket sections to disk
    ///
    /// Lock order is buckets, index, offset, file throughout the store;
    /// by_name comes after buckets and index wherever they are co-held.
    fn write_out(&self) -> Result<()> {
        let buckets = self.buckets.read();
        let index = self.index.read();
        let write_offset = *self.write_offset.read();
        let mut file = self.file.write();

        let index_size = (index.len() * INDEX_ENTRY_SIZE) as u64;
        let bucket_offset = write_offset + index_size;

        // Header counts and offsets
        file.seek(SeekFrom::Start(16))?;
        file.write_all(&(index.len() as u64).to_le_bytes())?;
        file.write_all(&write_offset.to_le_bytes())?;
        file.write_all(&bucket_offset.to_le_bytes())?;
        file.write_all(&(buckets.len() as u64).to_le_bytes())?;
        file.write_all(&self.next_unique.load(Ordering::Relaxed).to_le_bytes())?;

        // Index, sorted by id for determinism
        file.seek(SeekFrom::Start(write_offset))?;
        let mut entries: Vec<_> = index.iter().collect();
        entries.sort_by_key(|(id, _)| (id.unique, id.node_id));

        for (id, entry) in entries {
            file.write_all(&id.to_bytes())?;
            file.write_all(&entry.offset.to_le_bytes())?;
            file.write_all(&entry.size.to_le_bytes())?;
        }

        // Bucket section, sorted by name
        let mut bucket_list: Vec<_> = buckets.iter().collect();
        bucket_list.sort_by_key(|(_, state)| state.name.clone());

        for (bucket_id, state) in bucket_list {
            file.write_all(&bucket_id.to_bytes())?;
            write_name(&mut file, &state.name)?;
            file.write_all(&(state.names.len() as u64).to_le_bytes())?;

            let mut name_list: Vec<_> = state.names.iter().collect();
            name_list.sort_by_key(|&(name, _)| name);
            for (name, blob_id) in name_list {
                file.write_all(&blob_id.to_bytes())?;
                write_name(&mut file, name)?;
            }
        }

        file.sync_all()?;
        Ok(())
    }
}

fn read_id(file: &mut File) -> Result<[u8; ID_BYTES]> {
    let mut buf = [0u8; ID_BYTES];
    file.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_name(file: &mut File) -> Result<String> {
    let mut len_buf = [0u8; 2];
    file.read_exact(&mut len_buf)?;
    let len = u16::from_le_bytes(len_buf) as usize;

    let mut name_buf = vec![0u8; len];
    file.read_exact(&mut name_buf)?;
    String::from_utf8(name_buf).map_err(|_| Error::InvalidFile("Non-UTF8 name".into()))
}

fn write_name(file: &mut File, name: &str) -> Result<()> {
    let bytes = name.as_bytes();
    file.write_all(&(bytes.len() as u16).to_le_bytes())?;
    file.write_all(bytes)?;
    Ok(())
}

impl BlobStore for FileStore {
    fn open_bucket(&self, name: &str) -> Result<BucketId> {
        if let Some(id) = self.by_name.read().get(name) {
            return Ok(*id);
        }

        // Lock order is buckets before by_name, same as destroy_bucket
        let mut buckets = self.buckets.write();
        let mut by_name = self.by_name.write();
        if let Some(id) = by_name.get(name) {
            return Ok(*id);
        }

        let id = BucketId::new(self.alloc_unique(), self.node_id);
        by_name.insert(name.to_string(), id);
        buckets.insert(
            id,
            BucketState {
                name: name.to_string(),
                names: HashMap::new(),
            },
        );
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
        let compressed = blob.compress()?;
        let size = compressed.len() as u32;

        let id = {
            let mut buckets = self.buckets.write();
            let state = buckets
                .get_mut(&bucket)
                .ok_or(Error::BucketNotFound(bucket))?;
            match state.names.get(name) {
                Some(existing) => *existing,
                None => {
                    let id = BlobId::new(self.alloc_unique(), self.node_id);
                    state.names.insert(name.to_string(), id);
                    id
                }
            }
        };

        let offset = {
            let mut write_offset = self.write_offset.write();
            let offset = *write_offset;

            let mut file = self.file.write();
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(&compressed)?;

            *write_offset = offset + size as u64;
            offset
        };

        self.index.write().insert(id, IndexEntry { offset, size });
        trace!(blob = name, id = %id, size, "Put blob");
        Ok(id)
    }

    fn get(&self, bucket: BucketId, id: BlobId) -> Result<Blob> {
        if id.is_null() {
            return Err(Error::BlobNotFound(id));
        }
        if !self.buckets.read().contains_key(&bucket) {
            return Err(Error::BucketNotFound(bucket));
        }

        let entry = {
            let index = self.index.read();
            index.get(&id).cloned()
        };
        let entry = entry.ok_or(Error::BlobNotFound(id))?;

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(entry.offset))?;

        let mut data = vec![0u8; entry.size as usize];
        file.read_exact(&mut data)?;

        Blob::decompress(&data)
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
        if self.index.write().remove(&id).is_some() {
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

    fn sync(&self) -> Result<()> {
        self.write_out()
    }

    fn destroy_bucket(&self, bucket: BucketId) -> Result<()> {
        let mut buckets = self.buckets.write();
        if let Some(state) = buckets.remove(&bucket) {
            let mut index = self.index.write();
            for blob_id in state.names.values() {
                index.remove(blob_id);
            }
            self.by_name.write().remove(&state.name);
            self.locks.forget_bucket(bucket);
            debug!(bucket = %state.name, "Destroyed bucket");
        }
        Ok(())
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        // Best-effort flush on drop
        let _ = self.write_out();
    }
}
