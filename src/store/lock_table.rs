//! Advisory per-blob lock table
//!
//! Tracks lock state for every (bucket, blob) pair that currently has
//! holders. The internal and external kinds form independent domains; within
//! a domain reads are shared and writes are exclusive. Acquisition blocks on
//! a condvar until the requested kind is grantable.

use crate::model::{BlobId, BucketId, LockKind};
use crate::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;

/// Holder counts for one blob
#[derive(Default)]
struct LockState {
    internal_readers: usize,
    internal_writer: bool,
    external_readers: usize,
    external_writer: bool,
}

impl LockState {
    fn is_idle(&self) -> bool {
        self.internal_readers == 0
            && !self.internal_writer
            && self.external_readers == 0
            && !self.external_writer
    }

    fn grantable(&self, kind: LockKind) -> bool {
        match kind {
            LockKind::InternalRead => !self.internal_writer,
            LockKind::InternalWrite => !self.internal_writer && self.internal_readers == 0,
            LockKind::ExternalRead => !self.external_writer,
            LockKind::ExternalWrite => !self.external_writer && self.external_readers == 0,
        }
    }

    fn grant(&mut self, kind: LockKind) {
        match kind {
            LockKind::InternalRead => self.internal_readers += 1,
            LockKind::InternalWrite => self.internal_writer = true,
            LockKind::ExternalRead => self.external_readers += 1,
            LockKind::ExternalWrite => self.external_writer = true,
        }
    }

    /// Returns false if the kind was not actually held
    fn release(&mut self, kind: LockKind) -> bool {
        match kind {
            LockKind::InternalRead => {
                if self.internal_readers == 0 {
                    return false;
                }
                self.internal_readers -= 1;
                true
            }
            LockKind::InternalWrite => std::mem::replace(&mut self.internal_writer, false),
            LockKind::ExternalRead => {
                if self.external_readers == 0 {
                    return false;
                }
                self.external_readers -= 1;
                true
            }
            LockKind::ExternalWrite => std::mem::replace(&mut self.external_writer, false),
        }
    }
}

/// Advisory lock table shared by the in-crate store backends
pub struct LockTable {
    states: Mutex<HashMap<(BucketId, BlobId), LockState>>,
    released: Condvar,
}

impl Default for LockTable {
    fn default() -> Self {
        Self::new()
    }
}

impl LockTable {
    pub fn new() -> Self {
        LockTable {
            states: Mutex::new(HashMap::new()),
            released: Condvar::new(),
        }
    }

    /// Block until `kind` can be granted on the blob
    pub fn lock(&self, bucket: BucketId, blob: BlobId, kind: LockKind) {
        let key = (bucket, blob);
        let mut states = self.states.lock();
        loop {
            let state = states.entry(key).or_default();
            if state.grantable(kind) {
                state.grant(kind);
                return;
            }
            self.released.wait(&mut states);
        }
    }

    /// Release a previously granted lock
    ///
    /// Unlocking a kind that is not held is a caller bug and is reported,
    /// not masked.
    pub fn unlock(&self, bucket: BucketId, blob: BlobId, kind: LockKind) -> Result<()> {
        let key = (bucket, blob);
        let mut states = self.states.lock();

        let state = states
            .get_mut(&key)
            .ok_or(Error::LockNotHeld { blob, kind })?;
        if !state.release(kind) {
            return Err(Error::LockNotHeld { blob, kind });
        }
        if state.is_idle() {
            states.remove(&key);
        }
        drop(states);

        self.released.notify_all();
        Ok(())
    }

    /// Drop all lock state for a bucket
    ///
    /// Called when the bucket itself is destroyed; any identifiers it issued
    /// are dead afterwards.
    pub fn forget_bucket(&self, bucket: BucketId) {
        let mut states = self.states.lock();
        states.retain(|(bkt, _), _| *bkt != bucket);
        drop(states);

        self.released.notify_all();
    }

    /// Number of blobs that currently have holders
    #[cfg(test)]
    fn held_count(&self) -> usize {
        self.states.lock().len()
    }
}
