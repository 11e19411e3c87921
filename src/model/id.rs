//! Opaque identifiers for blobs and buckets
//!
//! An identifier pairs a monotonically assigned unique value with the id of
//! the node that issued it. The all-zero identifier is the null sentinel:
//! a key whose blob id is null has never been written.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Serialized width of an identifier: 8 bytes unique + 4 bytes node id
pub const ID_BYTES: usize = 12;

/// Identifier for a blob within a bucket
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobId {
    /// Monotonically assigned unique value; 0 is reserved for null
    pub unique: u64,
    /// Node that issued the identifier
    pub node_id: u32,
}

impl BlobId {
    /// The null identifier (not yet assigned)
    pub const NULL: BlobId = BlobId {
        unique: 0,
        node_id: 0,
    };

    pub fn new(unique: u64, node_id: u32) -> Self {
        BlobId { unique, node_id }
    }

    /// Whether this identifier has been assigned
    pub fn is_null(&self) -> bool {
        self.unique == 0 && self.node_id == 0
    }

    /// Fixed-width little-endian form for on-disk indexes
    pub fn to_bytes(&self) -> [u8; ID_BYTES] {
        let mut buf = [0u8; ID_BYTES];
        buf[0..8].copy_from_slice(&self.unique.to_le_bytes());
        buf[8..12].copy_from_slice(&self.node_id.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: [u8; ID_BYTES]) -> Self {
        BlobId {
            unique: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            node_id: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
        }
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.unique, self.node_id)
    }
}

impl fmt::Debug for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobId({}.{})", self.unique, self.node_id)
    }
}

impl Default for BlobId {
    fn default() -> Self {
        BlobId::NULL
    }
}

/// Identifier for a bucket (a named container of blobs)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketId {
    /// Monotonically assigned unique value; 0 is reserved for null
    pub unique: u64,
    /// Node that issued the identifier
    pub node_id: u32,
}

impl BucketId {
    /// The null identifier (not yet assigned)
    pub const NULL: BucketId = BucketId {
        unique: 0,
        node_id: 0,
    };

    pub fn new(unique: u64, node_id: u32) -> Self {
        BucketId { unique, node_id }
    }

    /// Whether this identifier has been assigned
    pub fn is_null(&self) -> bool {
        self.unique == 0 && self.node_id == 0
    }

    /// Fixed-width little-endian form for on-disk indexes
    pub fn to_bytes(&self) -> [u8; ID_BYTES] {
        let mut buf = [0u8; ID_BYTES];
        buf[0..8].copy_from_slice(&self.unique.to_le_bytes());
        buf[8..12].copy_from_slice(&self.node_id.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: [u8; ID_BYTES]) -> Self {
        BucketId {
            unique: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            node_id: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
        }
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.unique, self.node_id)
    }
}

impl fmt::Debug for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BucketId({}.{})", self.unique, self.node_id)
    }
}

impl Default for BucketId {
    fn default() -> Self {
        BucketId::NULL
    }
}
