//! Blob type - an owned, contiguous byte payload
//!
//! Ownership of the bytes is exclusive to whichever layer last received the
//! blob: the store on a put, the caller on a get. `Bytes` makes that
//! hand-off a cheap reference-count bump.

use crate::{Error, Result};
use bytes::Bytes;

/// An opaque byte payload stored under an identifier
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    data: Bytes,
}

impl Blob {
    /// Create a blob from owned bytes
    pub fn new(data: impl Into<Bytes>) -> Self {
        Blob { data: data.into() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Take the payload out of the blob
    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Compress the payload for storage
    pub fn compress(&self) -> Result<Vec<u8>> {
        Ok(zstd::encode_all(self.as_slice(), 3)?)
    }

    /// Decompress a payload read back from storage
    pub fn decompress(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::Corruption("Empty blob data".into()));
        }
        let decompressed = zstd::decode_all(data)?;
        Ok(Blob::new(decompressed))
    }
}

impl From<Vec<u8>> for Blob {
    fn from(data: Vec<u8>) -> Self {
        Blob::new(data)
    }
}

impl From<&[u8]> for Blob {
    fn from(data: &[u8]) -> Self {
        Blob::new(Bytes::copy_from_slice(data))
    }
}

impl From<Bytes> for Blob {
    fn from(data: Bytes) -> Self {
        Blob::new(data)
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_roundtrip() {
        let original = Blob::from(b"hello world hello world hello world".as_slice());
        let compressed = original.compress().unwrap();
        let restored = Blob::decompress(&compressed).unwrap();

        assert_eq!(original, restored);
    }

    #[test]
    fn test_decompress_empty_fails() {
        assert!(Blob::decompress(&[]).is_err());
    }

    #[test]
    fn test_cheap_clone_shares_payload() {
        let blob = Blob::from(vec![7u8; 64]);
        let copy = blob.clone();
        assert_eq!(blob.as_slice().as_ptr(), copy.as_slice().as_ptr());
    }
}
