//! Record codec - converts a whole record to and from one opaque blob
//!
//! Layout: a single format-tag byte followed by the bincode payload. Fields
//! are encoded in name order (the record's map is ordered), so the same
//! record always produces the same bytes.

use crate::model::Record;
use crate::store::Blob;
use crate::{Error, Result};

/// Format tag prefixed to every encoded record
const RECORD_TAG: u8 = 1;

/// Encode a record into a single blob
///
/// Fails with [`Error::Encode`] if any field value cannot be serialized;
/// nothing is ever silently dropped.
pub fn encode(record: &Record) -> Result<Blob> {
    let payload = bincode::serialize(record).map_err(Error::Encode)?;
    let mut data = Vec::with_capacity(1 + payload.len());
    data.push(RECORD_TAG);
    data.extend(payload);
    Ok(Blob::from(data))
}

/// Decode a record from a blob produced by [`encode`]
///
/// Fails with [`Error::Corruption`] if the blob is empty or carries an
/// unknown format tag, and with [`Error::Decode`] on malformed or truncated
/// payloads.
pub fn decode(blob: &Blob) -> Result<Record> {
    let data = blob.as_slice();
    if data.is_empty() {
        return Err(Error::Corruption("Empty record blob".into()));
    }
    if data[0] != RECORD_TAG {
        return Err(Error::Corruption(format!(
            "Unknown record format tag: {}",
            data[0]
        )));
    }
    bincode::deserialize(&data[1..]).map_err(Error::Decode)
}
