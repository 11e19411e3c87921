//! Record type - a field-name to value mapping, persisted as one blob
//!
//! Fields are kept in a BTreeMap so the encoded form of a record is
//! deterministic regardless of insertion order.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed field payload
///
/// Values carry their type tag through serialization, so reading a field as
/// the wrong type fails with a `TypeMismatch` instead of misinterpreting the
/// bytes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Opaque bytes
    Bytes(Vec<u8>),
    /// UTF-8 text
    Text(String),
    /// Signed integer
    Int(i64),
    /// Double-precision float
    Float(f64),
    /// Boolean
    Bool(bool),
}

impl FieldValue {
    /// Name of the stored type, used in mismatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Bytes(_) => "bytes",
            FieldValue::Text(_) => "text",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Bool(_) => "bool",
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            FieldValue::Bytes(b) => Ok(b),
            other => Err(mismatch("bytes", other)),
        }
    }

    pub fn as_text(&self) -> Result<&str> {
        match self {
            FieldValue::Text(s) => Ok(s),
            other => Err(mismatch("text", other)),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            FieldValue::Int(v) => Ok(*v),
            other => Err(mismatch("int", other)),
        }
    }

    pub fn as_float(&self) -> Result<f64> {
        match self {
            FieldValue::Float(v) => Ok(*v),
            other => Err(mismatch("float", other)),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            FieldValue::Bool(v) => Ok(*v),
            other => Err(mismatch("bool", other)),
        }
    }
}

fn mismatch(expected: &'static str, found: &FieldValue) -> Error {
    Error::TypeMismatch {
        expected,
        found: found.type_name(),
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(b: Vec<u8>) -> Self {
        FieldValue::Bytes(b)
    }
}

impl From<&[u8]> for FieldValue {
    fn from(b: &[u8]) -> Self {
        FieldValue::Bytes(b.to_vec())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

/// A record - the unit a table stores under each key
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Record {
            fields: BTreeMap::new(),
        }
    }

    /// Set a field, replacing any previous value under the same name
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Builder-style variant of [`set`](Self::set)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    /// Merge another record into this one
    ///
    /// Union of the two field sets; on duplicate names the value from
    /// `updates` wins. Never drops a field.
    pub fn merge(&mut self, updates: Record) {
        self.fields.extend(updates.fields);
    }

    /// Filter down to the named fields
    ///
    /// Names absent from the record are silently omitted from the result.
    pub fn project(&self, names: &[&str]) -> Record {
        let fields = names
            .iter()
            .filter_map(|name| {
                self.fields
                    .get(*name)
                    .map(|v| ((*name).to_string(), v.clone()))
            })
            .collect();
        Record { fields }
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, FieldValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
