//! Advisory lock kinds
//!
//! Locks come in two independent domains: internal kinds are reserved for a
//! store's own housekeeping, external kinds are taken by callers around
//! record operations. Within a domain, writes are exclusive and reads are
//! shared.

use serde::{Deserialize, Serialize};

/// Kind of advisory lock taken on a blob
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockKind {
    /// Shared lock for the store's own housekeeping
    InternalRead,
    /// Exclusive lock for the store's own housekeeping
    InternalWrite,
    /// Shared lock taken by callers
    ExternalRead,
    /// Exclusive lock taken by callers
    ExternalWrite,
}

impl LockKind {
    pub fn as_byte(&self) -> u8 {
        match self {
            LockKind::InternalRead => 0,
            LockKind::InternalWrite => 1,
            LockKind::ExternalRead => 2,
            LockKind::ExternalWrite => 3,
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(LockKind::InternalRead),
            1 => Some(LockKind::InternalWrite),
            2 => Some(LockKind::ExternalRead),
            3 => Some(LockKind::ExternalWrite),
            _ => None,
        }
    }

    /// Whether this kind excludes all other holders in its domain
    pub fn is_write(&self) -> bool {
        matches!(self, LockKind::InternalWrite | LockKind::ExternalWrite)
    }

    /// Whether this kind belongs to the caller-facing domain
    pub fn is_external(&self) -> bool {
        matches!(self, LockKind::ExternalRead | LockKind::ExternalWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_roundtrip() {
        for kind in [
            LockKind::InternalRead,
            LockKind::InternalWrite,
            LockKind::ExternalRead,
            LockKind::ExternalWrite,
        ] {
            assert_eq!(LockKind::from_byte(kind.as_byte()), Some(kind));
        }
        assert_eq!(LockKind::from_byte(9), None);
    }

    #[test]
    fn test_classification() {
        assert!(LockKind::ExternalWrite.is_write());
        assert!(LockKind::ExternalWrite.is_external());
        assert!(!LockKind::ExternalRead.is_write());
        assert!(!LockKind::InternalWrite.is_external());
    }
}
