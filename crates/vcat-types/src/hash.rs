use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Names one commit in a commit log.
///
/// Commit hashes are 32-byte digests computed over a commit's parent, its
/// operations and its metadata. Two commits with the same hash are the same
/// commit. Text forms are lowercase hex; logs use the 8-character prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommitHash([u8; 32]);

impl CommitHash {
    /// Parent of every root commit. Branches of a fresh repository point
    /// here, it lists no keys, and no log ever stores a commit under it.
    pub const NO_ANCESTOR: Self = Self([0u8; 32]);

    pub fn from_hash(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    pub fn is_no_ancestor(&self) -> bool {
        *self == Self::NO_ANCESTOR
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// All 64 hex digits.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex digits, for log fields.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse the 64-digit form produced by [`CommitHash::to_hex`].
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let decoded = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let digest: [u8; 32] = decoded
            .try_into()
            .map_err(|rejected: Vec<u8>| TypeError::InvalidLength {
                expected: 32,
                actual: rejected.len(),
            })?;
        Ok(Self(digest))
    }
}

impl fmt::Debug for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CommitHash").field(&self.short_hex()).finish()
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for CommitHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for CommitHash {
    fn from(digest: [u8; 32]) -> Self {
        Self(digest)
    }
}
