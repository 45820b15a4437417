//! Content digests for states and audit records.
//!
//! A digest is the BLAKE3 hash of a value's `serde_json` encoding, rendered as
//! 64 lowercase hex characters. Struct fields serialize in declaration order, so
//! equal values always produce equal digests.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while computing a digest.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DigestError {
    #[error("Failed to encode value for hashing: {0}")]
    Encoding(String),
}

/// A 256-bit hex-encoded content digest.
///
/// # Example
///
/// ```rust
/// use gcs_session::core::Digest;
///
/// let a = Digest::of(&("connect", 14550)).unwrap();
/// let b = Digest::of(&("connect", 14550)).unwrap();
/// let c = Digest::of(&("connect", 14551)).unwrap();
///
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// assert_eq!(a.as_str().len(), 64);
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Hash the canonical encoding of `value`.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Self, DigestError> {
        let encoded =
            serde_json::to_vec(value).map_err(|e| DigestError::Encoding(e.to_string()))?;
        Ok(Self(hex::encode(blake3::hash(&encoded).as_bytes())))
    }

    /// Wrap an existing hex string, e.g. one read back from storage.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
