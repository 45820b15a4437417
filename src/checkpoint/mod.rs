//! Durable form of an audit ledger.
//!
//! A checkpoint wraps a ledger in a versioned envelope that encodes either as
//! JSON, for readability, or as bincode, for compactness. Both encodings
//! reproduce every record and digest string exactly, so a decoded ledger
//! verifies and replays the same way the original did.

use crate::audit::AuditLedger;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Encoding used when persisting or transmitting a ledger.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerFormat {
    #[default]
    Json,
    Binary,
}

/// Serializable snapshot of a session's audit ledger.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct LedgerCheckpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: Uuid,

    /// When the checkpoint was taken
    pub timestamp: DateTime<Utc>,

    pub ledger: AuditLedger,
}

impl LedgerCheckpoint {
    pub fn new(id: Uuid, timestamp: DateTime<Utc>, ledger: AuditLedger) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id,
            timestamp,
            ledger,
        }
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self).map_err(|e| CheckpointError::Encode(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self =
            serde_json::from_str(json).map_err(|e| CheckpointError::Decode(e.to_string()))?;
        checkpoint.check_version()
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::Encode(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self =
            bincode::deserialize(bytes).map_err(|e| CheckpointError::Decode(e.to_string()))?;
        checkpoint.check_version()
    }

    pub fn encode(&self, format: LedgerFormat) -> Result<Vec<u8>, CheckpointError> {
        match format {
            LedgerFormat::Json => self.to_json().map(String::into_bytes),
            LedgerFormat::Binary => self.to_binary(),
        }
    }

    pub fn decode(bytes: &[u8], format: LedgerFormat) -> Result<Self, CheckpointError> {
        match format {
            LedgerFormat::Json => {
                let json =
                    std::str::from_utf8(bytes).map_err(|e| CheckpointError::Decode(e.to_string()))?;
                Self::from_json(json)
            }
            LedgerFormat::Binary => Self::from_binary(bytes),
        }
    }

    /// Decode and reject checkpoints whose ledger chain is broken.
    pub fn decode_verified(bytes: &[u8], format: LedgerFormat) -> Result<Self, CheckpointError> {
        let checkpoint = Self::decode(bytes, format)?;
        let verification = checkpoint.ledger.verify();
        match verification.broken_at_index {
            None => Ok(checkpoint),
            Some(index) => Err(CheckpointError::BrokenChain {
                index,
                reason: verification.reason.unwrap_or_default(),
            }),
        }
    }

    fn check_version(self) -> Result<Self, CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(self)
    }
}
