//! Ledger checkpoint errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The ledger could not be encoded as JSON or bincode
    #[error("Failed to encode ledger checkpoint: {0}")]
    Encode(String),

    /// The bytes are not a ledger checkpoint in the requested format
    #[error("Failed to decode ledger checkpoint: {0}")]
    Decode(String),

    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The embedded ledger's hash chain is broken
    #[error("Checkpoint ledger broken at record {index}: {reason}")]
    BrokenChain { index: usize, reason: String },
}
