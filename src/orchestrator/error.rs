//! Session-level errors.
//!
//! Command rejection is not an error; it is an `Outcome` with `applied`
//! false. These cover the faults that stop an operation outright.

use super::replay::ReplayFailure;
use crate::checkpoint::CheckpointError;
use crate::core::DigestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Digest(#[from] DigestError),

    /// A persisted ledger did not replay cleanly and cannot seed a session
    #[error("Cannot resume session: {0}")]
    Resume(#[from] ReplayFailure),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}
