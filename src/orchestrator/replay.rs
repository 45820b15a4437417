//! Ledger replay.
//!
//! Replay re-derives a session's final state from the accepted commands in a
//! ledger and checks it against the digest the ledger claims. A broken chain
//! and a digest mismatch are reported as distinct failures: the first means
//! the records were altered, the second that the records and the state they
//! claim disagree.

use crate::audit::AuditLedger;
use crate::core::{reduce, Digest, DigestError, SessionState, State};
use thiserror::Error;

#[derive(Clone, PartialEq, Debug, Error)]
pub enum ReplayFailure {
    #[error("chain integrity failure at record {index}: {reason}")]
    ChainIntegrity { index: usize, reason: String },

    #[error("state digest mismatch after replay: ledger claims {expected}, replay produced {actual}")]
    DigestMismatch { expected: Digest, actual: Digest },

    #[error("replayed state could not be hashed: {0}")]
    Digest(#[from] DigestError),
}

/// Outcome of replaying a ledger.
#[derive(Clone, PartialEq, Debug)]
pub struct ReplayResult {
    pub succeeded: bool,

    /// State after re-applying every accepted command; the initial state when
    /// the chain itself is broken.
    pub final_state: SessionState,

    /// Final digest the ledger claims
    pub expected_digest: Option<Digest>,

    /// Digest of `final_state`
    pub actual_digest: Option<Digest>,

    pub failure: Option<ReplayFailure>,
}

impl ReplayResult {
    fn success(final_state: SessionState, digest: Digest) -> Self {
        Self {
            succeeded: true,
            final_state,
            expected_digest: Some(digest.clone()),
            actual_digest: Some(digest),
            failure: None,
        }
    }

    fn failure(
        final_state: SessionState,
        expected_digest: Option<Digest>,
        actual_digest: Option<Digest>,
        failure: ReplayFailure,
    ) -> Self {
        Self {
            succeeded: false,
            final_state,
            expected_digest,
            actual_digest,
            failure: Some(failure),
        }
    }

    /// Human-readable failure reason, if any.
    pub fn reason(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }

    pub fn into_result(self) -> Result<SessionState, ReplayFailure> {
        match self.failure {
            None => Ok(self.final_state),
            Some(failure) => Err(failure),
        }
    }
}

/// Verify `ledger`, then rebuild its final state from a fresh initial state.
///
/// Rejected records are skipped; they never changed state. An empty ledger
/// replays to the initial state.
pub fn replay(ledger: &AuditLedger) -> ReplayResult {
    let verification = ledger.verify();
    if let Some(index) = verification.broken_at_index {
        let failure = ReplayFailure::ChainIntegrity {
            index,
            reason: verification.reason.unwrap_or_default(),
        };
        tracing::error!(index, error = %failure, "audit chain broken");
        return ReplayResult::failure(
            SessionState::initial(),
            ledger.current_state_digest().cloned(),
            None,
            failure,
        );
    }

    let final_state = ledger
        .accepted_commands()
        .fold(SessionState::initial(), |state, (command, _)| {
            reduce(&state, command).new_state
        });

    let actual = match final_state.digest() {
        Ok(digest) => digest,
        Err(e) => {
            let failure = ReplayFailure::from(e);
            tracing::error!(error = %failure, "replay failed");
            return ReplayResult::failure(
                final_state,
                ledger.current_state_digest().cloned(),
                None,
                failure,
            );
        }
    };

    match ledger.current_state_digest() {
        Some(expected) if *expected != actual => {
            let failure = ReplayFailure::DigestMismatch {
                expected: expected.clone(),
                actual: actual.clone(),
            };
            tracing::error!(
                expected = %expected,
                actual = %actual,
                records = ledger.len(),
                "replay diverged from ledger"
            );
            ReplayResult::failure(final_state, Some(expected.clone()), Some(actual), failure)
        }
        _ => ReplayResult::success(final_state, actual),
    }
}
