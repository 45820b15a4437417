//! The session orchestrator.
//!
//! The orchestrator is the only owner of the live session state and its
//! audit ledger. Every dispatch runs its read, reduce, append and publish
//! steps under one lock, so concurrent producers see a single total order.

use super::clock::{Clock, IdGenerator};
use super::config::OrchestratorConfig;
use super::error::SessionError;
use super::replay::{replay, ReplayResult};
use super::subscription::StateSubscription;
use crate::audit::{AuditLedger, ChainVerification, RecordEntry};
use crate::checkpoint::LedgerCheckpoint;
use crate::core::{reduce, Command, Outcome, SessionState, State};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

struct Session {
    state: SessionState,
    ledger: AuditLedger,
}

/// Serialized entry point for every state change in a session.
///
/// # Example
///
/// ```rust
/// use gcs_session::core::{Command, ConnectionConfig, LinkStatus};
/// use gcs_session::orchestrator::{ManualClock, Orchestrator, SequentialIdGenerator};
/// use std::sync::Arc;
/// use uuid::Uuid;
///
/// # let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// # runtime.block_on(async {
/// let orchestrator = Orchestrator::new(
///     Arc::new(ManualClock::default()),
///     Arc::new(SequentialIdGenerator::new()),
/// ).unwrap();
///
/// let outcome = orchestrator.dispatch(
///     Command::Connect {
///         config: ConnectionConfig { host: "10.0.0.1".into(), port: 14550 },
///         correlation_id: Uuid::from_u128(7),
///     },
///     "operator-ui",
/// ).await.unwrap();
///
/// assert!(outcome.applied);
/// assert_eq!(orchestrator.current_state().await.link, LinkStatus::Connecting);
/// assert_eq!(orchestrator.ledger().await.len(), 2);
/// # });
/// ```
pub struct Orchestrator {
    session: Mutex<Session>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    updates: broadcast::Sender<SessionState>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Start a fresh session with the default configuration.
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Result<Self, SessionError> {
        Self::with_config(OrchestratorConfig::default(), clock, ids)
    }

    /// Start a fresh session: record the genesis entry and publish the
    /// initial state.
    pub fn with_config(
        config: OrchestratorConfig,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self, SessionError> {
        let state = SessionState::initial();
        let ledger = AuditLedger::genesis(ids.next_id(), clock.now(), state.digest()?);
        tracing::info!(
            state = state.name(),
            capacity = config.effective_capacity(),
            "session started"
        );
        Ok(Self::assemble(state, ledger, config, clock, ids))
    }

    /// Rebuild a session from a persisted ledger.
    ///
    /// The ledger is replayed first; a broken chain or a digest mismatch
    /// refuses the resume. New records continue the existing chain.
    pub fn resume(
        ledger: AuditLedger,
        config: OrchestratorConfig,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self, SessionError> {
        if ledger.is_empty() {
            return Self::with_config(config, clock, ids);
        }

        let state = replay(&ledger).into_result()?;
        tracing::info!(
            records = ledger.len(),
            state = state.name(),
            "session resumed from ledger"
        );
        Ok(Self::assemble(state, ledger, config, clock, ids))
    }

    /// Decode a checkpoint produced by [`Orchestrator::checkpoint`] and resume from it.
    pub fn restore(
        bytes: &[u8],
        config: OrchestratorConfig,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self, SessionError> {
        let checkpoint = LedgerCheckpoint::decode_verified(bytes, config.ledger_format)?;
        Self::resume(checkpoint.ledger, config, clock, ids)
    }

    fn assemble(
        state: SessionState,
        ledger: AuditLedger,
        config: OrchestratorConfig,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let (updates, _) = broadcast::channel(config.effective_capacity());
        // No receivers yet; subscribers pick the initial state up from their snapshot.
        let _ = updates.send(state.clone());
        Self {
            session: Mutex::new(Session { state, ledger }),
            clock,
            ids,
            updates,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Apply `command` on behalf of `source_id`.
    ///
    /// Exactly one audit record is appended and one state is published per
    /// call, whether the command is accepted or rejected. The only error is a
    /// hashing failure, raised before anything is committed.
    pub async fn dispatch(
        &self,
        command: Command,
        source_id: impl Into<String>,
    ) -> Result<Outcome<SessionState>, SessionError> {
        let source_id = source_id.into();
        let mut session = self.session.lock().await;

        let digest_before = session.state.digest()?;
        let outcome = reduce(&session.state, &command);

        let correlation_id = command.correlation_id();
        let label = command.to_string();
        let high_risk = command.is_high_risk();

        let entry = if outcome.applied {
            RecordEntry::Accepted {
                command,
                source_id: source_id.clone(),
                digest_before,
                digest_after: outcome.new_state.digest()?,
                rationale: outcome.rationale.clone(),
            }
        } else {
            RecordEntry::Rejected {
                command,
                source_id: source_id.clone(),
                state_digest: digest_before,
                rationale: outcome.rationale.clone(),
            }
        };
        session
            .ledger
            .append(self.ids.next_id(), self.clock.now(), entry)?;
        session.state = outcome.new_state.clone();

        if outcome.applied {
            tracing::debug!(
                %correlation_id,
                source = %source_id,
                command = %label,
                high_risk,
                rationale = %outcome.rationale,
                "command accepted"
            );
        } else {
            tracing::info!(
                %correlation_id,
                source = %source_id,
                command = %label,
                high_risk,
                rationale = %outcome.rationale,
                "command rejected"
            );
        }

        // Sending fails only when nobody is subscribed.
        let _ = self.updates.send(session.state.clone());

        Ok(outcome)
    }

    /// Observe the session: the current state first, then every dispatch.
    pub async fn subscribe(&self) -> StateSubscription {
        let session = self.session.lock().await;
        StateSubscription::new(session.state.clone(), self.updates.subscribe())
    }

    pub async fn current_state(&self) -> SessionState {
        self.session.lock().await.state.clone()
    }

    /// Snapshot of the ledger; later dispatches do not affect it.
    pub async fn ledger(&self) -> AuditLedger {
        self.session.lock().await.ledger.clone()
    }

    /// Check the hash chain of this session's ledger.
    pub async fn verify(&self) -> ChainVerification {
        let verification = self.session.lock().await.ledger.verify();
        if let (Some(index), Some(reason)) = (verification.broken_at_index, &verification.reason) {
            tracing::error!(index, reason = %reason, "session ledger chain broken");
        }
        verification
    }

    /// Replay any ledger against a fresh initial state.
    pub fn replay(&self, ledger: &AuditLedger) -> ReplayResult {
        replay(ledger)
    }

    /// Replay this session's own ledger.
    pub async fn replay_current(&self) -> ReplayResult {
        let ledger = self.ledger().await;
        replay(&ledger)
    }

    /// Encode the ledger in the configured format.
    pub async fn checkpoint(&self) -> Result<Vec<u8>, SessionError> {
        let ledger = self.ledger().await;
        let checkpoint = LedgerCheckpoint::new(self.ids.next_id(), self.clock.now(), ledger);
        Ok(checkpoint.encode(self.config.ledger_format)?)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("subscribers", &self.updates.receiver_count())
            .finish_non_exhaustive()
    }
}
