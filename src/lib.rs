//! GCS Session: a deterministic, audited state core for one vehicle session
//!
//! The session is split into a pure core and an imperative shell. The core
//! is a closed command vocabulary, an immutable session state and a reducer
//! that enforces the vehicle's safety interlocks without side effects. The
//! shell is an orchestrator that serializes dispatch, records every command
//! in a hash-chained audit ledger and publishes each new state.
//!
//! # Core Concepts
//!
//! - **Command**: Every request to change the session, tagged with a caller correlation id
//! - **Reducer**: Total, pure `(state, command) -> outcome`; rejections leave state untouched
//! - **Audit ledger**: One linked record per dispatch, verifiable and replayable
//! - **Orchestrator**: The single writer; time and ids come from injected collaborators
//!
//! # Example
//!
//! ```rust
//! use gcs_session::core::{Command, LinkStatus};
//! use gcs_session::orchestrator::{ManualClock, Orchestrator, SequentialIdGenerator};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! # let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # runtime.block_on(async {
//! let session = Orchestrator::new(
//!     Arc::new(ManualClock::default()),
//!     Arc::new(SequentialIdGenerator::new()),
//! ).unwrap();
//!
//! let outcome = session
//!     .dispatch(Command::Arm { correlation_id: Uuid::from_u128(1) }, "operator-ui")
//!     .await
//!     .unwrap();
//! assert!(!outcome.applied);
//! assert!(outcome.rationale.contains("not connected"));
//!
//! let ledger = session.ledger().await;
//! assert!(ledger.verify().is_valid);
//! assert!(session.replay(&ledger).succeeded);
//! assert_eq!(session.current_state().await.link, LinkStatus::Disconnected);
//! # });
//! ```

pub mod audit;
pub mod checkpoint;
pub mod core;
pub mod orchestrator;

// Re-export commonly used types
pub use audit::{AuditLedger, AuditRecord, ChainVerification};
pub use core::{reduce, Command, Outcome, SessionState, State};
pub use orchestrator::{Orchestrator, ReplayResult};
