//! The imperative shell around the pure reducer.
//!
//! The orchestrator owns the live state and ledger, stamps records with
//! injected time and identifiers, fans new states out to subscribers and
//! replays ledgers to prove they match what was dispatched.

mod clock;
mod config;
mod error;
mod replay;
mod session;
mod subscription;

pub use clock::{
    Clock, IdGenerator, ManualClock, RandomIdGenerator, SequentialIdGenerator, SystemClock,
};
pub use config::{ConfigError, OrchestratorConfig, DEFAULT_BROADCAST_CAPACITY};
pub use error::SessionError;
pub use replay::{replay, ReplayFailure, ReplayResult};
pub use session::Orchestrator;
pub use subscription::StateSubscription;
