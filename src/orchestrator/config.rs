//! Orchestrator configuration.

use crate::checkpoint::LedgerFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BROADCAST_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid orchestrator config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables for an [`Orchestrator`](super::Orchestrator).
///
/// Every field has a default, so an empty TOML document is a valid config.
///
/// ```rust
/// use gcs_session::checkpoint::LedgerFormat;
/// use gcs_session::orchestrator::OrchestratorConfig;
///
/// let config = OrchestratorConfig::from_toml_str(r#"
///     broadcast_capacity = 16
///     ledger_format = "binary"
/// "#).unwrap();
///
/// assert_eq!(config.broadcast_capacity, 16);
/// assert_eq!(config.ledger_format, LedgerFormat::Binary);
/// ```
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Buffered state updates per subscriber before it starts lagging
    pub broadcast_capacity: usize,

    /// Encoding used by `Orchestrator::checkpoint`
    pub ledger_format: LedgerFormat,
}

impl OrchestratorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Channel capacity actually used; the broadcast channel needs at least one slot.
    pub fn effective_capacity(&self) -> usize {
        self.broadcast_capacity.max(1)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
            ledger_format: LedgerFormat::Json,
        }
    }
}
