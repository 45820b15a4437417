//! Audit records.

use crate::core::{Command, Digest, DigestError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a record describes.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordEntry {
    /// Genesis record: the digest of the state the session started from.
    Initialization { state_digest: Digest },
    Accepted {
        command: Command,
        source_id: String,
        digest_before: Digest,
        digest_after: Digest,
        rationale: String,
    },
    /// The state digest is both before and after; rejection changes nothing.
    Rejected {
        command: Command,
        source_id: String,
        state_digest: Digest,
        rationale: String,
    },
}

/// One hash-linked ledger entry.
///
/// `previous_digest` is the digest of the preceding record and is absent only
/// on the first record of a ledger.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub previous_digest: Option<Digest>,
    pub entry: RecordEntry,
}

impl AuditRecord {
    /// Digest over the full record, link field included.
    pub fn digest(&self) -> Result<Digest, DigestError> {
        Digest::of(self)
    }

    /// Digest of the session state once this record took effect.
    pub fn post_state_digest(&self) -> &Digest {
        match &self.entry {
            RecordEntry::Initialization { state_digest } => state_digest,
            RecordEntry::Accepted { digest_after, .. } => digest_after,
            RecordEntry::Rejected { state_digest, .. } => state_digest,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self.entry, RecordEntry::Accepted { .. })
    }

    pub fn command(&self) -> Option<&Command> {
        match &self.entry {
            RecordEntry::Initialization { .. } => None,
            RecordEntry::Accepted { command, .. } | RecordEntry::Rejected { command, .. } => {
                Some(command)
            }
        }
    }

    pub fn source_id(&self) -> Option<&str> {
        match &self.entry {
            RecordEntry::Initialization { .. } => None,
            RecordEntry::Accepted { source_id, .. } | RecordEntry::Rejected { source_id, .. } => {
                Some(source_id)
            }
        }
    }
}
