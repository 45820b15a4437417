//! Append-only, hash-chained audit ledger.
//!
//! Each record commits to the digest of the record before it. Verification
//! walks the chain and reports the first index where the link breaks.

use super::record::{AuditRecord, RecordEntry};
use crate::core::{Command, Digest, DigestError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of walking a ledger's hash chain.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ChainVerification {
    pub is_valid: bool,
    pub broken_at_index: Option<usize>,
    pub reason: Option<String>,
}

impl ChainVerification {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            broken_at_index: None,
            reason: None,
        }
    }

    pub fn broken(index: usize, reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            broken_at_index: Some(index),
            reason: Some(reason.into()),
        }
    }
}

/// Ordered sequence of audit records.
///
/// The ledger only grows. The session's claimed current state digest is the
/// post-state digest of the last record.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct AuditLedger {
    records: Vec<AuditRecord>,
}

impl AuditLedger {
    /// An empty ledger with no genesis record.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// A ledger holding only the genesis record for `state_digest`.
    pub fn genesis(id: Uuid, timestamp: DateTime<Utc>, state_digest: Digest) -> Self {
        Self {
            records: vec![AuditRecord {
                id,
                timestamp,
                previous_digest: None,
                entry: RecordEntry::Initialization { state_digest },
            }],
        }
    }

    /// Rebuild a ledger from stored records. No verification is performed;
    /// call [`AuditLedger::verify`] before trusting the result.
    pub fn from_records(records: Vec<AuditRecord>) -> Self {
        Self { records }
    }

    pub fn into_records(self) -> Vec<AuditRecord> {
        self.records
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&AuditRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&AuditRecord> {
        self.records.last()
    }

    /// Digest of the last record, i.e. the link the next record must carry.
    pub fn head_digest(&self) -> Result<Option<Digest>, DigestError> {
        self.records.last().map(AuditRecord::digest).transpose()
    }

    /// Digest of the state after the most recent record.
    pub fn current_state_digest(&self) -> Option<&Digest> {
        self.records.last().map(AuditRecord::post_state_digest)
    }

    /// Link a new entry onto the chain.
    ///
    /// The new record must itself be hashable, otherwise the next append
    /// could never link to it. Both digests are computed before anything is
    /// pushed, so a failure leaves the ledger untouched.
    pub(crate) fn append(
        &mut self,
        id: Uuid,
        timestamp: DateTime<Utc>,
        entry: RecordEntry,
    ) -> Result<&AuditRecord, DigestError> {
        let record = AuditRecord {
            id,
            timestamp,
            previous_digest: self.head_digest()?,
            entry,
        };
        record.digest()?;
        self.records.push(record);
        Ok(&self.records[self.records.len() - 1])
    }

    /// Commands of accepted records, in order, with their source ids.
    pub fn accepted_commands(&self) -> impl Iterator<Item = (&Command, &str)> + '_ {
        self.records.iter().filter_map(|record| match &record.entry {
            RecordEntry::Accepted {
                command, source_id, ..
            } => Some((command, source_id.as_str())),
            _ => None,
        })
    }

    /// Walk the chain and confirm every record links to its predecessor.
    ///
    /// Empty and genesis-only ledgers are trivially valid.
    pub fn verify(&self) -> ChainVerification {
        let Some(first) = self.first() else {
            return ChainVerification::valid();
        };
        if first.previous_digest.is_some() {
            return ChainVerification::broken(0, "first record must not link to a predecessor");
        }

        for (index, pair) in self.records.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);
            let index = index + 1;

            let expected = match previous.digest() {
                Ok(digest) => digest,
                Err(e) => {
                    return ChainVerification::broken(
                        index - 1,
                        format!("record could not be hashed: {e}"),
                    )
                }
            };

            match &current.previous_digest {
                Some(actual) if *actual == expected => {}
                Some(actual) => {
                    return ChainVerification::broken(
                        index,
                        format!("previous digest mismatch: expected {expected}, found {actual}"),
                    )
                }
                None => {
                    return ChainVerification::broken(index, "missing previous digest");
                }
            }
        }

        ChainVerification::valid()
    }
}

impl<'a> IntoIterator for &'a AuditLedger {
    type Item = &'a AuditRecord;
    type IntoIter = std::slice::Iter<'a, AuditRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
