//! Tamper-evident audit trail.
//!
//! Every dispatch appends exactly one record; each record carries the digest
//! of its predecessor, so editing, removing or reordering records breaks the
//! chain at a detectable index.

mod ledger;
mod record;

pub use ledger::{AuditLedger, ChainVerification};
pub use record::{AuditRecord, RecordEntry};
