//! Decision audit log
//!
//! Hash-chained append-only record of every decision cycle. Fulfillment
//! options are ephemeral per-cycle values; the chosen option's snapshot
//! here is the only persistence they get.

use crate::scheduler::CycleState;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use restock_model::{CycleId, HouseholdId, ItemBundle};
use restock_optimizer::FulfillmentOption;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Audit log faults
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// A record's hash or chain link does not match its content
    #[error("audit chain integrity violation")]
    IntegrityViolation,

    /// Snapshot serialization failed
    #[error("audit snapshot serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One audited decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub timestamp: DateTime<Utc>,
    pub household_id: HouseholdId,
    pub cycle_id: CycleId,
    pub bundle: ItemBundle,
    /// Final cycle state the decision resolved to
    pub outcome_state: CycleState,
    /// Display-ready reason accompanying the outcome
    pub reason: String,
    /// The option the cycle acted on (or recommended), if it got that far
    pub chosen: Option<FulfillmentOption>,
    pub prev_hash: [u8; 32],
    pub hash: [u8; 32],
}

impl DecisionRecord {
    /// Create an unchained record; the log fills in the hashes on append
    #[must_use]
    pub fn new(
        household_id: HouseholdId,
        cycle_id: CycleId,
        bundle: ItemBundle,
        outcome_state: CycleState,
        reason: impl Into<String>,
        chosen: Option<FulfillmentOption>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            household_id,
            cycle_id,
            bundle,
            outcome_state,
            reason: reason.into(),
            chosen,
            prev_hash: [0u8; 32],
            hash: [0u8; 32],
        }
    }
}

/// Append-only, hash-chained decision log
#[derive(Debug, Default)]
pub struct DecisionAuditLog {
    inner: Mutex<Vec<DecisionRecord>>,
}

impl DecisionAuditLog {
    /// Create an empty log
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, chaining it to the previous one
    ///
    /// # Errors
    /// `AuditError::Serialization` if the option snapshot cannot be encoded.
    pub fn append(&self, mut record: DecisionRecord) -> Result<(), AuditError> {
        let mut guard = self.inner.lock();
        record.prev_hash = guard.last().map(|r| r.hash).unwrap_or([0u8; 32]);
        record.hash = compute_hash(&record)?;
        guard.push(record);
        Ok(())
    }

    /// Snapshot of all records, oldest first
    #[must_use]
    pub fn records(&self) -> Vec<DecisionRecord> {
        self.inner.lock().clone()
    }

    /// Records for one household, oldest first
    #[must_use]
    pub fn records_for(&self, household_id: HouseholdId) -> Vec<DecisionRecord> {
        self.inner
            .lock()
            .iter()
            .filter(|r| r.household_id == household_id)
            .cloned()
            .collect()
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Verify the whole chain
    ///
    /// # Errors
    /// `AuditError::IntegrityViolation` on the first broken link or
    /// tampered record.
    pub fn verify_integrity(&self) -> Result<(), AuditError> {
        let guard = self.inner.lock();
        let mut prev = [0u8; 32];
        for record in guard.iter() {
            if record.prev_hash != prev {
                return Err(AuditError::IntegrityViolation);
            }
            if compute_hash(record)? != record.hash {
                return Err(AuditError::IntegrityViolation);
            }
            prev = record.hash;
        }
        Ok(())
    }
}

fn compute_hash(record: &DecisionRecord) -> Result<[u8; 32], AuditError> {
    let mut hasher = Sha256::new();
    hasher.update(record.timestamp.to_rfc3339().as_bytes());
    hasher.update(record.household_id.to_string().as_bytes());
    hasher.update(record.cycle_id.to_string().as_bytes());
    for line in record.bundle.lines() {
        hasher.update(line.item_id.as_str().as_bytes());
        hasher.update(line.quantity.to_le_bytes());
        hasher.update([0]);
    }
    hasher.update(serde_json::to_vec(&record.outcome_state)?);
    hasher.update(record.reason.as_bytes());
    hasher.update([0]);
    hasher.update(serde_json::to_vec(&record.chosen)?);
    hasher.update(record.prev_hash);
    Ok(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use restock_model::ItemId;
    use std::str::FromStr;

    fn record(reason: &str) -> DecisionRecord {
        DecisionRecord::new(
            HouseholdId::new(),
            CycleId::new(),
            ItemBundle::single(ItemId::from_str("wipes").unwrap(), 1),
            CycleState::Skipped,
            reason,
            None,
        )
    }

    #[test]
    fn chain_verifies_after_appends() {
        let log = DecisionAuditLog::new();
        for i in 0..5 {
            log.append(record(&format!("reason {i}"))).unwrap();
        }
        log.verify_integrity().unwrap();
        assert_eq!(log.len(), 5);
    }

    #[test]
    fn records_link_to_their_predecessor() {
        let log = DecisionAuditLog::new();
        log.append(record("first")).unwrap();
        log.append(record("second")).unwrap();
        let records = log.records();
        assert_eq!(records[0].prev_hash, [0u8; 32]);
        assert_eq!(records[1].prev_hash, records[0].hash);
    }

    #[test]
    fn tampering_is_detected() {
        let log = DecisionAuditLog::new();
        log.append(record("first")).unwrap();
        log.append(record("second")).unwrap();
        {
            let mut guard = log.inner.lock();
            guard[0].reason = "rewritten".to_string();
        }
        assert!(matches!(
            log.verify_integrity(),
            Err(AuditError::IntegrityViolation)
        ));
    }
}
