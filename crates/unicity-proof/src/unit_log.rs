//! Per-unit log of one round
//!
//! Every change of a unit appends an entry. An entry records the unit ledger
//! hash before it, the transaction record that caused it (if any), and the
//! hash of the unit data after it. The ledger hash advances to
//! `H(ledger || record)` with every recorded transaction. The log tree is a
//! plain Merkle tree over the entry digests, and proofs target the latest
//! entry.

use unicity_core::crypto::hash::{sum_hashes, Digest, HashAlgorithm};
use unicity_core::{Result, UnicityError};
use unicity_types::MerkleTree;

use crate::unit_proof::{log_entry_digest, UnitTreeCert};

/// One entry of a unit log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitLogEntry {
    /// Unit ledger hash before this entry
    pub unit_ledger_hash: Vec<u8>,
    /// Transaction record behind the change, if any
    pub tx_record_hash: Option<Vec<u8>>,
    /// Unit data hash after this entry
    pub unit_data_hash: Vec<u8>,
}

impl UnitLogEntry {
    /// Digest of this entry
    pub fn digest(&self, algorithm: &dyn HashAlgorithm) -> Digest {
        log_entry_digest(
            &self.unit_ledger_hash,
            self.tx_record_hash.as_deref(),
            &self.unit_data_hash,
            algorithm,
        )
    }
}

/// Ordered log of one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitLog {
    ledger_head: Vec<u8>,
    entries: Vec<UnitLogEntry>,
}

impl UnitLog {
    /// Start a log from the unit's current ledger hash
    pub fn new(ledger_head: impl Into<Vec<u8>>) -> Self {
        Self {
            ledger_head: ledger_head.into(),
            entries: Vec::new(),
        }
    }

    /// Record a change of the unit
    pub fn append(
        &mut self,
        tx_record_hash: Option<Vec<u8>>,
        unit_data_hash: impl Into<Vec<u8>>,
        algorithm: &dyn HashAlgorithm,
    ) {
        let entry = UnitLogEntry {
            unit_ledger_hash: self.ledger_head.clone(),
            tx_record_hash,
            unit_data_hash: unit_data_hash.into(),
        };
        if let Some(txr) = &entry.tx_record_hash {
            self.ledger_head = sum_hashes(algorithm, &self.ledger_head, txr).to_vec();
        }
        self.entries.push(entry);
    }

    /// Entries in append order
    pub fn entries(&self) -> &[UnitLogEntry] {
        &self.entries
    }

    /// Latest entry
    pub fn latest(&self) -> Result<&UnitLogEntry> {
        self.entries
            .last()
            .ok_or_else(|| UnicityError::invalid("unit log is empty"))
    }

    /// Ledger hash after the last recorded transaction
    pub fn ledger_head(&self) -> &[u8] {
        &self.ledger_head
    }

    fn tree(&self, algorithm: &dyn HashAlgorithm) -> MerkleTree {
        let digests: Vec<Digest> = self.entries.iter().map(|e| e.digest(algorithm)).collect();
        MerkleTree::new(algorithm, &digests)
    }

    /// Root of the log tree
    pub fn root(&self, algorithm: &dyn HashAlgorithm) -> Result<Digest> {
        self.tree(algorithm)
            .root_hash()
            .ok_or_else(|| UnicityError::invalid("unit log is empty"))
    }

    /// Certificate of the latest entry
    pub fn certificate(&self, algorithm: &dyn HashAlgorithm) -> Result<UnitTreeCert> {
        let latest = self.latest()?;
        let path = self.tree(algorithm).path(self.entries.len() - 1)?;
        Ok(UnitTreeCert {
            transaction_record_hash: latest.tx_record_hash.clone(),
            unit_data_hash: latest.unit_data_hash.clone(),
            path,
        })
    }
}
