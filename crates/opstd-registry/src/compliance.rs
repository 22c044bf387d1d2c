//! # Compliance Ledger
//!
//! Owns the latest compliance assertion for each (franchisee, standard)
//! pair. The ledger is last-write-wins: setting a record replaces the prior
//! one wholesale and no history is kept.
//!
//! Records are addressed by the composite [`ComplianceKey`] and stored by
//! entity, then standard, so identifiers that contain `-` can never collide
//! the way joined strings would (`("a-b", "c")` and `("a", "b-c")` are
//! different keys).
//!
//! Whether the referenced standard exists is checked by the contract before
//! the ledger is touched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use opstd_core::{BlockHeight, FranchiseeId, StandardId};

/// Composite key of a compliance record, ordered by franchisee then
/// standard.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComplianceKey {
    /// The entity being assessed.
    pub entity_id: FranchiseeId,
    /// The standard it is assessed against.
    pub standard_id: StandardId,
}

impl ComplianceKey {
    /// Build a key from its two parts.
    pub fn new(entity_id: FranchiseeId, standard_id: StandardId) -> Self {
        Self {
            entity_id,
            standard_id,
        }
    }
}

/// The latest pass/fail assertion for one entity against one standard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    /// Whether the entity complies.
    pub compliant: bool,
    /// Block height of the assertion.
    pub last_checked: BlockHeight,
    /// Free-form inspector notes.
    pub notes: String,
}

/// Error restoring a ledger from its serialized entry list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Two entries share the same (entity, standard) key.
    #[error("duplicate compliance entry for ({entity_id}, {standard_id})")]
    DuplicateEntry {
        /// Entity of the duplicated key.
        entity_id: FranchiseeId,
        /// Standard of the duplicated key.
        standard_id: StandardId,
    },
}

/// One serialized ledger row. JSON object keys cannot be tuples, so the
/// ledger serializes as an ordered list of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The entity being assessed.
    pub entity_id: FranchiseeId,
    /// The standard it is assessed against.
    pub standard_id: StandardId,
    /// The stored assertion.
    #[serde(flatten)]
    pub record: ComplianceRecord,
}

/// `entity_id → standard_id → ComplianceRecord`.
///
/// Two levels so that all records of one franchisee are a single lookup.
/// Inner maps are never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<LedgerEntry>", try_from = "Vec<LedgerEntry>")]
pub struct ComplianceLedger {
    records: BTreeMap<FranchiseeId, BTreeMap<StandardId, ComplianceRecord>>,
}

impl ComplianceLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the record for a pair.
    pub fn get(&self, entity_id: &FranchiseeId, standard_id: &StandardId) -> Option<&ComplianceRecord> {
        self.records.get(entity_id)?.get(standard_id)
    }

    /// All records of one entity, ordered by standard identifier.
    pub fn for_entity<'a>(
        &'a self,
        entity_id: &FranchiseeId,
    ) -> impl Iterator<Item = (&'a StandardId, &'a ComplianceRecord)> + 'a {
        self.records
            .get(entity_id)
            .into_iter()
            .flat_map(|by_standard| by_standard.iter())
    }

    /// All records, ordered by entity then standard.
    pub fn iter(&self) -> impl Iterator<Item = (&FranchiseeId, &StandardId, &ComplianceRecord)> {
        self.records.iter().flat_map(|(entity_id, by_standard)| {
            by_standard
                .iter()
                .map(move |(standard_id, record)| (entity_id, standard_id, record))
        })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.values().map(BTreeMap::len).sum()
    }

    /// Whether the ledger holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert or replace the record at `key`, returning the stored record.
    pub(crate) fn assert(&mut self, key: ComplianceKey, record: ComplianceRecord) -> &ComplianceRecord {
        use std::collections::btree_map::Entry;

        let ComplianceKey {
            entity_id,
            standard_id,
        } = key;
        match self.records.entry(entity_id).or_default().entry(standard_id) {
            Entry::Occupied(mut slot) => {
                slot.insert(record);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(record),
        }
    }
}

impl From<ComplianceLedger> for Vec<LedgerEntry> {
    fn from(ledger: ComplianceLedger) -> Self {
        ledger
            .records
            .into_iter()
            .flat_map(|(entity_id, by_standard)| {
                by_standard
                    .into_iter()
                    .map(move |(standard_id, record)| LedgerEntry {
                        entity_id: entity_id.clone(),
                        standard_id,
                        record,
                    })
            })
            .collect()
    }
}

impl TryFrom<Vec<LedgerEntry>> for ComplianceLedger {
    type Error = LedgerError;

    fn try_from(entries: Vec<LedgerEntry>) -> Result<Self, Self::Error> {
        let mut ledger = Self::new();
        for entry in entries {
            if ledger.get(&entry.entity_id, &entry.standard_id).is_some() {
                return Err(LedgerError::DuplicateEntry {
                    entity_id: entry.entity_id,
                    standard_id: entry.standard_id,
                });
            }
            ledger.assert(ComplianceKey::new(entry.entity_id, entry.standard_id), entry.record);
        }
        Ok(ledger)
    }
}
