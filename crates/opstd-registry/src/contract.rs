//! # Operational Standards Contract
//!
//! [`OperationalStandards`] is the explicit context object holding the whole
//! registry state: the authorization gate, the standard registry and the
//! compliance ledger. Every operation receives it by reference together with
//! a [`CallContext`] carrying the caller identity and the host block height.
//!
//! ## Call discipline
//!
//! Mutating operations take `&mut self` and run to completion; the exclusive
//! borrow is the per-call lock. Each mutating operation:
//!
//! 1. evaluates the block-height check, its existence check and the gate
//!    in the configured [`CheckOrder`],
//! 2. only then mutates.
//!
//! Under [`CheckOrder::ExistenceFirst`] a lower block height than the last
//! applied one is rejected before anything else. Under
//! [`CheckOrder::AuthorizationFirst`] the gate runs first, so an
//! unprivileged caller always receives 401.
//!
//! Any rejection returns before step 2, so a failed call leaves the state
//! byte-for-byte unchanged (see [`OperationalStandards::state_digest`]).
//!
//! Reads take `&self`, need no authorization and never mutate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use opstd_core::{
    sha256_digest, BlockHeight, CanonicalBytes, CanonicalizationError, ContentDigest,
    FranchiseeId, Principal, StandardId,
};

use crate::compliance::{ComplianceKey, ComplianceLedger, ComplianceRecord};
use crate::config::ContractConfig;
use crate::error::ContractError;
use crate::gate::AuthorizationGate;
use crate::standard::{Standard, StandardDefinition, StandardRegistry};

/// Contract version reported by the deployed contract.
pub const DEFAULT_CONTRACT_VERSION: u32 = 100;

/// Host-supplied context of one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// The identity the host attributes the call to.
    pub caller: Principal,
    /// The host block height at which the call executes.
    pub sequence: BlockHeight,
}

impl CallContext {
    /// Build a context for `caller` at `sequence`.
    pub fn new(caller: Principal, sequence: BlockHeight) -> Self {
        Self { caller, sequence }
    }
}

/// Order in which a privileged call evaluates its existence check and the
/// authorization gate.
///
/// `ExistenceFirst` matches the deployed contract: an unprivileged caller
/// can tell "already exists"/"not found" apart from "not authorized".
/// `AuthorizationFirst` answers every unprivileged caller with 401, ahead of
/// the block-height check as well.
/// The resulting state is identical under both orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOrder {
    /// Block height, existence check, then the gate.
    #[default]
    ExistenceFirst,
    /// The gate, block height, then the existence check.
    AuthorizationFirst,
}

/// Serializable copy of the complete contract state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractSnapshot {
    /// Reported contract version.
    pub contract_version: u32,
    /// Existence/authorization check order.
    pub check_order: CheckOrder,
    /// Highest block height applied by a successful mutation.
    pub last_applied: BlockHeight,
    /// Owner and managers.
    pub gate: AuthorizationGate,
    /// All standards.
    pub standards: StandardRegistry,
    /// All compliance records.
    pub compliance: ComplianceLedger,
}

/// A snapshot that violates a state invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// A standard has version 0.
    #[error("standard {standard_id} has invalid version 0")]
    ZeroVersion {
        /// The offending standard.
        standard_id: StandardId,
    },

    /// A standard's version cannot be advanced any further.
    #[error("standard {standard_id} has exhausted its version counter")]
    VersionExhausted {
        /// The offending standard.
        standard_id: StandardId,
    },

    /// A standard was updated before it was created.
    #[error("standard {standard_id} has updated_at {updated_at} before created_at {created_at}")]
    UpdatedBeforeCreated {
        /// The offending standard.
        standard_id: StandardId,
        /// Creation height.
        created_at: BlockHeight,
        /// Last update height.
        updated_at: BlockHeight,
    },

    /// A compliance record references a standard that does not exist.
    #[error("compliance record ({entity_id}, {standard_id}) references a missing standard")]
    DanglingCompliance {
        /// Entity of the record.
        entity_id: FranchiseeId,
        /// The missing standard.
        standard_id: StandardId,
    },

    /// A record is stamped later than the last applied height.
    #[error("record stamped at {stamped} is newer than last applied height {last_applied}")]
    StampAfterLastApplied {
        /// The record's stamp.
        stamped: BlockHeight,
        /// The snapshot's last applied height.
        last_applied: BlockHeight,
    },
}

/// The operational standards registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationalStandards {
    contract_version: u32,
    check_order: CheckOrder,
    last_applied: BlockHeight,
    gate: AuthorizationGate,
    standards: StandardRegistry,
    compliance: ComplianceLedger,
}

impl OperationalStandards {
    /// An empty registry owned by `owner`, with default settings.
    pub fn new(owner: Principal) -> Self {
        Self {
            contract_version: DEFAULT_CONTRACT_VERSION,
            check_order: CheckOrder::default(),
            last_applied: BlockHeight::GENESIS,
            gate: AuthorizationGate::new(owner),
            standards: StandardRegistry::new(),
            compliance: ComplianceLedger::new(),
        }
    }

    /// An empty registry initialized from configuration. Managers listed in
    /// the configuration are seeded at genesis.
    pub fn from_config(config: &ContractConfig) -> Self {
        Self {
            contract_version: config.contract_version,
            check_order: config.check_order,
            last_applied: BlockHeight::GENESIS,
            gate: AuthorizationGate::with_managers(
                config.owner.clone(),
                config.managers.iter().cloned(),
            ),
            standards: StandardRegistry::new(),
            compliance: ComplianceLedger::new(),
        }
    }

    /// Replace the check order.
    pub fn with_check_order(mut self, check_order: CheckOrder) -> Self {
        self.check_order = check_order;
        self
    }

    // ── Standard Registry ───────────────────────────────────────────

    /// Create a standard at version 1.
    ///
    /// Returns `Ok(true)` on success.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` (409) if `standard_id` is taken, `NotAuthorized`
    /// (401) if the caller fails the gate, `SequenceRegression` (400) if the
    /// block height moved backwards.
    pub fn add_standard(
        &mut self,
        ctx: &CallContext,
        standard_id: StandardId,
        definition: StandardDefinition,
    ) -> Result<bool, ContractError> {
        let checked = self.admit(ctx, AuthorizationGate::authorize, |this| {
            this.standards.ensure_absent(&standard_id)
        });
        if let Err(err) = checked {
            return Err(self.reject("add_standard", ctx, err));
        }

        let standard = self.standards.insert(standard_id.clone(), definition, ctx.sequence)?;
        tracing::info!(
            standard_id = %standard_id,
            version = standard.version,
            caller = %ctx.caller,
            sequence = %ctx.sequence,
            "standard added"
        );
        self.last_applied = ctx.sequence;
        Ok(true)
    }

    /// Replace all mutable fields of a standard and bump its version.
    ///
    /// Returns `Ok(true)` on success. `created_at` is never changed.
    ///
    /// # Errors
    ///
    /// `NotFound` (404) if `standard_id` is absent, `NotAuthorized` (401)
    /// if the caller fails the gate, `SequenceRegression` (400) if the block
    /// height moved backwards, `VersionExhausted` (422) if the version
    /// counter is at its maximum.
    pub fn update_standard(
        &mut self,
        ctx: &CallContext,
        standard_id: StandardId,
        definition: StandardDefinition,
    ) -> Result<bool, ContractError> {
        let checked = self.admit(ctx, AuthorizationGate::authorize, |this| {
            this.standards.ensure_present(&standard_id)
        });
        if let Err(err) = checked {
            return Err(self.reject("update_standard", ctx, err));
        }

        let standard = match self.standards.revise(&standard_id, definition, ctx.sequence) {
            Ok(standard) => standard,
            Err(err) => return Err(self.reject("update_standard", ctx, err)),
        };
        tracing::info!(
            standard_id = %standard_id,
            version = standard.version,
            caller = %ctx.caller,
            sequence = %ctx.sequence,
            "standard updated"
        );
        self.last_applied = ctx.sequence;
        Ok(true)
    }

    // ── Compliance Ledger ───────────────────────────────────────────

    /// Insert or replace the compliance record of (`entity_id`,
    /// `standard_id`), stamped with the call's block height.
    ///
    /// Returns `Ok(true)` on success. The previous record, if any, is
    /// discarded.
    ///
    /// # Errors
    ///
    /// `NotFound` (404) if `standard_id` does not exist, `NotAuthorized`
    /// (401) if the caller fails the gate, `SequenceRegression` (400) if the
    /// block height moved backwards.
    pub fn set_compliance(
        &mut self,
        ctx: &CallContext,
        entity_id: FranchiseeId,
        standard_id: StandardId,
        compliant: bool,
        notes: impl Into<String>,
    ) -> Result<bool, ContractError> {
        let checked = self.admit(ctx, AuthorizationGate::authorize, |this| {
            this.standards.ensure_present(&standard_id)
        });
        if let Err(err) = checked {
            return Err(self.reject("set_compliance", ctx, err));
        }

        let record = ComplianceRecord {
            compliant,
            last_checked: ctx.sequence,
            notes: notes.into(),
        };
        let key = ComplianceKey::new(entity_id, standard_id);
        tracing::info!(
            entity_id = %key.entity_id,
            standard_id = %key.standard_id,
            compliant,
            caller = %ctx.caller,
            sequence = %ctx.sequence,
            "compliance recorded"
        );
        self.compliance.assert(key, record);
        self.last_applied = ctx.sequence;
        Ok(true)
    }

    // ── Manager Administration ──────────────────────────────────────

    /// Grant manager rights to `identity`. Owner only.
    ///
    /// Returns `Ok(true)`, also when `identity` already was a manager.
    ///
    /// # Errors
    ///
    /// `NotAuthorized` (401) unless the caller is the owner,
    /// `SequenceRegression` (400) if the block height moved backwards.
    pub fn add_manager(
        &mut self,
        ctx: &CallContext,
        identity: Principal,
    ) -> Result<bool, ContractError> {
        let checked = self.admit(ctx, AuthorizationGate::authorize_owner, |_| Ok(()));
        if let Err(err) = checked {
            return Err(self.reject("add_manager", ctx, err));
        }

        tracing::info!(
            manager = %identity,
            caller = %ctx.caller,
            sequence = %ctx.sequence,
            "manager added"
        );
        self.gate.insert_manager(identity);
        self.last_applied = ctx.sequence;
        Ok(true)
    }

    /// Revoke manager rights from `identity`. Owner only.
    ///
    /// Returns `Ok(true)`, also when `identity` was not a manager. The
    /// owner's own rights are unaffected by manager membership.
    ///
    /// # Errors
    ///
    /// `NotAuthorized` (401) unless the caller is the owner,
    /// `SequenceRegression` (400) if the block height moved backwards.
    pub fn remove_manager(
        &mut self,
        ctx: &CallContext,
        identity: &Principal,
    ) -> Result<bool, ContractError> {
        let checked = self.admit(ctx, AuthorizationGate::authorize_owner, |_| Ok(()));
        if let Err(err) = checked {
            return Err(self.reject("remove_manager", ctx, err));
        }

        tracing::info!(
            manager = %identity,
            caller = %ctx.caller,
            sequence = %ctx.sequence,
            "manager removed"
        );
        self.gate.remove_manager(identity);
        self.last_applied = ctx.sequence;
        Ok(true)
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// The standard stored under `standard_id`, if any.
    pub fn read_standard(&self, standard_id: &StandardId) -> Option<&Standard> {
        self.standards.get(standard_id)
    }

    /// The latest compliance record of the pair, if any.
    pub fn read_compliance(
        &self,
        entity_id: &FranchiseeId,
        standard_id: &StandardId,
    ) -> Option<&ComplianceRecord> {
        self.compliance.get(entity_id, standard_id)
    }

    /// All compliance records of one entity, ordered by standard.
    pub fn compliance_for_entity<'a>(
        &'a self,
        entity_id: &FranchiseeId,
    ) -> impl Iterator<Item = (&'a StandardId, &'a ComplianceRecord)> + 'a {
        self.compliance.for_entity(entity_id)
    }

    /// All standards, ordered by identifier.
    pub fn standards(&self) -> impl Iterator<Item = (&StandardId, &Standard)> {
        self.standards.iter()
    }

    /// Number of standards.
    pub fn standard_count(&self) -> usize {
        self.standards.len()
    }

    /// Number of compliance records.
    pub fn compliance_count(&self) -> usize {
        self.compliance.len()
    }

    /// Whether `identity` may perform privileged standard and compliance
    /// operations.
    pub fn is_authorized(&self, identity: &Principal) -> bool {
        self.gate.is_authorized(identity)
    }

    /// The owner identity.
    pub fn owner(&self) -> &Principal {
        self.gate.owner()
    }

    /// Managers, ascending.
    pub fn managers(&self) -> impl Iterator<Item = &Principal> {
        self.gate.managers()
    }

    /// The reported contract version.
    pub fn contract_version(&self) -> u32 {
        self.contract_version
    }

    /// The configured check order.
    pub fn check_order(&self) -> CheckOrder {
        self.check_order
    }

    /// Highest block height applied by a successful mutation.
    pub fn last_applied(&self) -> BlockHeight {
        self.last_applied
    }

    // ── Snapshots ───────────────────────────────────────────────────

    /// A serializable copy of the full state.
    pub fn snapshot(&self) -> ContractSnapshot {
        ContractSnapshot {
            contract_version: self.contract_version,
            check_order: self.check_order,
            last_applied: self.last_applied,
            gate: self.gate.clone(),
            standards: self.standards.clone(),
            compliance: self.compliance.clone(),
        }
    }

    /// Rebuild a registry from a snapshot, validating its invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] if a standard has version 0 or `u64::MAX`,
    /// or `updated_at < created_at`, a compliance record references a missing
    /// standard, or any stamp is newer than `last_applied`.
    pub fn restore(snapshot: ContractSnapshot) -> Result<Self, SnapshotError> {
        let ContractSnapshot {
            contract_version,
            check_order,
            last_applied,
            gate,
            standards,
            compliance,
        } = snapshot;

        for (standard_id, standard) in standards.iter() {
            if standard.version == 0 {
                return Err(SnapshotError::ZeroVersion {
                    standard_id: standard_id.clone(),
                });
            }
            if standard.version == u64::MAX {
                return Err(SnapshotError::VersionExhausted {
                    standard_id: standard_id.clone(),
                });
            }
            if standard.updated_at < standard.created_at {
                return Err(SnapshotError::UpdatedBeforeCreated {
                    standard_id: standard_id.clone(),
                    created_at: standard.created_at,
                    updated_at: standard.updated_at,
                });
            }
            if standard.updated_at > last_applied {
                return Err(SnapshotError::StampAfterLastApplied {
                    stamped: standard.updated_at,
                    last_applied,
                });
            }
        }

        for (entity_id, standard_id, record) in compliance.iter() {
            if !standards.contains(standard_id) {
                return Err(SnapshotError::DanglingCompliance {
                    entity_id: entity_id.clone(),
                    standard_id: standard_id.clone(),
                });
            }
            if record.last_checked > last_applied {
                return Err(SnapshotError::StampAfterLastApplied {
                    stamped: record.last_checked,
                    last_applied,
                });
            }
        }

        Ok(Self {
            contract_version,
            check_order,
            last_applied,
            gate,
            standards,
            compliance,
        })
    }

    /// SHA-256 digest of the canonical serialization of the full state.
    ///
    /// Two registries have equal digests iff their snapshots are equal.
    pub fn state_digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        let canonical = CanonicalBytes::new(&self.snapshot())?;
        Ok(sha256_digest(&canonical))
    }

    // ── Internal ────────────────────────────────────────────────────

    fn check_sequence(&self, ctx: &CallContext) -> Result<(), ContractError> {
        if ctx.sequence < self.last_applied {
            return Err(ContractError::SequenceRegression {
                presented: ctx.sequence,
                last_applied: self.last_applied,
            });
        }
        Ok(())
    }

    /// Run the block-height check, the existence check and the gate in the
    /// configured order.
    fn admit(
        &self,
        ctx: &CallContext,
        authorize: impl FnOnce(&AuthorizationGate, &Principal) -> Result<(), ContractError>,
        existence: impl FnOnce(&Self) -> Result<(), ContractError>,
    ) -> Result<(), ContractError> {
        match self.check_order {
            CheckOrder::ExistenceFirst => {
                self.check_sequence(ctx)?;
                existence(self)?;
                authorize(&self.gate, &ctx.caller)
            }
            CheckOrder::AuthorizationFirst => {
                authorize(&self.gate, &ctx.caller)?;
                self.check_sequence(ctx)?;
                existence(self)
            }
        }
    }

    fn reject(&self, operation: &'static str, ctx: &CallContext, err: ContractError) -> ContractError {
        tracing::warn!(
            operation,
            caller = %ctx.caller,
            sequence = %ctx.sequence,
            code = err.code(),
            kind = err.kind(),
            error = %err,
            "call rejected"
        );
        err
    }
}
