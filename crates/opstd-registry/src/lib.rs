//! # opstd-registry — Permissioned Operational Standards Registry
//!
//! An operator ("owner") and a delegated set of managers define compliance
//! standards and record whether franchisees adhere to them.
//!
//! ## Components
//!
//! ```text
//! CallContext ──▶ AuthorizationGate ──▶ StandardRegistry
//!                        │                     ▲
//!                        └───────────────▶ ComplianceLedger (looks up standard IDs)
//! ```
//!
//! - **Gate** (`gate.rs`): owner or manager ⇒ authorized. Owner-only
//!   manager administration.
//! - **Standard Registry** (`standard.rs`): versioned standards; add
//!   creates version 1, update replaces all fields and bumps the version.
//! - **Compliance Ledger** (`compliance.rs`): last-write-wins assertions
//!   keyed by (franchisee, standard).
//! - **Contract** (`contract.rs`): the state object every operation runs
//!   against, with snapshots and state digests.
//! - **Config** (`config.rs`) and **Host** (`host.rs`): genesis settings and
//!   an in-process host for tests and embedders.
//!
//! ## Error codes
//!
//! | Code | Meaning |
//! |---|---|
//! | 409 | standard already exists |
//! | 401 | caller not authorized |
//! | 404 | standard not found |
//! | 400 | block height regression |
//! | 422 | standard version counter exhausted |

pub mod compliance;
pub mod config;
pub mod contract;
pub mod error;
pub mod gate;
pub mod host;
pub mod standard;

pub use compliance::{ComplianceKey, ComplianceLedger, ComplianceRecord, LedgerEntry, LedgerError};
pub use config::{ConfigError, ContractConfig};
pub use contract::{
    CallContext, CheckOrder, ContractSnapshot, OperationalStandards, SnapshotError,
    DEFAULT_CONTRACT_VERSION,
};
pub use error::{
    ContractError, Receipt, ERR_ALREADY_EXISTS, ERR_NOT_AUTHORIZED, ERR_NOT_FOUND,
    ERR_SEQUENCE_REGRESSION, ERR_VERSION_EXHAUSTED,
};
pub use gate::AuthorizationGate;
pub use host::{HostError, SimulatedHost};
pub use standard::{Standard, StandardDefinition, StandardRegistry};
