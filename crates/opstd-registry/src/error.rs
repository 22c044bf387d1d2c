//! # Contract Errors and Receipts
//!
//! Every rejection the contract can produce, with the numeric codes callers
//! were written against. Codes 409, 401 and 404 are part of the observable
//! contract and must never change.
//!
//! [`Receipt`] is the host-facing result value. It serializes to the same
//! `{"type": "ok", "value": true}` / `{"type": "err", "value": 409}` shape
//! the deployed contract returns.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use opstd_core::{BlockHeight, Principal, StandardId};

/// Code returned when creating a standard whose identifier is taken.
pub const ERR_ALREADY_EXISTS: u32 = 409;
/// Code returned when the caller is neither the owner nor a manager.
pub const ERR_NOT_AUTHORIZED: u32 = 401;
/// Code returned when a referenced standard does not exist.
pub const ERR_NOT_FOUND: u32 = 404;
/// Code returned when the host presents a block height lower than one
/// already applied.
pub const ERR_SEQUENCE_REGRESSION: u32 = 400;
/// Code returned when a standard's version counter cannot advance.
pub const ERR_VERSION_EXHAUSTED: u32 = 422;

/// Rejection of a mutating contract call.
///
/// All variants are terminal and non-retryable. A call that returns any of
/// them has left the contract state untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// A standard with this identifier already exists (409).
    #[error("standard {standard_id} already exists")]
    AlreadyExists {
        /// The identifier that is already taken.
        standard_id: StandardId,
    },

    /// The caller lacks owner or manager status (401).
    #[error("caller {caller} is not authorized")]
    NotAuthorized {
        /// The rejected caller.
        caller: Principal,
    },

    /// The referenced standard does not exist (404).
    #[error("standard {standard_id} not found")]
    NotFound {
        /// The identifier that was looked up.
        standard_id: StandardId,
    },

    /// The host presented a block height older than the last applied
    /// mutation (400).
    #[error("block height {presented} precedes last applied height {last_applied}")]
    SequenceRegression {
        /// Height carried by the rejected call.
        presented: BlockHeight,
        /// Highest height already applied to the state.
        last_applied: BlockHeight,
    },

    /// The standard's version counter is at its maximum (422).
    #[error("standard {standard_id} cannot be revised past version {version}")]
    VersionExhausted {
        /// The standard that was revised.
        standard_id: StandardId,
        /// Its current version.
        version: u64,
    },
}

impl ContractError {
    /// The numeric error code of this rejection.
    pub fn code(&self) -> u32 {
        match self {
            Self::AlreadyExists { .. } => ERR_ALREADY_EXISTS,
            Self::NotAuthorized { .. } => ERR_NOT_AUTHORIZED,
            Self::NotFound { .. } => ERR_NOT_FOUND,
            Self::SequenceRegression { .. } => ERR_SEQUENCE_REGRESSION,
            Self::VersionExhausted { .. } => ERR_VERSION_EXHAUSTED,
        }
    }

    /// A stable machine-readable name for this rejection.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::NotAuthorized { .. } => "NOT_AUTHORIZED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::SequenceRegression { .. } => "SEQUENCE_REGRESSION",
            Self::VersionExhausted { .. } => "VERSION_EXHAUSTED",
        }
    }
}

/// The result of a mutating call as the host returns it to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Receipt {
    /// The call succeeded with a boolean payload.
    Ok(bool),
    /// The call was rejected with a numeric code.
    Err(u32),
}

impl Receipt {
    /// Whether the call succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// The rejection code, if the call failed.
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Ok(_) => None,
            Self::Err(code) => Some(*code),
        }
    }
}

impl From<Result<bool, ContractError>> for Receipt {
    fn from(result: Result<bool, ContractError>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(err) => Self::Err(err.code()),
        }
    }
}
