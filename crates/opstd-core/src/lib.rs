//! # opstd-core — Foundational Types for the Operational Standards Registry
//!
//! Leaf crate of the workspace. Defines the primitives every other crate
//! builds on and depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `Principal`, `StandardId` and
//!    `FranchiseeId` are distinct types with validated constructors. A
//!    franchisee identifier cannot be passed where a standard identifier is
//!    expected.
//!
//! 2. **Host-supplied sequence numbers.** `BlockHeight` is the logical clock
//!    stamped onto every record. It is an input from the host, never read from
//!    a wall clock.
//!
//! 3. **`CanonicalBytes` newtype.** All digest computation flows through
//!    `CanonicalBytes::new()`, so two equal states always hash identically.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `opstd-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod sequence;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{FranchiseeId, Principal, StandardId};
pub use sequence::BlockHeight;
