//! # Standard Registry
//!
//! Owns the mapping from [`StandardId`] to its versioned [`Standard`].
//!
//! ## States
//!
//! ```text
//! absent ──add──▶ present(v=1) ──update──▶ present(v=2) ──update──▶ ...
//!   │
//!   └──update──▶ rejected (NotFound)
//! ```
//!
//! Standards are never deleted. Every successful update replaces all four
//! mutable fields together, bumps `version` by exactly one and restamps
//! `updated_at`; `created_at` never changes after insertion.
//!
//! Authorization is not checked here. The contract evaluates the gate
//! before calling into the registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use opstd_core::{BlockHeight, StandardId};

use crate::error::ContractError;

/// The mutable content of a standard. Always written as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardDefinition {
    /// Human-readable name.
    pub name: String,
    /// What the standard requires.
    pub description: String,
    /// Whether adherence is mandatory.
    pub required: bool,
    /// Grouping label (e.g. "Health & Safety").
    pub category: String,
}

impl StandardDefinition {
    /// Build a definition from its four fields.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            category: category.into(),
        }
    }
}

/// A stored, versioned standard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standard {
    /// Human-readable name.
    pub name: String,
    /// What the standard requires.
    pub description: String,
    /// Whether adherence is mandatory.
    pub required: bool,
    /// Grouping label.
    pub category: String,
    /// Starts at 1, incremented by one on every successful update.
    pub version: u64,
    /// Block height of creation.
    pub created_at: BlockHeight,
    /// Block height of the last successful update (or creation).
    pub updated_at: BlockHeight,
}

impl Standard {
    /// A first-version standard stamped at `at`.
    pub fn new(definition: StandardDefinition, at: BlockHeight) -> Self {
        let StandardDefinition {
            name,
            description,
            required,
            category,
        } = definition;
        Self {
            name,
            description,
            required,
            category,
            version: 1,
            created_at: at,
            updated_at: at,
        }
    }

    /// Replace the definition wholesale and advance the version. Returns
    /// `None`, leaving the standard untouched, if the version cannot
    /// advance.
    fn revise(&mut self, definition: StandardDefinition, at: BlockHeight) -> Option<u64> {
        let next = self.version.checked_add(1)?;
        let StandardDefinition {
            name,
            description,
            required,
            category,
        } = definition;
        self.name = name;
        self.description = description;
        self.required = required;
        self.category = category;
        self.version = next;
        self.updated_at = at;
        Some(next)
    }

    /// The current mutable content.
    pub fn definition(&self) -> StandardDefinition {
        StandardDefinition::new(
            self.name.clone(),
            self.description.clone(),
            self.required,
            self.category.clone(),
        )
    }
}

/// `standard_id → Standard`, ordered by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StandardRegistry {
    standards: BTreeMap<StandardId, Standard>,
}

impl StandardRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a standard.
    pub fn get(&self, standard_id: &StandardId) -> Option<&Standard> {
        self.standards.get(standard_id)
    }

    /// Whether a standard with this identifier exists.
    pub fn contains(&self, standard_id: &StandardId) -> bool {
        self.standards.contains_key(standard_id)
    }

    /// All standards in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&StandardId, &Standard)> {
        self.standards.iter()
    }

    /// Number of standards.
    pub fn len(&self) -> usize {
        self.standards.len()
    }

    /// Whether the registry holds no standards.
    pub fn is_empty(&self) -> bool {
        self.standards.is_empty()
    }

    /// Fail with `AlreadyExists` if `standard_id` is taken.
    pub fn ensure_absent(&self, standard_id: &StandardId) -> Result<(), ContractError> {
        if self.contains(standard_id) {
            Err(ContractError::AlreadyExists {
                standard_id: standard_id.clone(),
            })
        } else {
            Ok(())
        }
    }

    /// Fail with `NotFound` unless `standard_id` exists.
    pub fn ensure_present(&self, standard_id: &StandardId) -> Result<(), ContractError> {
        if self.contains(standard_id) {
            Ok(())
        } else {
            Err(ContractError::NotFound {
                standard_id: standard_id.clone(),
            })
        }
    }

    /// Insert a first-version standard (absent → present(1)).
    pub(crate) fn insert(
        &mut self,
        standard_id: StandardId,
        definition: StandardDefinition,
        at: BlockHeight,
    ) -> Result<&Standard, ContractError> {
        self.ensure_absent(&standard_id)?;
        Ok(self
            .standards
            .entry(standard_id)
            .or_insert_with(|| Standard::new(definition, at)))
    }

    /// Revise an existing standard (present(v) → present(v+1)).
    pub(crate) fn revise(
        &mut self,
        standard_id: &StandardId,
        definition: StandardDefinition,
        at: BlockHeight,
    ) -> Result<&Standard, ContractError> {
        let standard = self
            .standards
            .get_mut(standard_id)
            .ok_or_else(|| ContractError::NotFound {
                standard_id: standard_id.clone(),
            })?;
        match standard.revise(definition, at) {
            Some(_) => Ok(standard),
            None => Err(ContractError::VersionExhausted {
                standard_id: standard_id.clone(),
                version: standard.version,
            }),
        }
    }
}
