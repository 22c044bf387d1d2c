//! # Identity & Authorization Gate
//!
//! Decides whether a caller may perform a privileged operation. A caller is
//! authorized iff it is the owner or a member of the manager set. The owner
//! is fixed at construction and is authorized regardless of membership.
//!
//! Only the owner may change the manager set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use opstd_core::Principal;

use crate::error::ContractError;

/// The owner identity plus the delegated manager set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationGate {
    owner: Principal,
    managers: BTreeSet<Principal>,
}

impl AuthorizationGate {
    /// A gate with only the owner authorized.
    pub fn new(owner: Principal) -> Self {
        Self {
            owner,
            managers: BTreeSet::new(),
        }
    }

    /// A gate seeded with an initial manager set.
    pub fn with_managers(owner: Principal, managers: impl IntoIterator<Item = Principal>) -> Self {
        Self {
            owner,
            managers: managers.into_iter().collect(),
        }
    }

    /// The owner identity.
    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    /// Whether `caller` is the owner.
    pub fn is_owner(&self, caller: &Principal) -> bool {
        caller == &self.owner
    }

    /// Whether `caller` is in the manager set. Says nothing about ownership.
    pub fn is_manager(&self, caller: &Principal) -> bool {
        self.managers.contains(caller)
    }

    /// Whether `caller` may perform privileged operations.
    pub fn is_authorized(&self, caller: &Principal) -> bool {
        self.is_owner(caller) || self.is_manager(caller)
    }

    /// Managers in ascending order.
    pub fn managers(&self) -> impl Iterator<Item = &Principal> {
        self.managers.iter()
    }

    /// Fail with `NotAuthorized` unless `caller` is owner or manager.
    pub fn authorize(&self, caller: &Principal) -> Result<(), ContractError> {
        if self.is_authorized(caller) {
            Ok(())
        } else {
            Err(ContractError::NotAuthorized {
                caller: caller.clone(),
            })
        }
    }

    /// Fail with `NotAuthorized` unless `caller` is the owner.
    pub fn authorize_owner(&self, caller: &Principal) -> Result<(), ContractError> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(ContractError::NotAuthorized {
                caller: caller.clone(),
            })
        }
    }

    /// Add a manager. Returns `false` if it was already present.
    pub(crate) fn insert_manager(&mut self, identity: Principal) -> bool {
        self.managers.insert(identity)
    }

    /// Remove a manager. Returns `false` if it was not present.
    pub(crate) fn remove_manager(&mut self, identity: &Principal) -> bool {
        self.managers.remove(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Principal {
        Principal::new(s).unwrap()
    }

    #[test]
    fn owner_is_always_authorized() {
        let gate = AuthorizationGate::new(p("owner"));
        assert!(gate.is_authorized(&p("owner")));
        assert!(!gate.is_manager(&p("owner")));
        assert!(!gate.is_authorized(&p("stranger")));
    }

    #[test]
    fn managers_are_authorized_but_not_owner() {
        let gate = AuthorizationGate::with_managers(p("owner"), [p("mgr-a"), p("mgr-b")]);
        assert!(gate.is_authorized(&p("mgr-a")));
        assert!(!gate.is_owner(&p("mgr-a")));
        assert!(gate.authorize(&p("mgr-b")).is_ok());
        assert_eq!(
            gate.authorize_owner(&p("mgr-b")),
            Err(ContractError::NotAuthorized { caller: p("mgr-b") })
        );
    }

    #[test]
    fn insert_and_remove_report_membership_change() {
        let mut gate = AuthorizationGate::new(p("owner"));
        assert!(gate.insert_manager(p("mgr")));
        assert!(!gate.insert_manager(p("mgr")));
        assert!(gate.remove_manager(&p("mgr")));
        assert!(!gate.remove_manager(&p("mgr")));
        assert!(!gate.is_authorized(&p("mgr")));
    }

    #[test]
    fn removing_owner_from_managers_keeps_owner_rights() {
        let mut gate = AuthorizationGate::with_managers(p("owner"), [p("owner")]);
        assert!(gate.remove_manager(&p("owner")));
        assert!(gate.is_authorized(&p("owner")));
    }

    #[test]
    fn managers_iterate_sorted() {
        let gate = AuthorizationGate::with_managers(p("owner"), [p("zed"), p("amy"), p("amy")]);
        let names: Vec<&str> = gate.managers().map(Principal::as_str).collect();
        assert_eq!(names, vec!["amy", "zed"]);
    }
}
