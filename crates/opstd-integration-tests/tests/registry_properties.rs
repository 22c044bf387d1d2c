//! # Registry Property Tests
//!
//! Property-based verification of the registry's state-transition rules:
//! - n updates ⇒ version 1 + n, `updated_at` never decreases
//! - duplicate creation ⇒ 409, state unchanged
//! - unprivileged callers ⇒ 401 on every privileged operation, state unchanged
//! - compliance against a missing standard ⇒ 404
//! - compliance records are last-write-wins
//! - check order changes error codes only, never the resulting state

use opstd_core::{BlockHeight, FranchiseeId, Principal, StandardId};
use opstd_registry::{
    CallContext, CheckOrder, ContractError, OperationalStandards, StandardDefinition,
};
use proptest::prelude::*;

const OWNER: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";
const MANAGER: &str = "ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG";
const STRANGER: &str = "ST2JHG361ZXG51QTKY2NQCVBPPRRE2KZB1HR05NNC";

fn principal(s: &str) -> Principal {
    Principal::new(s).expect("test principal")
}

fn ctx(caller: &str, height: u64) -> CallContext {
    CallContext::new(principal(caller), BlockHeight::new(height))
}

fn sid(s: &str) -> StandardId {
    StandardId::new(s).expect("test standard id")
}

fn fid(s: &str) -> FranchiseeId {
    FranchiseeId::new(s).expect("test franchisee id")
}

fn registry_with_manager() -> OperationalStandards {
    let mut contract = OperationalStandards::new(principal(OWNER));
    contract
        .add_manager(&ctx(OWNER, 0), principal(MANAGER))
        .expect("owner adds manager");
    contract
}

fn definition_strategy() -> impl Strategy<Value = StandardDefinition> {
    ("[A-Za-z ]{1,24}", "[A-Za-z ,.]{0,48}", any::<bool>(), "[A-Za-z &]{1,16}").prop_map(
        |(name, description, required, category)| {
            StandardDefinition::new(name, description, required, category)
        },
    )
}

/// One host call in a random workload.
#[derive(Debug, Clone)]
enum Op {
    Add { caller: usize, standard: usize, definition: StandardDefinition },
    Update { caller: usize, standard: usize, definition: StandardDefinition },
    SetCompliance { caller: usize, entity: usize, standard: usize, compliant: bool, notes: String },
    AddManager { caller: usize, identity: usize },
    RemoveManager { caller: usize, identity: usize },
}

const CALLERS: [&str; 3] = [OWNER, MANAGER, STRANGER];
const STANDARDS: [&str; 3] = ["std-001", "std-002", "std-003"];
const ENTITIES: [&str; 3] = ["franchise-123", "franchise-456", "franchise-1-23"];

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, 0..3usize, definition_strategy())
            .prop_map(|(caller, standard, definition)| Op::Add { caller, standard, definition }),
        (0..3usize, 0..3usize, definition_strategy())
            .prop_map(|(caller, standard, definition)| Op::Update { caller, standard, definition }),
        (0..3usize, 0..3usize, 0..3usize, any::<bool>(), "[a-z ]{0,20}").prop_map(
            |(caller, entity, standard, compliant, notes)| Op::SetCompliance {
                caller,
                entity,
                standard,
                compliant,
                notes,
            }
        ),
        (0..3usize, 1..3usize).prop_map(|(caller, identity)| Op::AddManager { caller, identity }),
        (0..3usize, 1..3usize)
            .prop_map(|(caller, identity)| Op::RemoveManager { caller, identity }),
    ]
}

fn apply(contract: &mut OperationalStandards, op: &Op, height: u64) -> Result<bool, ContractError> {
    match op {
        Op::Add { caller, standard, definition } => contract.add_standard(
            &ctx(CALLERS[*caller], height),
            sid(STANDARDS[*standard]),
            definition.clone(),
        ),
        Op::Update { caller, standard, definition } => contract.update_standard(
            &ctx(CALLERS[*caller], height),
            sid(STANDARDS[*standard]),
            definition.clone(),
        ),
        Op::SetCompliance { caller, entity, standard, compliant, notes } => contract
            .set_compliance(
                &ctx(CALLERS[*caller], height),
                fid(ENTITIES[*entity]),
                sid(STANDARDS[*standard]),
                *compliant,
                notes.clone(),
            ),
        Op::AddManager { caller, identity } => contract
            .add_manager(&ctx(CALLERS[*caller], height), principal(CALLERS[*identity])),
        Op::RemoveManager { caller, identity } => contract
            .remove_manager(&ctx(CALLERS[*caller], height), &principal(CALLERS[*identity])),
    }
}

fn is_admin(op: &Op) -> bool {
    matches!(op, Op::AddManager { .. } | Op::RemoveManager { .. })
}

fn caller_of(op: &Op) -> &'static str {
    match op {
        Op::Add { caller, .. }
        | Op::Update { caller, .. }
        | Op::SetCompliance { caller, .. }
        | Op::AddManager { caller, .. }
        | Op::RemoveManager { caller, .. } => CALLERS[*caller],
    }
}

#[test]
fn every_privileged_operation_rejects_strangers_without_mutation() {
    let mut contract = registry_with_manager();
    contract
        .add_standard(&ctx(OWNER, 10), sid("std-001"), StandardDefinition::new("n", "d", true, "c"))
        .unwrap();
    let digest = contract.state_digest().unwrap();
    let stranger = ctx(STRANGER, 20);

    let results = [
        contract.add_standard(&stranger, sid("std-002"), StandardDefinition::new("n", "d", true, "c")),
        contract.update_standard(&stranger, sid("std-001"), StandardDefinition::new("x", "y", false, "z")),
        contract.set_compliance(&stranger, fid("franchise-123"), sid("std-001"), true, "notes"),
        contract.add_manager(&stranger, principal(STRANGER)),
        contract.remove_manager(&stranger, &principal(MANAGER)),
    ];
    for result in results {
        assert_eq!(
            result,
            Err(ContractError::NotAuthorized { caller: principal(STRANGER) })
        );
    }
    assert_eq!(contract.state_digest().unwrap(), digest);
}

#[test]
fn identifiers_containing_separators_never_collide() {
    let mut contract = OperationalStandards::new(principal(OWNER));
    let def = StandardDefinition::new("n", "d", true, "c");
    contract.add_standard(&ctx(OWNER, 1), sid("c"), def.clone()).unwrap();
    contract.add_standard(&ctx(OWNER, 1), sid("b-c"), def).unwrap();

    contract.set_compliance(&ctx(OWNER, 2), fid("a-b"), sid("c"), true, "first").unwrap();
    contract.set_compliance(&ctx(OWNER, 3), fid("a"), sid("b-c"), false, "second").unwrap();

    assert_eq!(contract.compliance_count(), 2);
    let first = contract.read_compliance(&fid("a-b"), &sid("c")).unwrap();
    let second = contract.read_compliance(&fid("a"), &sid("b-c")).unwrap();
    assert_eq!(first.notes, "first");
    assert_eq!(second.notes, "second");
}

proptest! {
    /// n successful updates yield version 1 + n with non-decreasing stamps.
    #[test]
    fn versions_count_updates(
        definitions in prop::collection::vec(definition_strategy(), 0..20),
        gaps in prop::collection::vec(0u64..5, 20),
    ) {
        let mut contract = registry_with_manager();
        contract
            .add_standard(&ctx(OWNER, 100), sid("std-001"), StandardDefinition::new("v1", "", true, "c"))
            .unwrap();

        let mut height = 100;
        let mut previous = BlockHeight::new(100);
        for (i, definition) in definitions.iter().enumerate() {
            height += gaps[i];
            let caller = if i % 2 == 0 { OWNER } else { MANAGER };
            prop_assert_eq!(
                contract.update_standard(&ctx(caller, height), sid("std-001"), definition.clone()),
                Ok(true)
            );
            let standard = contract.read_standard(&sid("std-001")).unwrap();
            prop_assert!(standard.updated_at >= previous);
            prop_assert!(standard.created_at <= standard.updated_at);
            prop_assert_eq!(&standard.definition(), definition);
            previous = standard.updated_at;
        }

        let standard = contract.read_standard(&sid("std-001")).unwrap();
        prop_assert_eq!(standard.version, 1 + definitions.len() as u64);
        prop_assert_eq!(standard.created_at, BlockHeight::new(100));
    }

    /// A second add of the same identifier is always 409 and changes nothing.
    #[test]
    fn duplicate_creation_is_rejected(first in definition_strategy(), second in definition_strategy(), caller in 0..3usize) {
        let mut contract = registry_with_manager();
        contract.add_standard(&ctx(OWNER, 5), sid("std-001"), first.clone()).unwrap();
        let digest = contract.state_digest().unwrap();

        let result = contract.add_standard(&ctx(CALLERS[caller], 6), sid("std-001"), second);
        prop_assert_eq!(result, Err(ContractError::AlreadyExists { standard_id: sid("std-001") }));
        prop_assert_eq!(contract.state_digest().unwrap(), digest);
        prop_assert_eq!(contract.read_standard(&sid("std-001")).unwrap().definition(), first);
    }

    /// Compliance against a never-added standard is always 404.
    #[test]
    fn compliance_requires_a_known_standard(entity in "[a-z0-9-]{1,16}", standard in "[a-z0-9-]{1,16}", compliant in any::<bool>()) {
        let mut contract = registry_with_manager();
        let result = contract.set_compliance(&ctx(OWNER, 1), fid(&entity), sid(&standard), compliant, "");
        prop_assert_eq!(result, Err(ContractError::NotFound { standard_id: sid(&standard) }));
        prop_assert_eq!(contract.compliance_count(), 0);
    }

    /// Only the last assertion of a pair is readable.
    #[test]
    fn compliance_is_last_write_wins(
        assertions in prop::collection::vec((any::<bool>(), "[a-z ]{0,24}"), 1..12),
    ) {
        let mut contract = registry_with_manager();
        contract
            .add_standard(&ctx(OWNER, 1), sid("std-001"), StandardDefinition::new("n", "d", true, "c"))
            .unwrap();

        for (i, (compliant, notes)) in assertions.iter().enumerate() {
            let height = 2 + i as u64;
            contract
                .set_compliance(&ctx(MANAGER, height), fid("franchise-123"), sid("std-001"), *compliant, notes.clone())
                .unwrap();
        }

        let (last_compliant, last_notes) = assertions.last().unwrap();
        let record = contract.read_compliance(&fid("franchise-123"), &sid("std-001")).unwrap();
        prop_assert_eq!(record.compliant, *last_compliant);
        prop_assert_eq!(&record.notes, last_notes);
        prop_assert_eq!(record.last_checked, BlockHeight::new(1 + assertions.len() as u64));
        prop_assert_eq!(contract.compliance_count(), 1);
    }

    /// Over random workloads: rejections never mutate, successes are always
    /// authorized, and both check orders reach the same state.
    #[test]
    fn random_workloads_respect_the_gate(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut compatible = registry_with_manager();
        let mut hardened = registry_with_manager().with_check_order(CheckOrder::AuthorizationFirst);

        for (i, op) in ops.iter().enumerate() {
            let height = 1 + i as u64;
            let caller = principal(caller_of(op));
            let allowed = if is_admin(op) {
                caller.as_str() == OWNER
            } else {
                compatible.is_authorized(&caller)
            };
            let before = compatible.state_digest().unwrap();

            let a = apply(&mut compatible, op, height);
            let b = apply(&mut hardened, op, height);

            match &a {
                Ok(value) => {
                    prop_assert!(*value);
                    prop_assert!(allowed, "unauthorized call succeeded: {:?}", op);
                }
                Err(err) => {
                    prop_assert_eq!(compatible.state_digest().unwrap(), before);
                    if !allowed && is_admin(op) {
                        prop_assert_eq!(err.code(), 401);
                    }
                }
            }

            prop_assert_eq!(a.is_ok(), b.is_ok());
            if let Err(err) = &b {
                if !allowed {
                    prop_assert_eq!(err.code(), 401);
                }
            }

            let mut left = compatible.snapshot();
            let mut right = hardened.snapshot();
            left.check_order = CheckOrder::ExistenceFirst;
            right.check_order = CheckOrder::ExistenceFirst;
            prop_assert_eq!(left, right);
        }

        for (id, standard) in compatible.standards() {
            prop_assert!(standard.version >= 1, "{} has version 0", id);
            prop_assert!(standard.created_at <= standard.updated_at);
        }
    }
}
