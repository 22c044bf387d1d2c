//! # In-Process Host
//!
//! [`SimulatedHost`] plays the role of the execution environment for tests
//! and embedders: it owns a registry, keeps a block height that only moves
//! forward, attributes calls to a caller and converts results into
//! [`Receipt`]s.

use thiserror::Error;

use opstd_core::{BlockHeight, Principal};

use crate::contract::{CallContext, OperationalStandards};
use crate::error::{ContractError, Receipt};

/// Errors moving the host block height.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The requested height is lower than the current one.
    #[error("cannot move block height back from {current} to {requested}")]
    HeightRegression {
        /// Current height.
        current: BlockHeight,
        /// Requested height.
        requested: BlockHeight,
    },

    /// Advancing would overflow the height counter.
    #[error("block height overflow at {current}")]
    HeightOverflow {
        /// Current height.
        current: BlockHeight,
    },
}

/// A registry together with the host-side block height.
#[derive(Debug, Clone)]
pub struct SimulatedHost {
    contract: OperationalStandards,
    height: BlockHeight,
}

impl SimulatedHost {
    /// Host `contract` starting at `height`.
    pub fn new(contract: OperationalStandards, height: BlockHeight) -> Self {
        Self { contract, height }
    }

    /// The current block height.
    pub fn height(&self) -> BlockHeight {
        self.height
    }

    /// Produce `blocks` new blocks.
    pub fn mine(&mut self, blocks: u64) -> Result<BlockHeight, HostError> {
        self.height = self
            .height
            .checked_add(blocks)
            .ok_or(HostError::HeightOverflow {
                current: self.height,
            })?;
        Ok(self.height)
    }

    /// Jump forward to `height`. Staying at the current height is allowed.
    pub fn advance_to(&mut self, height: BlockHeight) -> Result<(), HostError> {
        if height < self.height {
            return Err(HostError::HeightRegression {
                current: self.height,
                requested: height,
            });
        }
        self.height = height;
        Ok(())
    }

    /// The context a call from `caller` would execute under.
    pub fn context_for(&self, caller: &Principal) -> CallContext {
        CallContext::new(caller.clone(), self.height)
    }

    /// Execute one mutating call from `caller` at the current height.
    pub fn call(
        &mut self,
        caller: &Principal,
        op: impl FnOnce(&mut OperationalStandards, &CallContext) -> Result<bool, ContractError>,
    ) -> Receipt {
        let ctx = self.context_for(caller);
        Receipt::from(op(&mut self.contract, &ctx))
    }

    /// Read-only access to the hosted registry.
    pub fn contract(&self) -> &OperationalStandards {
        &self.contract
    }

    /// Stop hosting and hand back the registry.
    pub fn into_contract(self) -> OperationalStandards {
        self.contract
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standard::StandardDefinition;
    use opstd_core::StandardId;

    fn owner() -> Principal {
        Principal::new("ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM").unwrap()
    }

    #[test]
    fn height_only_moves_forward() {
        let mut host = SimulatedHost::new(OperationalStandards::new(owner()), BlockHeight::new(100));
        assert_eq!(host.mine(5), Ok(BlockHeight::new(105)));
        assert!(host.advance_to(BlockHeight::new(105)).is_ok());
        assert_eq!(
            host.advance_to(BlockHeight::new(104)),
            Err(HostError::HeightRegression {
                current: BlockHeight::new(105),
                requested: BlockHeight::new(104),
            })
        );
        assert_eq!(host.height(), BlockHeight::new(105));
    }

    #[test]
    fn mine_overflow_keeps_height() {
        let mut host =
            SimulatedHost::new(OperationalStandards::new(owner()), BlockHeight::new(u64::MAX));
        assert!(host.mine(1).is_err());
        assert_eq!(host.height(), BlockHeight::new(u64::MAX));
    }

    #[test]
    fn call_stamps_current_height_and_returns_receipt() {
        let mut host = SimulatedHost::new(OperationalStandards::new(owner()), BlockHeight::new(100));
        let id = StandardId::new("std-001").unwrap();
        let definition = StandardDefinition::new("Name", "Desc", true, "Health");

        let receipt = host.call(&owner(), |c, ctx| {
            c.add_standard(ctx, id.clone(), definition.clone())
        });
        assert_eq!(receipt, Receipt::Ok(true));

        let stranger = Principal::new("stranger").unwrap();
        let receipt = host.call(&stranger, |c, ctx| c.update_standard(ctx, id.clone(), definition));
        assert_eq!(receipt, Receipt::Err(401));

        let standard = host.contract().read_standard(&id).unwrap();
        assert_eq!(standard.created_at, BlockHeight::new(100));
    }
}
