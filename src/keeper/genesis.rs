// Genesis import and export

use crate::error::StakingError;
use crate::keeper::invariants;
use crate::keeper::executor::Keeper;
use crate::keeper::queue::QueuedEntry;
use crate::keeper::reader::StakingReader;
use crate::keeper::state::{BlockContext, StakingState};
use crate::keeper::validator_set::stored_active_set;
use crate::ledger::{AccountResolver, Ledger};
use crate::staking::{ActiveValidator, GenesisState};
use crate::storage::{keys, CommitStore, KvStore};
use tracing::info;

impl<S: KvStore + ?Sized> StakingState<'_, S> {
    /// Load a genesis state into an empty store
    ///
    /// Exported states keep their recorded last powers; fresh ones compute
    /// the first active set.
    pub fn init_genesis(&mut self, ctx: &BlockContext, genesis: &GenesisState) -> Result<Vec<ActiveValidator>, StakingError> {
        if !self.scan_prefix(&keys::validators_prefix())?.is_empty() {
            return Err(StakingError::InvalidState("genesis already initialized".into()));
        }
        self.set_params(&genesis.params)?;

        for validator in &genesis.validators {
            if self.has_validator(&validator.operator_address)? {
                return Err(StakingError::ValidatorExists(validator.operator_address));
            }
            if let Some(existing) = self.get_validator_by_cons_addr(&validator.consensus_address())? {
                return Err(StakingError::ConsensusKeyInUse(existing.operator_address));
            }
            self.set_validator(validator)?;
            if validator.is_unbonding() {
                self.insert_validator_queue(validator);
            }
        }

        for delegation in &genesis.delegations {
            if !self.has_validator(&delegation.validator_address)? {
                return Err(StakingError::ValidatorNotFound(delegation.validator_address));
            }
            self.set_delegation(delegation)?;
        }

        let mut max_id = 0;
        for ubd in &genesis.unbonding_delegations {
            self.set_unbonding_delegation(ubd)?;
            for entry in &ubd.entries {
                max_id = max_id.max(entry.unbonding_id);
                self.insert_unbonding_queue(
                    &entry.completion_time,
                    entry.unbonding_id,
                    &QueuedEntry::Unbonding {
                        delegator: ubd.delegator_address,
                        validator: ubd.validator_address,
                    },
                )?;
            }
        }
        for red in &genesis.redelegations {
            self.set_redelegation(red)?;
            for entry in &red.entries {
                max_id = max_id.max(entry.unbonding_id);
                self.insert_unbonding_queue(
                    &entry.completion_time,
                    entry.unbonding_id,
                    &QueuedEntry::Redelegation {
                        delegator: red.delegator_address,
                        src: red.validator_src_address,
                        dst: red.validator_dst_address,
                    },
                )?;
            }
        }
        self.set_next_unbonding_id(max_id + 1)?;

        invariants::check_all(&*self)
            .map_err(|e| StakingError::InvalidArgument(format!("inconsistent genesis: {}", e)))?;

        if genesis.exported {
            for last in &genesis.last_validator_powers {
                self.set_last_validator_power(&last.address, last.power)?;
            }
            return stored_active_set(&*self);
        }

        let reduction = self.power_reduction();
        for validator in genesis.validators.iter().filter(|v| v.is_bonded()) {
            self.set_last_validator_power(&validator.operator_address, validator.consensus_power(reduction))?;
        }
        self.apply_validator_set_updates(ctx)
    }
}

impl<S: CommitStore, L: Ledger, A: AccountResolver> Keeper<S, L, A> {
    /// Initialize state from genesis, returning the initial active set
    pub fn init_genesis(&mut self, ctx: &BlockContext, genesis: &GenesisState) -> Result<Vec<ActiveValidator>, StakingError> {
        let active = self.execute("init_genesis", |state| state.init_genesis(ctx, genesis))?;
        info!(
            "Genesis loaded: {} validators, {} delegations, {} active",
            genesis.validators.len(),
            genesis.delegations.len(),
            active.len()
        );
        Ok(active)
    }

    /// Export the committed state
    pub fn export_genesis(&self) -> Result<GenesisState, StakingError> {
        let store = self.store();
        Ok(GenesisState {
            params: store.params()?,
            last_validator_powers: store.get_last_validator_powers()?,
            validators: store.get_all_validators()?,
            delegations: store.get_all_delegations()?,
            unbonding_delegations: store.get_all_unbonding_delegations()?,
            redelegations: store.get_all_redelegations()?,
            exported: true,
        })
    }
}
