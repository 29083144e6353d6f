// Active set computation and the block completion callback

use crate::error::StakingError;
use crate::keeper::executor::Keeper;
use crate::keeper::reader::StakingReader;
use crate::keeper::state::{BlockContext, StakingState};
use crate::ledger::{AccountResolver, Ledger, ModulePool};
use crate::staking::{ActiveValidator, BondStatus, Validator};
use crate::storage::{CommitStore, KvStore};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Order an active set by power descending, operator ascending
fn sort_active_set(active: &mut [ActiveValidator]) {
    active.sort_by(|a, b| {
        b.power
            .cmp(&a.power)
            .then_with(|| a.operator_address.cmp(&b.operator_address))
    });
}

/// Active set recorded at the last block completion
pub fn stored_active_set<R: StakingReader + ?Sized>(store: &R) -> Result<Vec<ActiveValidator>, StakingError> {
    let mut active = Vec::new();
    for last in store.get_last_validator_powers()? {
        let validator = store
            .get_validator(&last.address)?
            .ok_or(StakingError::ValidatorNotFound(last.address))?;
        active.push(ActiveValidator {
            operator_address: last.address,
            consensus_pubkey: validator.consensus_pubkey,
            power: last.power,
        });
    }
    sort_active_set(&mut active);
    Ok(active)
}

impl<S: KvStore + ?Sized> StakingState<'_, S> {
    fn bond_validator(&mut self, mut validator: Validator) -> Result<Validator, StakingError> {
        if validator.is_unbonding() {
            self.delete_validator_queue(&validator);
        }
        validator.set_status(BondStatus::Bonded)?;
        self.move_between_pools(ModulePool::NotBonded, ModulePool::Bonded, validator.tokens);
        self.set_validator(&validator)?;
        info!("Validator {} bonded with {} tokens", validator.operator_address, validator.tokens);
        Ok(validator)
    }

    fn begin_unbonding_validator(&mut self, ctx: &BlockContext, mut validator: Validator) -> Result<(), StakingError> {
        let params = self.params()?;
        validator.set_status(BondStatus::Unbonding)?;
        validator.unbonding_height = ctx.height;
        validator.unbonding_time = ctx.time_after(params.unbonding_time)?;
        self.move_between_pools(ModulePool::Bonded, ModulePool::NotBonded, validator.tokens);
        self.set_validator(&validator)?;
        self.insert_validator_queue(&validator);
        info!(
            "Validator {} left the active set, unbonding until {}",
            validator.operator_address, validator.unbonding_time
        );
        Ok(())
    }

    /// Recompute the active set from the power index
    ///
    /// The first `max_validators` validators with positive power become
    /// Bonded; validators bonded at the previous block that did not make it
    /// start unbonding.
    pub fn apply_validator_set_updates(&mut self, ctx: &BlockContext) -> Result<Vec<ActiveValidator>, StakingError> {
        let max = self.params()?.max_validators as usize;
        let reduction = self.power_reduction();

        let mut previous: BTreeMap<_, _> = self
            .get_last_validator_powers()?
            .into_iter()
            .map(|last| (last.address, last.power))
            .collect();

        let mut active = Vec::new();
        for operator in self.validators_by_power()? {
            if active.len() >= max {
                break;
            }
            let mut validator = self.must_get_validator(&operator)?;
            if validator.jailed {
                continue;
            }
            let power = validator.consensus_power(reduction);
            if power == 0 {
                break;
            }

            if !validator.is_bonded() {
                validator = self.bond_validator(validator)?;
            }
            if previous.remove(&operator) != Some(power) {
                self.set_last_validator_power(&operator, power)?;
            }
            active.push(ActiveValidator {
                operator_address: operator,
                consensus_pubkey: validator.consensus_pubkey,
                power,
            });
        }

        for operator in previous.into_keys() {
            self.delete_last_validator_power(&operator);
            if let Some(validator) = self.get_validator(&operator)? {
                if validator.is_bonded() {
                    self.begin_unbonding_validator(ctx, validator)?;
                }
            }
        }

        sort_active_set(&mut active);
        debug!("Active set at height {} has {} validators", ctx.height, active.len());
        Ok(active)
    }

    /// End-of-block processing
    ///
    /// Runs at most once per height: a height at or below the last completed
    /// one returns the stored active set without touching state.
    pub fn on_block_complete(&mut self, ctx: &BlockContext) -> Result<Vec<ActiveValidator>, StakingError> {
        if let Some(last) = self.last_completed_height()? {
            if ctx.height <= last {
                debug!("Height {} already completed (last {}), skipping sweep", ctx.height, last);
                return stored_active_set(&*self);
            }
        }

        let active = self.apply_validator_set_updates(ctx)?;
        let validators = self.unbond_matured_validators(ctx)?;
        let mut summary = self.complete_matured_entries(ctx)?;
        summary.validators = validators;
        self.set_last_completed_height(ctx.height)?;

        info!(
            "Block {} complete: {} active, {} unbondings, {} redelegations, {} validators unbonded",
            ctx.height,
            active.len(),
            summary.unbondings,
            summary.redelegations,
            summary.validators
        );
        Ok(active)
    }
}

impl<S: CommitStore, L: Ledger, A: AccountResolver> Keeper<S, L, A> {
    /// Block completion callback, returning the active validator set
    pub fn on_block_complete(&mut self, height: u64, time: DateTime<Utc>) -> Result<Vec<ActiveValidator>, StakingError> {
        let ctx = BlockContext::new(height, time);
        self.execute("on_block_complete", |state| state.on_block_complete(&ctx))
    }

    /// Active set recorded at the last block completion
    pub fn active_set(&self) -> Result<Vec<ActiveValidator>, StakingError> {
        stored_active_set(self.store())
    }
}
