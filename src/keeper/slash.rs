// Slashing hooks
//
// Burns a fraction of the stake that was bonded to a validator at the
// infraction height: the validator's own tokens, plus unbonding and
// redelegation entries created at or after that height. Shares are never
// reduced, so the share price drops.

use crate::error::StakingError;
use crate::keeper::executor::Keeper;
use crate::keeper::reader::StakingReader;
use crate::keeper::state::{pool_for, BlockContext, StakingState};
use crate::ledger::{AccountResolver, Ledger, ModulePool};
use crate::shares::amount_fraction;
use crate::staking::{Redelegation, UnbondingDelegation};
use crate::storage::{CommitStore, KvStore};
use crate::types::{tokens_from_consensus_power, Address, Amount};
use rust_decimal::Decimal;
use tracing::{info, warn};

impl<S: KvStore + ?Sized> StakingState<'_, S> {
    /// Slash the validator with consensus address `cons_addr`
    ///
    /// `power` is the validator's consensus power at the infraction. Returns
    /// the total tokens burned.
    pub fn slash(
        &mut self,
        ctx: &BlockContext,
        cons_addr: &Address,
        infraction_height: u64,
        power: u64,
        slash_factor: Decimal,
    ) -> Result<Amount, StakingError> {
        if slash_factor.is_sign_negative() || slash_factor >= Decimal::ONE {
            return Err(StakingError::InvalidArgument(format!(
                "slash factor {} must be within [0, 1)",
                slash_factor
            )));
        }
        if infraction_height > ctx.height {
            return Err(StakingError::InvalidState(format!(
                "infraction height {} is after current height {}",
                infraction_height, ctx.height
            )));
        }

        let mut validator = match self.get_validator_by_cons_addr(cons_addr)? {
            Some(validator) => validator,
            None => {
                warn!("Slash skipped: no validator for consensus address {}", cons_addr);
                return Ok(0);
            }
        };
        if validator.is_unbonded() {
            return Err(StakingError::InvalidState(format!(
                "cannot slash unbonded validator {}",
                validator.operator_address
            )));
        }

        let operator = validator.operator_address;
        let slash_amount = amount_fraction(tokens_from_consensus_power(power, self.power_reduction()), slash_factor)?;
        let mut remaining = slash_amount;
        let mut burned: Amount = 0;

        if infraction_height < ctx.height {
            for ubd in self.get_validator_unbonding_delegations(&operator)? {
                let (charged, burnt) = self.slash_unbonding_delegation(ctx, ubd, infraction_height, slash_factor)?;
                remaining = remaining.saturating_sub(charged);
                burned += burnt;
            }
            for red in self.get_redelegations_from_src(&operator)? {
                let (charged, burnt) = self.slash_redelegation(ctx, red, infraction_height, slash_factor)?;
                remaining = remaining.saturating_sub(charged);
                burned += burnt;
            }
            // Redelegation slashing may have changed this validator's record
            validator = self.must_get_validator(&operator)?;
        }

        let cap = amount_fraction(validator.tokens, slash_factor)?;
        let from_validator = validator.remove_tokens(remaining.min(cap));
        if from_validator > 0 {
            self.burn(pool_for(&validator), from_validator);
            self.set_validator(&validator)?;
            burned += from_validator;
        }

        info!(
            "Validator {} slashed at height {} by factor {}: burned {} tokens",
            operator, infraction_height, slash_factor, burned
        );
        Ok(burned)
    }

    /// Returns (amount charged against the slash, tokens burned)
    fn slash_unbonding_delegation(
        &mut self,
        ctx: &BlockContext,
        mut ubd: UnbondingDelegation,
        infraction_height: u64,
        slash_factor: Decimal,
    ) -> Result<(Amount, Amount), StakingError> {
        let mut charged = 0;
        let mut burned = 0;
        for entry in ubd.entries.iter_mut() {
            if entry.creation_height < infraction_height || entry.is_mature(ctx.time) {
                continue;
            }
            let amount = amount_fraction(entry.initial_balance, slash_factor)?;
            charged += amount;
            let cut = amount.min(entry.balance);
            entry.balance -= cut;
            burned += cut;
        }
        if burned > 0 {
            self.burn(ModulePool::NotBonded, burned);
            self.set_unbonding_delegation(&ubd)?;
        }
        Ok((charged, burned))
    }

    /// Returns (amount charged against the slash, tokens burned)
    fn slash_redelegation(
        &mut self,
        ctx: &BlockContext,
        red: Redelegation,
        infraction_height: u64,
        slash_factor: Decimal,
    ) -> Result<(Amount, Amount), StakingError> {
        let delegator = red.delegator_address;
        let dst = red.validator_dst_address;
        let mut charged = 0;
        let mut burned = 0;

        for entry in &red.entries {
            if entry.creation_height < infraction_height || entry.is_mature(ctx.time) {
                continue;
            }
            charged += amount_fraction(entry.initial_balance, slash_factor)?;

            let wanted = entry.shares_dst.mul_fraction(slash_factor)?;
            if wanted.is_zero() {
                continue;
            }
            let held = match self.get_delegation(&delegator, &dst)? {
                Some(delegation) => delegation.shares,
                None => continue,
            };
            let shares = wanted.min(held);
            if shares.is_zero() {
                continue;
            }

            let dst_validator = self.must_get_validator(&dst)?;
            let tokens = self.unbond(&delegator, &dst, shares)?;
            self.burn(pool_for(&dst_validator), tokens);
            burned += tokens;
        }

        Ok((charged, burned))
    }
}

impl<S: CommitStore, L: Ledger, A: AccountResolver> Keeper<S, L, A> {
    /// Slash a validator, returning the total tokens burned
    pub fn slash(
        &mut self,
        ctx: &BlockContext,
        cons_addr: &Address,
        infraction_height: u64,
        power: u64,
        slash_factor: Decimal,
    ) -> Result<Amount, StakingError> {
        self.execute("slash", |state| {
            state.slash(ctx, cons_addr, infraction_height, power, slash_factor)
        })
    }
}
