// Delegate and undelegate
//
// Shares are issued and redeemed at the validator's current price. Tokens
// follow the validator's status: bonded validators keep theirs in the bonded
// pool, everything else sits in the not-bonded pool.

use crate::error::StakingError;
use crate::keeper::executor::Keeper;
use crate::keeper::queue::QueuedEntry;
use crate::keeper::reader::StakingReader;
use crate::keeper::state::{pool_for, BlockContext, StakingState};
use crate::ledger::{AccountResolver, Ledger, ModulePool};
use crate::shares::{ShareError, Shares};
use crate::staking::{BondStatus, Delegation, UnbondingDelegation, UnbondingDelegationEntry};
use crate::storage::{CommitStore, KvStore};
use crate::types::{Address, Amount};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

impl<S: KvStore + ?Sized> StakingState<'_, S> {
    /// Add `amount` tokens to `validator` on behalf of `delegator`
    ///
    /// With `subtract_account_balance` the tokens come from the delegator's
    /// account; otherwise they already sit in the pool matching
    /// `token_source` and move only if the validator's pool differs.
    pub fn delegate(
        &mut self,
        delegator: Address,
        amount: Amount,
        token_source: BondStatus,
        validator_address: &Address,
        subtract_account_balance: bool,
    ) -> Result<Shares, StakingError> {
        if amount == 0 {
            return Err(StakingError::InvalidArgument("delegation amount must be positive".into()));
        }
        let mut validator = self.must_get_validator(validator_address)?;
        if validator.jailed {
            return Err(StakingError::ValidatorJailed(*validator_address));
        }

        let destination = pool_for(&validator);
        if subtract_account_balance {
            if token_source == BondStatus::Bonded {
                return Err(StakingError::InvalidArgument(
                    "account tokens cannot come from the bonded pool".into(),
                ));
            }
            self.move_to_module(delegator, destination, amount);
        } else {
            let source = if token_source == BondStatus::Bonded {
                ModulePool::Bonded
            } else {
                ModulePool::NotBonded
            };
            self.move_between_pools(source, destination, amount);
        }

        let issued = validator.add_tokens_from_delegation(amount)?;
        let mut delegation = self
            .get_delegation(&delegator, validator_address)?
            .unwrap_or_else(|| Delegation::new(delegator, *validator_address, Shares::ZERO));
        delegation.shares = delegation
            .shares
            .checked_add(issued)
            .ok_or(ShareError::Overflow)?;

        self.set_delegation(&delegation)?;
        self.set_validator(&validator)?;

        debug!(
            "Delegated {} to validator {} from {} for {} shares",
            amount, validator_address, delegator, issued
        );
        Ok(issued)
    }

    /// Redeem `shares` of a delegation, returning the tokens released
    ///
    /// Jails the validator when its operator's self delegation falls below
    /// the minimum, and prunes an unbonded validator left without shares.
    pub fn unbond(
        &mut self,
        delegator: &Address,
        validator_address: &Address,
        shares: Shares,
    ) -> Result<Amount, StakingError> {
        if shares.is_zero() {
            return Err(StakingError::InvalidArgument("shares must be positive".into()));
        }
        let mut validator = self.must_get_validator(validator_address)?;
        let mut delegation = self.get_delegation(delegator, validator_address)?.ok_or(
            StakingError::DelegationNotFound {
                delegator: *delegator,
                validator: *validator_address,
            },
        )?;
        delegation.shares = delegation
            .shares
            .checked_sub(shares)
            .ok_or(StakingError::InsufficientShares {
                held: delegation.shares,
                requested: shares,
            })?;

        let is_operator = delegator == &validator.operator_address;
        if is_operator
            && !validator.jailed
            && validator.tokens_from_shares(delegation.shares)? < validator.min_self_delegation
        {
            validator.jailed = true;
            info!(
                "Validator {} jailed: self delegation below minimum {}",
                validator_address, validator.min_self_delegation
            );
        }

        if delegation.shares.is_zero() {
            self.remove_delegation(delegator, validator_address);
        } else {
            self.set_delegation(&delegation)?;
        }

        let amount = validator.remove_delegator_shares(shares)?;
        if validator.delegator_shares.is_zero() && validator.is_unbonded() {
            self.remove_validator(validator_address)?;
            info!("Validator {} pruned", validator_address);
        } else {
            self.set_validator(&validator)?;
        }

        Ok(amount)
    }

    /// Start unbonding `shares`, returning when the tokens will be paid out
    pub fn undelegate(
        &mut self,
        ctx: &BlockContext,
        delegator: &Address,
        validator_address: &Address,
        shares: Shares,
    ) -> Result<DateTime<Utc>, StakingError> {
        let params = self.params()?;
        let validator = self.must_get_validator(validator_address)?;

        let mut ubd = self
            .get_unbonding_delegation(delegator, validator_address)?
            .unwrap_or_else(|| UnbondingDelegation::new(*delegator, *validator_address));
        if ubd.entries.len() >= params.max_entries as usize {
            return Err(StakingError::MaxUnbondingEntries {
                max: params.max_entries,
            });
        }

        let amount = self.unbond(delegator, validator_address, shares)?;
        if validator.is_bonded() {
            self.move_between_pools(ModulePool::Bonded, ModulePool::NotBonded, amount);
        }

        let completion_time = ctx.time_after(params.unbonding_time)?;
        let unbonding_id = self.next_unbonding_id()?;
        ubd.add_entry(UnbondingDelegationEntry {
            creation_height: ctx.height,
            completion_time,
            initial_balance: amount,
            balance: amount,
            unbonding_id,
        });
        self.set_unbonding_delegation(&ubd)?;
        self.insert_unbonding_queue(
            &completion_time,
            unbonding_id,
            &QueuedEntry::Unbonding {
                delegator: *delegator,
                validator: *validator_address,
            },
        )?;

        info!(
            "Undelegation {} from validator {} by {} of {} tokens completes at {}",
            unbonding_id, validator_address, delegator, amount, completion_time
        );
        Ok(completion_time)
    }
}

impl<S: CommitStore, L: Ledger, A: AccountResolver> Keeper<S, L, A> {
    /// Delegate tokens, returning the shares issued
    pub fn delegate(
        &mut self,
        delegator: &Address,
        amount: Amount,
        token_source: BondStatus,
        validator: &Address,
        subtract_account_balance: bool,
    ) -> Result<Shares, StakingError> {
        self.execute("delegate", |state| {
            state.delegate(*delegator, amount, token_source, validator, subtract_account_balance)
        })
    }

    /// Undelegate shares, returning the completion time of the new entry
    pub fn undelegate(
        &mut self,
        ctx: &BlockContext,
        delegator: &Address,
        validator: &Address,
        shares: Shares,
    ) -> Result<DateTime<Utc>, StakingError> {
        self.execute("undelegate", |state| state.undelegate(ctx, delegator, validator, shares))
    }
}
