// Validator registry operations
// Creation, metadata edits, jailing and raw record maintenance

use crate::error::StakingError;
use crate::keeper::executor::Keeper;
use crate::keeper::reader::StakingReader;
use crate::keeper::state::{BlockContext, StakingState};
use crate::ledger::{AccountResolver, Ledger};
use crate::shares::Shares;
use crate::staking::{BondStatus, Commission, MsgCreateValidator, MsgEditValidator, Validator};
use crate::storage::{CommitStore, KvStore};
use crate::types::Address;
use tracing::info;

impl<S: KvStore + ?Sized> StakingState<'_, S> {
    /// Register a validator and bond its initial self-delegation
    pub fn create_validator(&mut self, ctx: &BlockContext, msg: &MsgCreateValidator) -> Result<Shares, StakingError> {
        let params = self.params()?;
        let operator = msg.operator_address;

        if self.has_validator(&operator)? {
            return Err(StakingError::ValidatorExists(operator));
        }
        msg.consensus_pubkey
            .verify()
            .map_err(|e| StakingError::InvalidArgument(e.to_string()))?;
        if let Some(existing) = self.get_validator_by_cons_addr(&msg.consensus_pubkey.address())? {
            return Err(StakingError::ConsensusKeyInUse(existing.operator_address));
        }

        msg.description.validate()?;
        msg.commission.validate()?;
        if msg.commission.rate < params.min_commission_rate {
            return Err(StakingError::InvalidArgument(format!(
                "commission rate {} below minimum {}",
                msg.commission.rate, params.min_commission_rate
            )));
        }
        if msg.min_self_delegation == 0 {
            return Err(StakingError::InvalidArgument(
                "minimum self delegation must be positive".into(),
            ));
        }
        if msg.value < msg.min_self_delegation {
            return Err(StakingError::InvalidArgument(format!(
                "self delegation {} below minimum {}",
                msg.value, msg.min_self_delegation
            )));
        }

        let validator = Validator::new(
            operator,
            msg.consensus_pubkey,
            msg.description.clone(),
            Commission::new(msg.commission.clone(), ctx.time),
            msg.min_self_delegation,
        );
        self.set_validator(&validator)?;

        let shares = self.delegate(operator, msg.value, BondStatus::Unbonded, &operator, true)?;
        info!("Validator {} created with self delegation {}", operator, msg.value);
        Ok(shares)
    }

    /// Update description, commission rate or minimum self delegation
    pub fn edit_validator(
        &mut self,
        ctx: &BlockContext,
        operator: &Address,
        msg: &MsgEditValidator,
    ) -> Result<Validator, StakingError> {
        let mut validator = self.must_get_validator(operator)?;

        if let Some(description) = &msg.description {
            description.validate()?;
            validator.description = description.clone();
        }

        if let Some(rate) = msg.commission_rate {
            let params = self.params()?;
            validator.commission.validate_new_rate(rate, ctx.time)?;
            if rate < params.min_commission_rate {
                return Err(StakingError::InvalidArgument(format!(
                    "commission rate {} below minimum {}",
                    rate, params.min_commission_rate
                )));
            }
            validator.commission.rates.rate = rate;
            validator.commission.update_time = ctx.time;
        }

        if let Some(min_self_delegation) = msg.min_self_delegation {
            if min_self_delegation <= validator.min_self_delegation {
                return Err(StakingError::InvalidArgument(
                    "minimum self delegation can only be increased".into(),
                ));
            }
            if min_self_delegation > validator.tokens {
                return Err(StakingError::InvalidArgument(format!(
                    "minimum self delegation {} exceeds validator tokens {}",
                    min_self_delegation, validator.tokens
                )));
            }
            validator.min_self_delegation = min_self_delegation;
        }

        self.set_validator(&validator)?;
        info!("Validator {} edited", operator);
        Ok(validator)
    }

    /// Remove a validator from the power index until unjailed
    pub fn jail(&mut self, operator: &Address) -> Result<(), StakingError> {
        let mut validator = self.must_get_validator(operator)?;
        if validator.jailed {
            return Err(StakingError::ValidatorJailed(*operator));
        }
        validator.jailed = true;
        self.set_validator(&validator)?;
        info!("Validator {} jailed", operator);
        Ok(())
    }

    pub fn unjail(&mut self, operator: &Address) -> Result<(), StakingError> {
        let mut validator = self.must_get_validator(operator)?;
        if !validator.jailed {
            return Err(StakingError::InvalidState(format!("validator {} is not jailed", operator)));
        }

        let self_bond = match self.get_delegation(operator, operator)? {
            Some(delegation) => validator.tokens_from_shares(delegation.shares)?,
            None => 0,
        };
        if self_bond < validator.min_self_delegation {
            return Err(StakingError::InvalidState(format!(
                "self delegation {} below minimum {}",
                self_bond, validator.min_self_delegation
            )));
        }

        validator.jailed = false;
        self.set_validator(&validator)?;
        info!("Validator {} unjailed", operator);
        Ok(())
    }
}

impl<S: CommitStore, L: Ledger, A: AccountResolver> Keeper<S, L, A> {
    /// Upsert a validator record as-is, reindexing it
    pub fn set_validator(&mut self, validator: Validator) -> Result<(), StakingError> {
        self.execute("set_validator", |state| state.set_validator(&validator))
    }

    pub fn set_validator_by_power_index(&mut self, operator: &Address) -> Result<(), StakingError> {
        self.execute("set_validator_by_power_index", |state| {
            let validator = state.must_get_validator(operator)?;
            state.set_validator_by_power_index(&validator);
            Ok(())
        })
    }

    pub fn remove_validator_by_power_index(&mut self, operator: &Address) -> Result<(), StakingError> {
        self.execute("remove_validator_by_power_index", |state| {
            let validator = state.must_get_validator(operator)?;
            state.remove_validator_by_power_index(&validator);
            Ok(())
        })
    }

    /// Create a validator, returning the shares of its self delegation
    pub fn create_validator(&mut self, ctx: &BlockContext, msg: MsgCreateValidator) -> Result<Shares, StakingError> {
        self.execute("create_validator", |state| state.create_validator(ctx, &msg))
    }

    pub fn edit_validator(
        &mut self,
        ctx: &BlockContext,
        operator: &Address,
        msg: MsgEditValidator,
    ) -> Result<Validator, StakingError> {
        self.execute("edit_validator", |state| state.edit_validator(ctx, operator, &msg))
    }

    pub fn jail(&mut self, operator: &Address) -> Result<(), StakingError> {
        self.execute("jail", |state| state.jail(operator))
    }

    pub fn unjail(&mut self, operator: &Address) -> Result<(), StakingError> {
        self.execute("unjail", |state| state.unjail(operator))
    }
}
