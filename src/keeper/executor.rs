// Keeper - owns the staking store and drives the ledger
//
// Every mutating operation runs through `execute`: the operation's writes go
// to a cache, its transfers are collected, invariants are checked, then the
// ledger and the store are committed. Any recoverable error drops the cache.
// Fatal errors latch `halted` and every later mutation fails with Halted.

use crate::config::KeeperConfig;
use crate::error::StakingError;
use crate::keeper::invariants;
use crate::keeper::reader::StakingReader;
use crate::keeper::state::{PoolAccounts, StakingState};
use crate::ledger::{AccountResolver, Ledger, ModuleAccounts, ModulePool};
use crate::query::Snapshot;
use crate::staking::{Delegation, Params, UnbondingDelegation, Validator};
use crate::storage::{keys, CommitStore};
use crate::types::Address;
use tracing::{debug, error, info};

/// The staking keeper
pub struct Keeper<S, L, A = ModuleAccounts> {
    store: S,
    ledger: L,
    accounts: A,
    config: KeeperConfig,
    halted: bool,
}

impl<S: CommitStore, L: Ledger> Keeper<S, L, ModuleAccounts> {
    /// Create a keeper using the default pool account derivation
    pub fn new(store: S, ledger: L, config: KeeperConfig) -> Result<Self, StakingError> {
        Self::with_accounts(store, ledger, ModuleAccounts, config)
    }
}

impl<S: CommitStore, L: Ledger, A: AccountResolver> Keeper<S, L, A> {
    /// Create a keeper with a custom account resolver
    ///
    /// Installs `config.params` if the store holds no parameters yet.
    pub fn with_accounts(
        store: S,
        ledger: L,
        accounts: A,
        config: KeeperConfig,
    ) -> Result<Self, StakingError> {
        config.validate()?;

        let mut keeper = Self {
            store,
            ledger,
            accounts,
            config,
            halted: false,
        };

        if !keeper.store.has(&keys::params_key())? {
            let params = keeper.config.params.clone();
            keeper.execute("init_params", |state| state.set_params(&params))?;
            info!(
                "Staking parameters installed: max_validators={}, max_entries={}, unbonding_time={:?}",
                params.max_validators, params.max_entries, params.unbonding_time
            );
        }

        Ok(keeper)
    }

    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Account address of a module pool
    pub fn pool_account(&self, pool: ModulePool) -> Address {
        self.accounts.pool_account(pool)
    }

    fn pools(&self) -> PoolAccounts {
        PoolAccounts {
            bonded: self.accounts.pool_account(ModulePool::Bonded),
            not_bonded: self.accounts.pool_account(ModulePool::NotBonded),
        }
    }

    /// Point-in-time read handle over committed state
    pub fn snapshot(&self) -> Result<Snapshot, StakingError> {
        Ok(Snapshot::new(self.store.snapshot()?, self.config.power_reduction))
    }

    fn halt(&mut self, operation: &str, err: StakingError) -> StakingError {
        error!("Staking halted during {}: {}", operation, err);
        self.halted = true;
        err
    }

    /// Run one operation all-or-nothing
    pub(crate) fn execute<T, F>(&mut self, operation: &str, f: F) -> Result<T, StakingError>
    where
        F: FnOnce(&mut StakingState<'_, S>) -> Result<T, StakingError>,
    {
        if self.halted {
            return Err(StakingError::Halted);
        }

        let check = self.config.check_invariants;
        let pools = self.pools();
        let outcome = {
            let mut state = StakingState::new(&self.store, pools, self.config.power_reduction);
            f(&mut state).and_then(|value| {
                if check {
                    invariants::check_all(&state)?;
                }
                Ok((value, state.into_parts()))
            })
        };

        let (value, (batch, transfers)) = match outcome {
            Ok(done) => done,
            Err(err) if err.is_fatal() => return Err(self.halt(operation, err)),
            Err(err) => {
                debug!("{} rejected: {}", operation, err);
                return Err(err);
            }
        };

        if let Err(err) = self.ledger.execute(&transfers) {
            let err = StakingError::from(err);
            if err.is_fatal() {
                return Err(self.halt(operation, err));
            }
            debug!("{} rejected by ledger: {}", operation, err);
            return Err(err);
        }

        if let Err(err) = self.store.apply(batch) {
            if transfers.is_empty() {
                return Err(StakingError::Storage(err));
            }
            return Err(self.halt(operation, StakingError::CommitFailed(err)));
        }

        debug!(
            "{} committed with {} transfer(s)",
            operation,
            transfers.len()
        );
        Ok(value)
    }

    /// Check every invariant against committed state, halting on violation
    pub fn check_invariants(&mut self) -> Result<(), StakingError> {
        if let Err(err) = invariants::check_all(&self.store) {
            return Err(self.halt("check_invariants", err));
        }
        Ok(())
    }

    // ========================================================================
    // READS OVER COMMITTED STATE
    // ========================================================================

    pub fn params(&self) -> Result<Params, StakingError> {
        Ok(self.store.params()?)
    }

    pub fn get_validator(&self, operator: &Address) -> Result<Validator, StakingError> {
        self.store
            .get_validator(operator)?
            .ok_or(StakingError::ValidatorNotFound(*operator))
    }

    pub fn has_validator(&self, operator: &Address) -> Result<bool, StakingError> {
        Ok(self.store.has_validator(operator)?)
    }

    pub fn get_all_validators(&self) -> Result<Vec<Validator>, StakingError> {
        Ok(self.store.get_all_validators()?)
    }

    /// Bonded validators in power order, capped at `max_validators`
    pub fn get_bonded_validators_by_power(&self) -> Result<Vec<Validator>, StakingError> {
        let max = self.store.params()?.max_validators as usize;
        Ok(self.store.get_bonded_validators_by_power(max)?)
    }

    pub fn get_delegation(&self, delegator: &Address, validator: &Address) -> Result<Delegation, StakingError> {
        self.store
            .get_delegation(delegator, validator)?
            .ok_or(StakingError::DelegationNotFound {
                delegator: *delegator,
                validator: *validator,
            })
    }

    pub fn get_unbonding_delegation(
        &self,
        delegator: &Address,
        validator: &Address,
    ) -> Result<UnbondingDelegation, StakingError> {
        self.store
            .get_unbonding_delegation(delegator, validator)?
            .ok_or(StakingError::UnbondingDelegationNotFound {
                delegator: *delegator,
                validator: *validator,
            })
    }

    /// Replace the module parameters
    pub fn set_params(&mut self, params: Params) -> Result<(), StakingError> {
        self.execute("set_params", |state| state.set_params(&params))?;
        info!("Staking parameters updated");
        Ok(())
    }
}
