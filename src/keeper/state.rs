// Per-operation staking state
//
// A StakingState wraps the write cache of one keeper operation together with
// the ledger transfers that operation requests. Nothing reaches the committed
// store or the ledger until the keeper commits both.

use crate::error::StakingError;
use crate::keeper::queue::QueuedEntry;
use crate::keeper::reader::StakingReader;
use crate::ledger::{ModulePool, Transfer};
use crate::staking::{Delegation, Params, Redelegation, UnbondingDelegation, Validator};
use crate::storage::{codec, keys, CacheStore, KvPair, KvStore, StoreError, WriteBatch};
use crate::types::{Address, Amount};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::time::Duration;

/// Height and time of the block an operation executes in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockContext {
    pub height: u64,
    pub time: DateTime<Utc>,
}

impl BlockContext {
    pub fn new(height: u64, time: DateTime<Utc>) -> Self {
        Self { height, time }
    }

    /// Time `delay` after this block
    pub fn time_after(&self, delay: Duration) -> Result<DateTime<Utc>, StakingError> {
        TimeDelta::from_std(delay)
            .ok()
            .and_then(|delta| self.time.checked_add_signed(delta))
            .ok_or_else(|| StakingError::InvalidArgument(format!("delay {:?} out of range", delay)))
    }
}

/// Resolved addresses of the module pools
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolAccounts {
    pub bonded: Address,
    pub not_bonded: Address,
}

impl PoolAccounts {
    pub fn address(&self, pool: ModulePool) -> Address {
        match pool {
            ModulePool::Bonded => self.bonded,
            ModulePool::NotBonded => self.not_bonded,
        }
    }
}

/// Pool holding the tokens of a validator in the given status
pub fn pool_for(validator: &Validator) -> ModulePool {
    if validator.is_bonded() {
        ModulePool::Bonded
    } else {
        ModulePool::NotBonded
    }
}

pub struct StakingState<'a, S: KvStore + ?Sized> {
    cache: CacheStore<'a, S>,
    pools: PoolAccounts,
    power_reduction: Amount,
    transfers: Vec<Transfer>,
}

impl<'a, S: KvStore + ?Sized> StakingState<'a, S> {
    pub fn new(parent: &'a S, pools: PoolAccounts, power_reduction: Amount) -> Self {
        Self {
            cache: CacheStore::new(parent),
            pools,
            power_reduction,
            transfers: Vec::new(),
        }
    }

    pub fn power_reduction(&self) -> Amount {
        self.power_reduction
    }

    pub fn pools(&self) -> &PoolAccounts {
        &self.pools
    }

    /// Transfers requested so far
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    /// Split into the pending writes and the requested transfers
    pub fn into_parts(self) -> (WriteBatch, Vec<Transfer>) {
        (self.cache.into_batch(), self.transfers)
    }

    fn write<T: Serialize>(&mut self, key: Vec<u8>, value: &T) -> Result<(), StoreError> {
        let bytes = codec::encode(value)?;
        self.cache.set(key, bytes);
        Ok(())
    }

    // ========================================================================
    // TRANSFERS
    // ========================================================================

    fn push_transfer(&mut self, transfer: Transfer) {
        if transfer.amount() > 0 {
            self.transfers.push(transfer);
        }
    }

    pub fn move_to_module(&mut self, account: Address, pool: ModulePool, amount: Amount) {
        let pool = self.pools.address(pool);
        self.push_transfer(Transfer::ToModule {
            account,
            pool,
            amount,
        });
    }

    pub fn move_between_pools(&mut self, src: ModulePool, dst: ModulePool, amount: Amount) {
        if src == dst {
            return;
        }
        let (src, dst) = (self.pools.address(src), self.pools.address(dst));
        self.push_transfer(Transfer::BetweenPools { src, dst, amount });
    }

    pub fn move_from_module(&mut self, pool: ModulePool, account: Address, amount: Amount) {
        let pool = self.pools.address(pool);
        self.push_transfer(Transfer::FromModule {
            pool,
            account,
            amount,
        });
    }

    pub fn burn(&mut self, pool: ModulePool, amount: Amount) {
        let pool = self.pools.address(pool);
        self.push_transfer(Transfer::Burn { pool, amount });
    }

    // ========================================================================
    // SINGLETONS
    // ========================================================================

    pub fn set_params(&mut self, params: &Params) -> Result<(), StakingError> {
        params.validate()?;
        self.write(keys::params_key(), params)?;
        Ok(())
    }

    pub fn set_last_completed_height(&mut self, height: u64) -> Result<(), StakingError> {
        self.write(keys::last_completed_height_key(), &height)?;
        Ok(())
    }

    /// Allocate the next unbonding id (ids start at 1)
    pub fn next_unbonding_id(&mut self) -> Result<u64, StakingError> {
        let id: u64 = self.read(&keys::next_unbonding_id_key())?.unwrap_or(1);
        self.write(keys::next_unbonding_id_key(), &(id + 1))?;
        Ok(id)
    }

    pub fn set_next_unbonding_id(&mut self, id: u64) -> Result<(), StakingError> {
        self.write(keys::next_unbonding_id_key(), &id)?;
        Ok(())
    }

    // ========================================================================
    // VALIDATOR RECORDS
    // ========================================================================

    /// Fetch a validator or fail with NotFound
    pub fn must_get_validator(&self, operator: &Address) -> Result<Validator, StakingError> {
        self.get_validator(operator)?
            .ok_or(StakingError::ValidatorNotFound(*operator))
    }

    pub fn set_validator_by_power_index(&mut self, validator: &Validator) {
        let key = keys::validator_by_power_key(validator.tokens, &validator.operator_address);
        self.cache.set(key, Vec::new());
    }

    pub fn remove_validator_by_power_index(&mut self, validator: &Validator) {
        let key = keys::validator_by_power_key(validator.tokens, &validator.operator_address);
        self.cache.delete(key);
    }

    /// Upsert a validator and bring its index entries in line with it
    ///
    /// The only place power index entries are written: the previous entry is
    /// removed and a new one inserted unless the validator is jailed.
    pub fn set_validator(&mut self, validator: &Validator) -> Result<(), StakingError> {
        if let Some(previous) = self.get_validator(&validator.operator_address)? {
            self.remove_validator_by_power_index(&previous);
            if previous.consensus_pubkey != validator.consensus_pubkey {
                self.cache
                    .delete(keys::validator_by_cons_addr_key(&previous.consensus_address()));
            }
        }
        if !validator.jailed {
            self.set_validator_by_power_index(validator);
        }
        self.cache.set(
            keys::validator_by_cons_addr_key(&validator.consensus_address()),
            validator.operator_address.as_bytes().to_vec(),
        );
        self.write(keys::validator_key(&validator.operator_address), validator)?;
        Ok(())
    }

    /// Delete a validator and every index entry pointing at it
    pub fn remove_validator(&mut self, operator: &Address) -> Result<(), StakingError> {
        let validator = self.must_get_validator(operator)?;
        self.remove_validator_by_power_index(&validator);
        self.cache
            .delete(keys::validator_by_cons_addr_key(&validator.consensus_address()));
        self.cache.delete(keys::last_validator_power_key(operator));
        self.cache.delete(keys::validator_key(operator));
        Ok(())
    }

    pub fn set_last_validator_power(&mut self, operator: &Address, power: u64) -> Result<(), StakingError> {
        self.write(keys::last_validator_power_key(operator), &power)?;
        Ok(())
    }

    pub fn delete_last_validator_power(&mut self, operator: &Address) {
        self.cache.delete(keys::last_validator_power_key(operator));
    }

    // ========================================================================
    // DELEGATION RECORDS
    // ========================================================================

    pub fn set_delegation(&mut self, delegation: &Delegation) -> Result<(), StakingError> {
        let (del, val) = (&delegation.delegator_address, &delegation.validator_address);
        self.cache
            .set(keys::delegation_by_validator_key(val, del), Vec::new());
        self.write(keys::delegation_key(del, val), delegation)?;
        Ok(())
    }

    pub fn remove_delegation(&mut self, delegator: &Address, validator: &Address) {
        self.cache
            .delete(keys::delegation_by_validator_key(validator, delegator));
        self.cache.delete(keys::delegation_key(delegator, validator));
    }

    /// Store an unbonding delegation, deleting it once it has no entries
    pub fn set_unbonding_delegation(&mut self, ubd: &UnbondingDelegation) -> Result<(), StakingError> {
        let (del, val) = (&ubd.delegator_address, &ubd.validator_address);
        if ubd.is_empty() {
            self.cache
                .delete(keys::unbonding_delegation_by_validator_key(val, del));
            self.cache.delete(keys::unbonding_delegation_key(del, val));
            return Ok(());
        }
        self.cache
            .set(keys::unbonding_delegation_by_validator_key(val, del), Vec::new());
        self.write(keys::unbonding_delegation_key(del, val), ubd)?;
        Ok(())
    }

    /// Store a redelegation, deleting it once it has no entries
    pub fn set_redelegation(&mut self, red: &Redelegation) -> Result<(), StakingError> {
        let del = &red.delegator_address;
        let src = &red.validator_src_address;
        let dst = &red.validator_dst_address;
        if red.is_empty() {
            self.cache.delete(keys::redelegation_by_src_key(src, del, dst));
            self.cache.delete(keys::redelegation_by_dst_key(dst, del, src));
            self.cache.delete(keys::redelegation_key(del, src, dst));
            return Ok(());
        }
        self.cache
            .set(keys::redelegation_by_src_key(src, del, dst), Vec::new());
        self.cache
            .set(keys::redelegation_by_dst_key(dst, del, src), Vec::new());
        self.write(keys::redelegation_key(del, src, dst), red)?;
        Ok(())
    }

    // ========================================================================
    // QUEUES
    // ========================================================================

    pub fn insert_unbonding_queue(
        &mut self,
        completion_time: &DateTime<Utc>,
        unbonding_id: u64,
        entry: &QueuedEntry,
    ) -> Result<(), StakingError> {
        self.write(keys::unbonding_queue_key(completion_time, unbonding_id), entry)?;
        Ok(())
    }

    pub fn insert_validator_queue(&mut self, validator: &Validator) {
        self.cache.set(
            keys::validator_queue_key(&validator.unbonding_time, &validator.operator_address),
            Vec::new(),
        );
    }

    pub fn delete_validator_queue(&mut self, validator: &Validator) {
        self.cache.delete(keys::validator_queue_key(
            &validator.unbonding_time,
            &validator.operator_address,
        ));
    }

    pub fn delete_key(&mut self, key: Vec<u8>) {
        self.cache.delete(key);
    }
}

impl<S: KvStore + ?Sized> KvStore for StakingState<'_, S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.cache.get(key)
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>, StoreError> {
        self.cache.range(start, end)
    }
}
