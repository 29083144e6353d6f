// Typed reads over any staking store
//
// Implemented for every KvStore, so the keeper's write cache, the committed
// store and query snapshots all decode records the same way.

use crate::keeper::queue::QueuedEntry;
use crate::staking::{
    Delegation, LastValidatorPower, Params, Redelegation, UnbondingDelegation, Validator,
};
use crate::storage::{codec, keys, prefix_end, KvStore, StoreError};
use crate::types::{Address, ADDRESS_LEN};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

fn dangling(key: &[u8]) -> StoreError {
    StoreError::DatabaseError(format!("index entry {} has no record", hex::encode(key)))
}

pub trait StakingReader: KvStore {
    /// Decode the record stored under `key`
    fn read<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Decode every record under `prefix`, keeping the keys
    fn read_prefix<T: DeserializeOwned>(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, T)>, StoreError> {
        self.scan_prefix(prefix)?
            .into_iter()
            .map(|(key, value)| Ok((key, codec::decode(&value)?)))
            .collect()
    }

    /// Stored parameters, or the defaults if none were written
    fn params(&self) -> Result<Params, StoreError> {
        Ok(self.read(&keys::params_key())?.unwrap_or_default())
    }

    fn last_completed_height(&self) -> Result<Option<u64>, StoreError> {
        self.read(&keys::last_completed_height_key())
    }

    // ------------------------------------------------------------------------
    // Validators
    // ------------------------------------------------------------------------

    fn get_validator(&self, operator: &Address) -> Result<Option<Validator>, StoreError> {
        self.read(&keys::validator_key(operator))
    }

    fn has_validator(&self, operator: &Address) -> Result<bool, StoreError> {
        self.has(&keys::validator_key(operator))
    }

    fn get_validator_by_cons_addr(&self, cons_addr: &Address) -> Result<Option<Validator>, StoreError> {
        let key = keys::validator_by_cons_addr_key(cons_addr);
        match self.get(&key)? {
            Some(operator) => {
                let operator = keys::address_at(&operator, 0)?;
                self.get_validator(&operator)?.ok_or_else(|| dangling(&key)).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Every validator in operator address order
    fn get_all_validators(&self) -> Result<Vec<Validator>, StoreError> {
        Ok(self
            .read_prefix(&keys::validators_prefix())?
            .into_iter()
            .map(|(_, v)| v)
            .collect())
    }

    /// Operators in power index order (tokens descending, operator ascending)
    fn validators_by_power(&self) -> Result<Vec<Address>, StoreError> {
        self.scan_prefix(&keys::validators_by_power_prefix())?
            .iter()
            .map(|(key, _)| keys::operator_from_power_key(key))
            .collect()
    }

    /// Up to `max` bonded validators in power index order
    fn get_bonded_validators_by_power(&self, max: usize) -> Result<Vec<Validator>, StoreError> {
        let mut bonded = Vec::new();
        for operator in self.validators_by_power()? {
            if bonded.len() >= max {
                break;
            }
            let validator = self
                .get_validator(&operator)?
                .ok_or_else(|| dangling(&keys::validator_key(&operator)))?;
            if validator.is_bonded() {
                bonded.push(validator);
            }
        }
        Ok(bonded)
    }

    fn get_last_validator_power(&self, operator: &Address) -> Result<Option<u64>, StoreError> {
        self.read(&keys::last_validator_power_key(operator))
    }

    fn get_last_validator_powers(&self) -> Result<Vec<LastValidatorPower>, StoreError> {
        self.read_prefix::<u64>(&keys::last_validator_powers_prefix())?
            .into_iter()
            .map(|(key, power)| {
                Ok(LastValidatorPower {
                    address: keys::address_at(&key, 1)?,
                    power,
                })
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Delegations
    // ------------------------------------------------------------------------

    fn get_delegation(&self, delegator: &Address, validator: &Address) -> Result<Option<Delegation>, StoreError> {
        self.read(&keys::delegation_key(delegator, validator))
    }

    /// Delegations to `validator`, ordered by delegator
    fn get_validator_delegations(&self, validator: &Address) -> Result<Vec<Delegation>, StoreError> {
        let mut delegations = Vec::new();
        for (key, _) in self.scan_prefix(&keys::delegations_by_validator_prefix(validator))? {
            let delegator = keys::address_at(&key, 1 + ADDRESS_LEN)?;
            let delegation = self
                .get_delegation(&delegator, validator)?
                .ok_or_else(|| dangling(&key))?;
            delegations.push(delegation);
        }
        Ok(delegations)
    }

    fn get_delegator_delegations(&self, delegator: &Address) -> Result<Vec<Delegation>, StoreError> {
        Ok(self
            .read_prefix(&keys::delegations_by_delegator_prefix(delegator))?
            .into_iter()
            .map(|(_, d)| d)
            .collect())
    }

    fn get_all_delegations(&self) -> Result<Vec<Delegation>, StoreError> {
        Ok(self
            .read_prefix(&keys::delegations_prefix())?
            .into_iter()
            .map(|(_, d)| d)
            .collect())
    }

    // ------------------------------------------------------------------------
    // Unbonding delegations
    // ------------------------------------------------------------------------

    fn get_unbonding_delegation(
        &self,
        delegator: &Address,
        validator: &Address,
    ) -> Result<Option<UnbondingDelegation>, StoreError> {
        self.read(&keys::unbonding_delegation_key(delegator, validator))
    }

    fn get_validator_unbonding_delegations(&self, validator: &Address) -> Result<Vec<UnbondingDelegation>, StoreError> {
        let mut records = Vec::new();
        for (key, _) in self.scan_prefix(&keys::unbonding_delegations_by_validator_prefix(validator))? {
            let delegator = keys::address_at(&key, 1 + ADDRESS_LEN)?;
            let record = self
                .get_unbonding_delegation(&delegator, validator)?
                .ok_or_else(|| dangling(&key))?;
            records.push(record);
        }
        Ok(records)
    }

    fn get_all_unbonding_delegations(&self) -> Result<Vec<UnbondingDelegation>, StoreError> {
        Ok(self
            .read_prefix(&keys::unbonding_delegations_prefix())?
            .into_iter()
            .map(|(_, u)| u)
            .collect())
    }

    // ------------------------------------------------------------------------
    // Redelegations
    // ------------------------------------------------------------------------

    fn get_redelegation(
        &self,
        delegator: &Address,
        src: &Address,
        dst: &Address,
    ) -> Result<Option<Redelegation>, StoreError> {
        self.read(&keys::redelegation_key(delegator, src, dst))
    }

    /// Redelegations out of `src`, ordered by delegator then destination
    fn get_redelegations_from_src(&self, src: &Address) -> Result<Vec<Redelegation>, StoreError> {
        let mut records = Vec::new();
        for (key, _) in self.scan_prefix(&keys::redelegations_by_src_prefix(src))? {
            let delegator = keys::address_at(&key, 1 + ADDRESS_LEN)?;
            let dst = keys::address_at(&key, 1 + 2 * ADDRESS_LEN)?;
            let record = self
                .get_redelegation(&delegator, src, &dst)?
                .ok_or_else(|| dangling(&key))?;
            records.push(record);
        }
        Ok(records)
    }

    /// Whether `delegator` has an unmatured redelegation into `dst`
    fn has_receiving_redelegation(&self, delegator: &Address, dst: &Address) -> Result<bool, StoreError> {
        Ok(!self
            .scan_prefix(&keys::redelegations_by_dst_delegator_prefix(dst, delegator))?
            .is_empty())
    }

    fn get_delegator_redelegations(&self, delegator: &Address) -> Result<Vec<Redelegation>, StoreError> {
        Ok(self
            .read_prefix(&keys::redelegations_by_delegator_prefix(delegator))?
            .into_iter()
            .map(|(_, r)| r)
            .collect())
    }

    fn get_all_redelegations(&self) -> Result<Vec<Redelegation>, StoreError> {
        Ok(self
            .read_prefix(&keys::redelegations_prefix())?
            .into_iter()
            .map(|(_, r)| r)
            .collect())
    }

    // ------------------------------------------------------------------------
    // Queues
    // ------------------------------------------------------------------------

    /// Unbonding queue entries completing at or before `now`, in queue order
    fn matured_unbonding_queue(&self, now: &DateTime<Utc>) -> Result<Vec<(Vec<u8>, QueuedEntry)>, StoreError> {
        let end = prefix_end(&keys::unbonding_queue_time_prefix(now));
        self.range(&keys::unbonding_queue_prefix(), end.as_deref())?
            .into_iter()
            .map(|(key, value)| Ok((key, codec::decode(&value)?)))
            .collect()
    }

    /// Validator queue entries maturing at or before `now`
    fn matured_validator_queue(&self, now: &DateTime<Utc>) -> Result<Vec<(Vec<u8>, Address)>, StoreError> {
        let end = prefix_end(&keys::validator_queue_time_prefix(now));
        self.range(&keys::validator_queue_prefix(), end.as_deref())?
            .into_iter()
            .map(|(key, _)| {
                let operator = keys::operator_from_validator_queue_key(&key)?;
                Ok((key, operator))
            })
            .collect()
    }
}

impl<T: KvStore + ?Sized> StakingReader for T {}
