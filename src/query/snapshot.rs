// Query snapshot
//
// A frozen copy of committed state. Every listing walks a key prefix in
// ascending key order, so identical snapshots always give identical answers.

use crate::error::StakingError;
use crate::keeper::{stored_active_set, StakingReader};
use crate::query::pagination::paginate;
use crate::query::types::*;
use crate::staking::{ActiveValidator, Delegation, Redelegation, Validator};
use crate::storage::{keys, KvStore, MemStore};
use crate::types::{Address, Amount, ADDRESS_LEN};
use sha2::{Digest, Sha256};

/// Immutable point-in-time view of staking state
#[derive(Clone, Debug)]
pub struct Snapshot {
    store: MemStore,
    power_reduction: Amount,
}

impl Snapshot {
    pub fn new(store: MemStore, power_reduction: Amount) -> Self {
        Self {
            store,
            power_reduction,
        }
    }

    pub fn store(&self) -> &MemStore {
        &self.store
    }

    pub fn power_reduction(&self) -> Amount {
        self.power_reduction
    }

    fn must_get_validator(&self, operator: &Address) -> Result<Validator, StakingError> {
        self.store
            .get_validator(operator)?
            .ok_or(StakingError::ValidatorNotFound(*operator))
    }

    fn delegation_response(&self, delegation: Delegation) -> Result<DelegationResponse, StakingError> {
        let validator = self.must_get_validator(&delegation.validator_address)?;
        let balance = validator.tokens_from_shares(delegation.shares)?;
        Ok(DelegationResponse {
            delegation,
            balance,
        })
    }

    pub fn params(&self, _req: &QueryParamsRequest) -> Result<QueryParamsResponse, StakingError> {
        Ok(QueryParamsResponse {
            params: self.store.params()?,
        })
    }

    pub fn validator(&self, req: &QueryValidatorRequest) -> Result<QueryValidatorResponse, StakingError> {
        Ok(QueryValidatorResponse {
            validator: self.must_get_validator(&req.validator_addr)?,
        })
    }

    /// Validators in operator address order, optionally filtered by status
    pub fn validators(&self, req: &QueryValidatorsRequest) -> Result<QueryValidatorsResponse, StakingError> {
        let items: Vec<(Vec<u8>, Validator)> = self
            .store
            .read_prefix(&keys::validators_prefix())?
            .into_iter()
            .filter(|(_, v): &(Vec<u8>, Validator)| req.status.map_or(true, |s| v.status == s))
            .collect();
        let (validators, pagination) = paginate(items, req.pagination.as_ref());
        Ok(QueryValidatorsResponse {
            validators,
            pagination,
        })
    }

    /// Delegations to a validator in delegator address order
    pub fn validator_delegations(
        &self,
        req: &QueryValidatorDelegationsRequest,
    ) -> Result<QueryValidatorDelegationsResponse, StakingError> {
        let validator = self.must_get_validator(&req.validator_addr)?;
        let index = self
            .store
            .scan_prefix(&keys::delegations_by_validator_prefix(&req.validator_addr))?;

        let mut items = Vec::with_capacity(index.len());
        for (key, _) in index {
            let delegator = keys::address_at(&key, 1 + ADDRESS_LEN)?;
            let delegation = self
                .store
                .get_delegation(&delegator, &req.validator_addr)?
                .ok_or(StakingError::DelegationNotFound {
                    delegator,
                    validator: req.validator_addr,
                })?;
            items.push((key, delegation));
        }

        let (page, pagination) = paginate(items, req.pagination.as_ref());
        let delegation_responses = page
            .into_iter()
            .map(|delegation| -> Result<DelegationResponse, StakingError> {
                let balance = validator.tokens_from_shares(delegation.shares)?;
                Ok(DelegationResponse {
                    delegation,
                    balance,
                })
            })
            .collect::<Result<Vec<_>, StakingError>>()?;

        Ok(QueryValidatorDelegationsResponse {
            delegation_responses,
            pagination,
        })
    }

    /// Unbonding delegations from a validator in delegator address order
    pub fn validator_unbonding_delegations(
        &self,
        req: &QueryValidatorUnbondingDelegationsRequest,
    ) -> Result<QueryValidatorUnbondingDelegationsResponse, StakingError> {
        self.must_get_validator(&req.validator_addr)?;
        let index = self
            .store
            .scan_prefix(&keys::unbonding_delegations_by_validator_prefix(&req.validator_addr))?;

        let mut items = Vec::with_capacity(index.len());
        for (key, _) in index {
            let delegator = keys::address_at(&key, 1 + ADDRESS_LEN)?;
            let ubd = self
                .store
                .get_unbonding_delegation(&delegator, &req.validator_addr)?
                .ok_or(StakingError::UnbondingDelegationNotFound {
                    delegator,
                    validator: req.validator_addr,
                })?;
            items.push((key, ubd));
        }

        let (unbonding_responses, pagination) = paginate(items, req.pagination.as_ref());
        Ok(QueryValidatorUnbondingDelegationsResponse {
            unbonding_responses,
            pagination,
        })
    }

    pub fn delegation(&self, req: &QueryDelegationRequest) -> Result<QueryDelegationResponse, StakingError> {
        let delegation = self
            .store
            .get_delegation(&req.delegator_addr, &req.validator_addr)?
            .ok_or(StakingError::DelegationNotFound {
                delegator: req.delegator_addr,
                validator: req.validator_addr,
            })?;
        Ok(QueryDelegationResponse {
            delegation_response: self.delegation_response(delegation)?,
        })
    }

    pub fn unbonding_delegation(
        &self,
        req: &QueryUnbondingDelegationRequest,
    ) -> Result<QueryUnbondingDelegationResponse, StakingError> {
        let unbond = self
            .store
            .get_unbonding_delegation(&req.delegator_addr, &req.validator_addr)?
            .ok_or(StakingError::UnbondingDelegationNotFound {
                delegator: req.delegator_addr,
                validator: req.validator_addr,
            })?;
        Ok(QueryUnbondingDelegationResponse { unbond })
    }

    /// Delegations of one delegator in validator address order
    pub fn delegator_delegations(
        &self,
        req: &QueryDelegatorDelegationsRequest,
    ) -> Result<QueryDelegatorDelegationsResponse, StakingError> {
        let items = self
            .store
            .read_prefix(&keys::delegations_by_delegator_prefix(&req.delegator_addr))?;
        let (page, pagination) = paginate(items, req.pagination.as_ref());
        let delegation_responses = page
            .into_iter()
            .map(|delegation| self.delegation_response(delegation))
            .collect::<Result<Vec<_>, StakingError>>()?;
        Ok(QueryDelegatorDelegationsResponse {
            delegation_responses,
            pagination,
        })
    }

    /// Redelegations of one delegator ordered by source then destination
    pub fn redelegations(&self, req: &QueryRedelegationsRequest) -> Result<QueryRedelegationsResponse, StakingError> {
        let prefix = match &req.src_validator_addr {
            Some(src) => {
                let mut prefix = keys::redelegations_by_delegator_prefix(&req.delegator_addr);
                prefix.extend_from_slice(src.as_bytes());
                prefix
            }
            None => keys::redelegations_by_delegator_prefix(&req.delegator_addr),
        };
        let items: Vec<(Vec<u8>, Redelegation)> = self
            .store
            .read_prefix(&prefix)?
            .into_iter()
            .filter(|(_, r): &(Vec<u8>, Redelegation)| {
                req.dst_validator_addr
                    .map_or(true, |dst| r.validator_dst_address == dst)
            })
            .collect();
        let (redelegation_responses, pagination) = paginate(items, req.pagination.as_ref());
        Ok(QueryRedelegationsResponse {
            redelegation_responses,
            pagination,
        })
    }

    /// Pool totals derived from validator tokens and pending unbondings
    pub fn pool(&self, _req: &QueryPoolRequest) -> Result<QueryPoolResponse, StakingError> {
        let mut pool = Pool::default();
        for validator in self.store.get_all_validators()? {
            if validator.is_bonded() {
                pool.bonded_tokens += validator.tokens;
            } else {
                pool.not_bonded_tokens += validator.tokens;
            }
        }
        for ubd in self.store.get_all_unbonding_delegations()? {
            pool.not_bonded_tokens += ubd.total_balance();
        }
        Ok(QueryPoolResponse { pool })
    }

    /// Active set recorded at the last block completion
    pub fn active_set(&self) -> Result<Vec<ActiveValidator>, StakingError> {
        stored_active_set(&self.store)
    }

    /// Hex SHA-256 over every key and value, in key order
    pub fn state_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for (key, value) in self.store.iter() {
            hasher.update((key.len() as u64).to_be_bytes());
            hasher.update(key);
            hasher.update((value.len() as u64).to_be_bytes());
            hasher.update(value);
        }
        hex::encode(hasher.finalize())
    }
}
