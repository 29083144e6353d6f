// State invariants
//
// Checked after every mutation when enabled. A failure means replicas could
// diverge, so the keeper treats it as fatal.

use crate::error::StakingError;
use crate::keeper::reader::StakingReader;
use crate::shares::Shares;
use crate::storage::keys;
use std::collections::BTreeMap;

fn violation(message: String) -> StakingError {
    StakingError::InvariantViolation(message)
}

/// Run every invariant check
pub fn check_all<R: StakingReader + ?Sized>(store: &R) -> Result<(), StakingError> {
    delegator_shares(store)?;
    power_index(store)?;
    unbonding_balances(store)?;
    Ok(())
}

/// Delegation shares to each validator sum to its `delegator_shares`, and an
/// empty validator has no shares outstanding
pub fn delegator_shares<R: StakingReader + ?Sized>(store: &R) -> Result<(), StakingError> {
    let mut sums: BTreeMap<_, Shares> = BTreeMap::new();
    for delegation in store.get_all_delegations()? {
        if delegation.shares.is_zero() {
            return Err(violation(format!(
                "delegation {} -> {} holds {} shares",
                delegation.delegator_address, delegation.validator_address, delegation.shares
            )));
        }
        let sum = sums.entry(delegation.validator_address).or_default();
        *sum = sum
            .checked_add(delegation.shares)
            .ok_or_else(|| violation("delegation share sum overflowed".into()))?;
    }

    for validator in store.get_all_validators()? {
        let operator = validator.operator_address;
        if validator.tokens == 0 && !validator.delegator_shares.is_zero() {
            return Err(violation(format!(
                "validator {} has {} shares but no tokens",
                operator, validator.delegator_shares
            )));
        }
        let delegated = sums.remove(&operator).unwrap_or_default();
        if delegated != validator.delegator_shares {
            return Err(violation(format!(
                "validator {} delegator shares {} but delegations sum to {}",
                operator, validator.delegator_shares, delegated
            )));
        }
    }

    if let Some(orphan) = sums.keys().next() {
        return Err(violation(format!("delegations exist to unknown validator {}", orphan)));
    }
    Ok(())
}

/// Every power index entry matches its validator's current tokens
pub fn power_index<R: StakingReader + ?Sized>(store: &R) -> Result<(), StakingError> {
    for (key, _) in store.scan_prefix(&keys::validators_by_power_prefix())? {
        let operator = keys::operator_from_power_key(&key)?;
        let validator = store
            .get_validator(&operator)?
            .ok_or_else(|| violation(format!("power index entry for unknown validator {}", operator)))?;
        if key != keys::validator_by_power_key(validator.tokens, &operator) {
            return Err(violation(format!(
                "stale power index entry for validator {} with {} tokens",
                operator, validator.tokens
            )));
        }
    }
    Ok(())
}

/// No unbonding entry pays out more than it started with
pub fn unbonding_balances<R: StakingReader + ?Sized>(store: &R) -> Result<(), StakingError> {
    for ubd in store.get_all_unbonding_delegations()? {
        for entry in &ubd.entries {
            if entry.balance > entry.initial_balance {
                return Err(violation(format!(
                    "unbonding {} balance {} exceeds initial balance {}",
                    entry.unbonding_id, entry.balance, entry.initial_balance
                )));
            }
        }
    }
    Ok(())
}
