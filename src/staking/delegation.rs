// Delegations, unbonding delegations and redelegations

use crate::shares::Shares;
use crate::types::{Address, Amount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shares a delegator holds in one validator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub delegator_address: Address,
    pub validator_address: Address,
    pub shares: Shares,
}

impl Delegation {
    pub fn new(delegator_address: Address, validator_address: Address, shares: Shares) -> Self {
        Self {
            delegator_address,
            validator_address,
            shares,
        }
    }
}

// ============================================================================
// UNBONDING DELEGATIONS
// ============================================================================

/// One in-flight withdrawal
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingDelegationEntry {
    pub creation_height: u64,
    pub completion_time: DateTime<Utc>,
    /// Tokens at creation, never reduced
    pub initial_balance: Amount,
    /// Tokens to pay out at maturity, reduced by slashing
    pub balance: Amount,
    /// Global creation sequence, also the queue tie-break
    pub unbonding_id: u64,
}

impl UnbondingDelegationEntry {
    pub fn is_mature(&self, now: DateTime<Utc>) -> bool {
        self.completion_time <= now
    }
}

/// All in-flight withdrawals of one delegator from one validator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingDelegation {
    pub delegator_address: Address,
    pub validator_address: Address,
    pub entries: Vec<UnbondingDelegationEntry>,
}

impl UnbondingDelegation {
    pub fn new(delegator_address: Address, validator_address: Address) -> Self {
        Self {
            delegator_address,
            validator_address,
            entries: Vec::new(),
        }
    }

    pub fn add_entry(&mut self, entry: UnbondingDelegationEntry) {
        self.entries.push(entry);
    }

    /// Remove the entry with the given id
    pub fn remove_entry(&mut self, unbonding_id: u64) -> Option<UnbondingDelegationEntry> {
        let idx = self.entries.iter().position(|e| e.unbonding_id == unbonding_id)?;
        Some(self.entries.remove(idx))
    }

    pub fn total_balance(&self) -> Amount {
        self.entries.iter().map(|e| e.balance).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// REDELEGATIONS
// ============================================================================

/// One in-flight move of stake between validators
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedelegationEntry {
    pub creation_height: u64,
    pub completion_time: DateTime<Utc>,
    pub initial_balance: Amount,
    /// Shares created at the destination, slashable until maturity
    pub shares_dst: Shares,
    pub unbonding_id: u64,
}

impl RedelegationEntry {
    pub fn is_mature(&self, now: DateTime<Utc>) -> bool {
        self.completion_time <= now
    }
}

/// All in-flight moves of one delegator from `src` to `dst`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redelegation {
    pub delegator_address: Address,
    pub validator_src_address: Address,
    pub validator_dst_address: Address,
    pub entries: Vec<RedelegationEntry>,
}

impl Redelegation {
    pub fn new(delegator: Address, src: Address, dst: Address) -> Self {
        Self {
            delegator_address: delegator,
            validator_src_address: src,
            validator_dst_address: dst,
            entries: Vec::new(),
        }
    }

    pub fn add_entry(&mut self, entry: RedelegationEntry) {
        self.entries.push(entry);
    }

    pub fn remove_entry(&mut self, unbonding_id: u64) -> Option<RedelegationEntry> {
        let idx = self.entries.iter().position(|e| e.unbonding_id == unbonding_id)?;
        Some(self.entries.remove(idx))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
