// Validator records, bond status and commission

use crate::error::StakingError;
use crate::shares::{self, ShareError, Shares};
use crate::types::{tokens_to_consensus_power, Address, Amount, ConsensusPubKey};
use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_MONIKER_LENGTH: usize = 70;
pub const MAX_IDENTITY_LENGTH: usize = 3000;
pub const MAX_WEBSITE_LENGTH: usize = 140;
pub const MAX_SECURITY_CONTACT_LENGTH: usize = 140;
pub const MAX_DETAILS_LENGTH: usize = 280;

/// Minimum time between two commission rate changes
pub const COMMISSION_UPDATE_INTERVAL_SECS: i64 = 24 * 60 * 60;

// ============================================================================
// BOND STATUS
// ============================================================================

/// Bonding status of a validator
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BondStatus {
    Unbonded,
    Unbonding,
    Bonded,
}

impl BondStatus {
    /// Whether moving from `self` to `to` is allowed
    ///
    /// Unbonded -> Bonded, Bonded -> Unbonding, Unbonding -> Bonded and
    /// Unbonding -> Unbonded are the only transitions.
    pub fn can_transition_to(self, to: BondStatus) -> bool {
        matches!(
            (self, to),
            (BondStatus::Unbonded, BondStatus::Bonded)
                | (BondStatus::Bonded, BondStatus::Unbonding)
                | (BondStatus::Unbonding, BondStatus::Bonded)
                | (BondStatus::Unbonding, BondStatus::Unbonded)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BondStatus::Unbonded => "BOND_STATUS_UNBONDED",
            BondStatus::Unbonding => "BOND_STATUS_UNBONDING",
            BondStatus::Bonded => "BOND_STATUS_BONDED",
        }
    }
}

impl fmt::Display for BondStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// DESCRIPTION
// ============================================================================

/// Human-readable validator metadata
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub moniker: String,
    pub identity: String,
    pub website: String,
    pub security_contact: String,
    pub details: String,
}

impl Description {
    pub fn new(
        moniker: &str,
        identity: &str,
        website: &str,
        security_contact: &str,
        details: &str,
    ) -> Self {
        Self {
            moniker: moniker.to_string(),
            identity: identity.to_string(),
            website: website.to_string(),
            security_contact: security_contact.to_string(),
            details: details.to_string(),
        }
    }

    /// Check field lengths
    pub fn validate(&self) -> Result<(), StakingError> {
        let limits = [
            ("moniker", &self.moniker, MAX_MONIKER_LENGTH),
            ("identity", &self.identity, MAX_IDENTITY_LENGTH),
            ("website", &self.website, MAX_WEBSITE_LENGTH),
            ("security contact", &self.security_contact, MAX_SECURITY_CONTACT_LENGTH),
            ("details", &self.details, MAX_DETAILS_LENGTH),
        ];
        for (name, value, max) in limits {
            if value.len() > max {
                return Err(StakingError::InvalidArgument(format!(
                    "{} length {} exceeds maximum {}",
                    name,
                    value.len(),
                    max
                )));
            }
        }
        if self.moniker.is_empty() {
            return Err(StakingError::InvalidArgument("moniker cannot be empty".into()));
        }
        Ok(())
    }
}

// ============================================================================
// COMMISSION
// ============================================================================

/// Commission rate parameters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRates {
    pub rate: Decimal,
    pub max_rate: Decimal,
    pub max_change_rate: Decimal,
}

impl CommissionRates {
    pub fn new(rate: Decimal, max_rate: Decimal, max_change_rate: Decimal) -> Self {
        Self {
            rate,
            max_rate,
            max_change_rate,
        }
    }

    /// Check 0 <= rate <= max_rate <= 1 and max_change_rate <= max_rate
    pub fn validate(&self) -> Result<(), StakingError> {
        if self.max_rate.is_sign_negative() || self.max_rate > Decimal::ONE {
            return Err(StakingError::InvalidArgument(format!(
                "commission max rate {} must be within [0, 1]",
                self.max_rate
            )));
        }
        if self.rate.is_sign_negative() || self.rate > self.max_rate {
            return Err(StakingError::InvalidArgument(format!(
                "commission rate {} must be within [0, {}]",
                self.rate, self.max_rate
            )));
        }
        if self.max_change_rate.is_sign_negative() || self.max_change_rate > self.max_rate {
            return Err(StakingError::InvalidArgument(format!(
                "commission max change rate {} must be within [0, {}]",
                self.max_change_rate, self.max_rate
            )));
        }
        Ok(())
    }
}

/// Commission rates plus the time they last changed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    pub rates: CommissionRates,
    pub update_time: DateTime<Utc>,
}

impl Commission {
    pub fn new(rates: CommissionRates, update_time: DateTime<Utc>) -> Self {
        Self { rates, update_time }
    }

    /// Check a proposed new rate against the change limits
    pub fn validate_new_rate(&self, new_rate: Decimal, now: DateTime<Utc>) -> Result<(), StakingError> {
        if now - self.update_time < TimeDelta::seconds(COMMISSION_UPDATE_INTERVAL_SECS) {
            return Err(StakingError::InvalidState(
                "commission cannot be changed more than once in 24h".into(),
            ));
        }
        if new_rate.is_sign_negative() || new_rate > self.rates.max_rate {
            return Err(StakingError::InvalidArgument(format!(
                "commission rate {} must be within [0, {}]",
                new_rate, self.rates.max_rate
            )));
        }
        if (new_rate - self.rates.rate).abs() > self.rates.max_change_rate {
            return Err(StakingError::InvalidArgument(format!(
                "commission change exceeds max change rate {}",
                self.rates.max_change_rate
            )));
        }
        Ok(())
    }
}

// ============================================================================
// VALIDATOR
// ============================================================================

/// A validator and the stake backing it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub operator_address: Address,
    pub consensus_pubkey: ConsensusPubKey,
    pub jailed: bool,
    pub status: BondStatus,
    pub tokens: Amount,
    pub delegator_shares: Shares,
    pub description: Description,
    pub unbonding_height: u64,
    pub unbonding_time: DateTime<Utc>,
    pub commission: Commission,
    pub min_self_delegation: Amount,
}

impl Validator {
    /// Create an unbonded validator with no stake
    pub fn new(
        operator_address: Address,
        consensus_pubkey: ConsensusPubKey,
        description: Description,
        commission: Commission,
        min_self_delegation: Amount,
    ) -> Self {
        Self {
            operator_address,
            consensus_pubkey,
            jailed: false,
            status: BondStatus::Unbonded,
            tokens: 0,
            delegator_shares: Shares::ZERO,
            description,
            unbonding_height: 0,
            unbonding_time: DateTime::<Utc>::UNIX_EPOCH,
            commission,
            min_self_delegation,
        }
    }

    pub fn is_bonded(&self) -> bool {
        self.status == BondStatus::Bonded
    }

    pub fn is_unbonded(&self) -> bool {
        self.status == BondStatus::Unbonded
    }

    pub fn is_unbonding(&self) -> bool {
        self.status == BondStatus::Unbonding
    }

    /// Consensus address derived from the consensus key
    pub fn consensus_address(&self) -> Address {
        self.consensus_pubkey.address()
    }

    /// Voting power backed by the current tokens
    pub fn consensus_power(&self, power_reduction: Amount) -> u64 {
        tokens_to_consensus_power(self.tokens, power_reduction)
    }

    /// Shares `amount` tokens would buy at the current price
    pub fn shares_from_tokens(&self, amount: Amount) -> Result<Shares, ShareError> {
        shares::tokens_to_shares(amount, self.tokens, self.delegator_shares)
    }

    /// Tokens `shares` are worth at the current price, truncated
    pub fn tokens_from_shares(&self, shares: Shares) -> Result<Amount, ShareError> {
        shares::shares_to_tokens(shares, self.tokens, self.delegator_shares)
    }

    /// Move to a new status if the transition table allows it
    pub fn set_status(&mut self, to: BondStatus) -> Result<(), StakingError> {
        if !self.status.can_transition_to(to) {
            return Err(StakingError::InvalidTransition {
                validator: self.operator_address,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Add delegated tokens, returning the shares issued for them
    pub fn add_tokens_from_delegation(&mut self, amount: Amount) -> Result<Shares, ShareError> {
        let issued = self.shares_from_tokens(amount)?;
        let tokens = self.tokens.checked_add(amount).ok_or(ShareError::Overflow)?;
        self.delegator_shares = self
            .delegator_shares
            .checked_add(issued)
            .ok_or(ShareError::Overflow)?;
        self.tokens = tokens;
        Ok(issued)
    }

    /// Remove shares, returning the tokens released for them
    ///
    /// Removing the last shares releases every remaining token.
    pub fn remove_delegator_shares(&mut self, shares: Shares) -> Result<Amount, ShareError> {
        let remaining = self
            .delegator_shares
            .checked_sub(shares)
            .ok_or(ShareError::ExceedsTotal {
                requested: shares,
                outstanding: self.delegator_shares,
            })?;

        let issued = if remaining.is_zero() {
            self.tokens
        } else {
            let issued = self.tokens_from_shares(shares)?;
            issued.min(self.tokens)
        };

        self.tokens -= issued;
        self.delegator_shares = remaining;
        Ok(issued)
    }

    /// Remove tokens without touching shares (slashing)
    pub fn remove_tokens(&mut self, amount: Amount) -> Amount {
        let removed = amount.min(self.tokens);
        self.tokens -= removed;
        removed
    }

    /// Whether the record can be deleted
    pub fn is_prunable(&self) -> bool {
        self.is_unbonded() && self.tokens == 0 && self.delegator_shares.is_zero()
    }
}
