// Staking parameters

use crate::error::StakingError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BOND_DENOM: &str = "stake";
pub const DEFAULT_UNBONDING_TIME: Duration = Duration::from_secs(60 * 60 * 24 * 7 * 3);
pub const DEFAULT_MAX_VALIDATORS: u32 = 100;
pub const DEFAULT_MAX_ENTRIES: u32 = 7;
pub const DEFAULT_HISTORICAL_ENTRIES: u32 = 10_000;

/// Module parameters, persisted in state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Delay before unbonding entries mature
    pub unbonding_time: Duration,
    /// Size of the active validator set
    pub max_validators: u32,
    /// Cap on concurrent unbonding/redelegation entries per pair
    pub max_entries: u32,
    /// Number of historical headers a host is expected to retain
    pub historical_entries: u32,
    pub bond_denom: String,
    pub min_commission_rate: Decimal,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            unbonding_time: DEFAULT_UNBONDING_TIME,
            max_validators: DEFAULT_MAX_VALIDATORS,
            max_entries: DEFAULT_MAX_ENTRIES,
            historical_entries: DEFAULT_HISTORICAL_ENTRIES,
            bond_denom: DEFAULT_BOND_DENOM.to_string(),
            min_commission_rate: Decimal::ZERO,
        }
    }
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unbonding_time(mut self, unbonding_time: Duration) -> Self {
        self.unbonding_time = unbonding_time;
        self
    }

    pub fn with_max_validators(mut self, max: u32) -> Self {
        self.max_validators = max;
        self
    }

    pub fn with_max_entries(mut self, max: u32) -> Self {
        self.max_entries = max;
        self
    }

    pub fn with_historical_entries(mut self, entries: u32) -> Self {
        self.historical_entries = entries;
        self
    }

    pub fn with_bond_denom(mut self, denom: &str) -> Self {
        self.bond_denom = denom.to_string();
        self
    }

    pub fn with_min_commission_rate(mut self, rate: Decimal) -> Self {
        self.min_commission_rate = rate;
        self
    }

    /// Validate the parameters
    pub fn validate(&self) -> Result<(), StakingError> {
        if self.unbonding_time.is_zero() {
            return Err(StakingError::InvalidArgument("unbonding time must be positive".into()));
        }
        if self.max_validators == 0 {
            return Err(StakingError::InvalidArgument("max validators must be positive".into()));
        }
        if self.max_entries == 0 {
            return Err(StakingError::InvalidArgument("max entries must be positive".into()));
        }
        if self.bond_denom.trim().is_empty() {
            return Err(StakingError::InvalidArgument("bond denom cannot be blank".into()));
        }
        if self.min_commission_rate.is_sign_negative() || self.min_commission_rate > Decimal::ONE {
            return Err(StakingError::InvalidArgument(format!(
                "minimum commission rate {} must be within [0, 1]",
                self.min_commission_rate
            )));
        }
        Ok(())
    }
}
