// Keeper configuration
// Genesis parameters and host-side knobs, built fluently and validated once

use crate::staking::Params;
use crate::types::{Amount, DEFAULT_POWER_REDUCTION};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Power reduction must be positive")]
    InvalidPowerReduction,

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

/// Configuration injected into a keeper at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeeperConfig {
    /// Parameters installed when the store holds none
    pub params: Params,
    /// Tokens per unit of consensus power
    pub power_reduction: Amount,
    /// Run the share-conservation checks after every mutation
    pub check_invariants: bool,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            params: Params::default(),
            power_reduction: DEFAULT_POWER_REDUCTION,
            check_invariants: true,
        }
    }
}

impl KeeperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_unbonding_time(mut self, unbonding_time: Duration) -> Self {
        self.params.unbonding_time = unbonding_time;
        self
    }

    pub fn with_max_entries(mut self, max_entries: u32) -> Self {
        self.params.max_entries = max_entries;
        self
    }

    pub fn with_max_validators(mut self, max_validators: u32) -> Self {
        self.params.max_validators = max_validators;
        self
    }

    pub fn with_power_reduction(mut self, power_reduction: Amount) -> Self {
        self.power_reduction = power_reduction;
        self
    }

    pub fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.check_invariants = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.power_reduction == 0 {
            return Err(ConfigError::InvalidPowerReduction);
        }
        self.params
            .validate()
            .map_err(|e| ConfigError::InvalidParams(e.to_string()))
    }
}
