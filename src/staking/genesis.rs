// Genesis import/export state and the active-set view reported to consensus

use crate::staking::{Delegation, Params, Redelegation, UnbondingDelegation, Validator};
use crate::types::{Address, ConsensusPubKey};
use serde::{Deserialize, Serialize};

/// Power a validator was last reported with
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastValidatorPower {
    pub address: Address,
    pub power: u64,
}

/// A member of the active validator set
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveValidator {
    pub operator_address: Address,
    pub consensus_pubkey: ConsensusPubKey,
    pub power: u64,
}

/// Complete module state, as imported at genesis or exported for upgrades
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    pub last_validator_powers: Vec<LastValidatorPower>,
    pub validators: Vec<Validator>,
    pub delegations: Vec<Delegation>,
    pub unbonding_delegations: Vec<UnbondingDelegation>,
    pub redelegations: Vec<Redelegation>,
    /// Set when the state came from an export rather than a fresh chain
    pub exported: bool,
}

impl GenesisState {
    pub fn new(params: Params, validators: Vec<Validator>, delegations: Vec<Delegation>) -> Self {
        Self {
            params,
            validators,
            delegations,
            ..Default::default()
        }
    }
}
