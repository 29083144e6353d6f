// Operation inputs for validator lifecycle calls

use crate::staking::{CommissionRates, Description};
use crate::types::{Address, Amount, ConsensusPubKey};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Register a new validator and its self-delegation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateValidator {
    pub operator_address: Address,
    pub consensus_pubkey: ConsensusPubKey,
    pub description: Description,
    pub commission: CommissionRates,
    pub min_self_delegation: Amount,
    /// Tokens self-delegated from the operator's account
    pub value: Amount,
}

/// Update validator metadata; `None` fields are left unchanged
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgEditValidator {
    pub description: Option<Description>,
    pub commission_rate: Option<Decimal>,
    pub min_self_delegation: Option<Amount>,
}
