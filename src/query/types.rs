// Query requests and responses

use crate::query::pagination::{PageRequest, PageResponse};
use crate::staking::{BondStatus, Delegation, Params, Redelegation, UnbondingDelegation, Validator};
use crate::types::{Address, Amount};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParamsRequest {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParamsResponse {
    pub params: Params,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryValidatorRequest {
    pub validator_addr: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryValidatorResponse {
    pub validator: Validator,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryValidatorsRequest {
    /// Only validators in this status; `None` lists all
    pub status: Option<BondStatus>,
    pub pagination: Option<PageRequest>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryValidatorsResponse {
    pub validators: Vec<Validator>,
    pub pagination: PageResponse,
}

/// A delegation with the tokens its shares are currently worth
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationResponse {
    pub delegation: Delegation,
    pub balance: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryValidatorDelegationsRequest {
    pub validator_addr: Address,
    pub pagination: Option<PageRequest>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryValidatorDelegationsResponse {
    pub delegation_responses: Vec<DelegationResponse>,
    pub pagination: PageResponse,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryValidatorUnbondingDelegationsRequest {
    pub validator_addr: Address,
    pub pagination: Option<PageRequest>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryValidatorUnbondingDelegationsResponse {
    pub unbonding_responses: Vec<UnbondingDelegation>,
    pub pagination: PageResponse,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDelegationRequest {
    pub delegator_addr: Address,
    pub validator_addr: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDelegationResponse {
    pub delegation_response: DelegationResponse,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryUnbondingDelegationRequest {
    pub delegator_addr: Address,
    pub validator_addr: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryUnbondingDelegationResponse {
    pub unbond: UnbondingDelegation,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDelegatorDelegationsRequest {
    pub delegator_addr: Address,
    pub pagination: Option<PageRequest>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDelegatorDelegationsResponse {
    pub delegation_responses: Vec<DelegationResponse>,
    pub pagination: PageResponse,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRedelegationsRequest {
    pub delegator_addr: Address,
    /// Narrow to redelegations out of this validator
    pub src_validator_addr: Option<Address>,
    /// Narrow to redelegations into this validator
    pub dst_validator_addr: Option<Address>,
    pub pagination: Option<PageRequest>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRedelegationsResponse {
    pub redelegation_responses: Vec<Redelegation>,
    pub pagination: PageResponse,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPoolRequest {}

/// Tokens the module pools should hold according to staking state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub bonded_tokens: Amount,
    pub not_bonded_tokens: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPoolResponse {
    pub pool: Pool,
}
