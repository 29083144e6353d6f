// Key layout for staking state
//
// Each record family lives under its own one-byte prefix. Addresses are fixed
// width, so concatenated keys sort by their components left to right.

use crate::storage::store::StoreError;
use crate::types::{Address, Amount, ADDRESS_LEN};
use chrono::{DateTime, Utc};

pub const LAST_VALIDATOR_POWER: u8 = 0x11;
pub const VALIDATOR: u8 = 0x21;
pub const VALIDATOR_BY_CONS_ADDR: u8 = 0x22;
pub const VALIDATOR_BY_POWER: u8 = 0x23;
pub const DELEGATION: u8 = 0x31;
pub const DELEGATION_BY_VALIDATOR: u8 = 0x32;
pub const UNBONDING_DELEGATION: u8 = 0x33;
pub const UNBONDING_DELEGATION_BY_VALIDATOR: u8 = 0x34;
pub const REDELEGATION: u8 = 0x35;
pub const REDELEGATION_BY_SRC: u8 = 0x36;
pub const REDELEGATION_BY_DST: u8 = 0x37;
pub const UNBONDING_QUEUE: u8 = 0x41;
pub const VALIDATOR_QUEUE: u8 = 0x43;
pub const PARAMS: u8 = 0x51;
pub const LAST_COMPLETED_HEIGHT: u8 = 0x52;
pub const NEXT_UNBONDING_ID: u8 = 0x53;

/// Width of an encoded timestamp
pub const TIME_LEN: usize = 12;

fn key(prefix: u8, parts: &[&[u8]]) -> Vec<u8> {
    let len = 1 + parts.iter().map(|p| p.len()).sum::<usize>();
    let mut key = Vec::with_capacity(len);
    key.push(prefix);
    for part in parts {
        key.extend_from_slice(part);
    }
    key
}

/// Order-preserving encoding of a timestamp (seconds with the sign bit
/// flipped, then nanoseconds)
pub fn time_bytes(time: &DateTime<Utc>) -> [u8; TIME_LEN] {
    let secs = (time.timestamp() as u64) ^ (1u64 << 63);
    let mut out = [0u8; TIME_LEN];
    out[..8].copy_from_slice(&secs.to_be_bytes());
    out[8..].copy_from_slice(&time.timestamp_subsec_nanos().to_be_bytes());
    out
}

/// Read the address stored at `offset` in `key`
pub fn address_at(key: &[u8], offset: usize) -> Result<Address, StoreError> {
    key.get(offset..offset + ADDRESS_LEN)
        .ok_or_else(|| StoreError::MalformedKey(hex::encode(key)))
        .and_then(|bytes| {
            Address::from_slice(bytes).map_err(|e| StoreError::MalformedKey(e.to_string()))
        })
}

/// Read the trailing big-endian u64 of `key`
pub fn trailing_u64(key: &[u8]) -> Result<u64, StoreError> {
    let start = key
        .len()
        .checked_sub(8)
        .ok_or_else(|| StoreError::MalformedKey(hex::encode(key)))?;
    let bytes: [u8; 8] = key[start..]
        .try_into()
        .map_err(|_| StoreError::MalformedKey(hex::encode(key)))?;
    Ok(u64::from_be_bytes(bytes))
}

// ============================================================================
// VALIDATORS
// ============================================================================

pub fn validator_key(operator: &Address) -> Vec<u8> {
    key(VALIDATOR, &[operator.as_bytes()])
}

pub fn validators_prefix() -> Vec<u8> {
    vec![VALIDATOR]
}

pub fn validator_by_cons_addr_key(cons_addr: &Address) -> Vec<u8> {
    key(VALIDATOR_BY_CONS_ADDR, &[cons_addr.as_bytes()])
}

/// Power index key: tokens descending, then operator ascending
pub fn validator_by_power_key(tokens: Amount, operator: &Address) -> Vec<u8> {
    let inverted = (Amount::MAX - tokens).to_be_bytes();
    key(VALIDATOR_BY_POWER, &[&inverted, operator.as_bytes()])
}

pub fn validators_by_power_prefix() -> Vec<u8> {
    vec![VALIDATOR_BY_POWER]
}

/// Operator address of a power index key
pub fn operator_from_power_key(key: &[u8]) -> Result<Address, StoreError> {
    address_at(key, 1 + 16)
}

pub fn last_validator_power_key(operator: &Address) -> Vec<u8> {
    key(LAST_VALIDATOR_POWER, &[operator.as_bytes()])
}

pub fn last_validator_powers_prefix() -> Vec<u8> {
    vec![LAST_VALIDATOR_POWER]
}

// ============================================================================
// DELEGATIONS
// ============================================================================

pub fn delegation_key(delegator: &Address, validator: &Address) -> Vec<u8> {
    key(DELEGATION, &[delegator.as_bytes(), validator.as_bytes()])
}

pub fn delegations_prefix() -> Vec<u8> {
    vec![DELEGATION]
}

pub fn delegations_by_delegator_prefix(delegator: &Address) -> Vec<u8> {
    key(DELEGATION, &[delegator.as_bytes()])
}

pub fn delegation_by_validator_key(validator: &Address, delegator: &Address) -> Vec<u8> {
    key(DELEGATION_BY_VALIDATOR, &[validator.as_bytes(), delegator.as_bytes()])
}

pub fn delegations_by_validator_prefix(validator: &Address) -> Vec<u8> {
    key(DELEGATION_BY_VALIDATOR, &[validator.as_bytes()])
}

// ============================================================================
// UNBONDING DELEGATIONS
// ============================================================================

pub fn unbonding_delegation_key(delegator: &Address, validator: &Address) -> Vec<u8> {
    key(UNBONDING_DELEGATION, &[delegator.as_bytes(), validator.as_bytes()])
}

pub fn unbonding_delegations_prefix() -> Vec<u8> {
    vec![UNBONDING_DELEGATION]
}

pub fn unbonding_delegation_by_validator_key(validator: &Address, delegator: &Address) -> Vec<u8> {
    key(
        UNBONDING_DELEGATION_BY_VALIDATOR,
        &[validator.as_bytes(), delegator.as_bytes()],
    )
}

pub fn unbonding_delegations_by_validator_prefix(validator: &Address) -> Vec<u8> {
    key(UNBONDING_DELEGATION_BY_VALIDATOR, &[validator.as_bytes()])
}

// ============================================================================
// REDELEGATIONS
// ============================================================================

pub fn redelegation_key(delegator: &Address, src: &Address, dst: &Address) -> Vec<u8> {
    key(REDELEGATION, &[delegator.as_bytes(), src.as_bytes(), dst.as_bytes()])
}

pub fn redelegations_prefix() -> Vec<u8> {
    vec![REDELEGATION]
}

pub fn redelegations_by_delegator_prefix(delegator: &Address) -> Vec<u8> {
    key(REDELEGATION, &[delegator.as_bytes()])
}

pub fn redelegation_by_src_key(src: &Address, delegator: &Address, dst: &Address) -> Vec<u8> {
    key(REDELEGATION_BY_SRC, &[src.as_bytes(), delegator.as_bytes(), dst.as_bytes()])
}

pub fn redelegations_by_src_prefix(src: &Address) -> Vec<u8> {
    key(REDELEGATION_BY_SRC, &[src.as_bytes()])
}

pub fn redelegation_by_dst_key(dst: &Address, delegator: &Address, src: &Address) -> Vec<u8> {
    key(REDELEGATION_BY_DST, &[dst.as_bytes(), delegator.as_bytes(), src.as_bytes()])
}

/// Redelegations by `delegator` into `dst`
pub fn redelegations_by_dst_delegator_prefix(dst: &Address, delegator: &Address) -> Vec<u8> {
    key(REDELEGATION_BY_DST, &[dst.as_bytes(), delegator.as_bytes()])
}

// ============================================================================
// QUEUES
// ============================================================================

pub fn unbonding_queue_key(completion_time: &DateTime<Utc>, unbonding_id: u64) -> Vec<u8> {
    key(
        UNBONDING_QUEUE,
        &[&time_bytes(completion_time), &unbonding_id.to_be_bytes()],
    )
}

pub fn unbonding_queue_prefix() -> Vec<u8> {
    vec![UNBONDING_QUEUE]
}

/// Prefix covering every queue entry completing exactly at `time`
pub fn unbonding_queue_time_prefix(time: &DateTime<Utc>) -> Vec<u8> {
    key(UNBONDING_QUEUE, &[&time_bytes(time)])
}

pub fn validator_queue_key(unbonding_time: &DateTime<Utc>, operator: &Address) -> Vec<u8> {
    key(VALIDATOR_QUEUE, &[&time_bytes(unbonding_time), operator.as_bytes()])
}

pub fn validator_queue_prefix() -> Vec<u8> {
    vec![VALIDATOR_QUEUE]
}

pub fn validator_queue_time_prefix(time: &DateTime<Utc>) -> Vec<u8> {
    key(VALIDATOR_QUEUE, &[&time_bytes(time)])
}

/// Operator address of a validator queue key
pub fn operator_from_validator_queue_key(key: &[u8]) -> Result<Address, StoreError> {
    address_at(key, 1 + TIME_LEN)
}

// ============================================================================
// SINGLETONS
// ============================================================================

pub fn params_key() -> Vec<u8> {
    vec![PARAMS]
}

pub fn last_completed_height_key() -> Vec<u8> {
    vec![LAST_COMPLETED_HEIGHT]
}

pub fn next_unbonding_id_key() -> Vec<u8> {
    vec![NEXT_UNBONDING_ID]
}
