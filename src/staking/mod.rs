// Staking module - validator, delegation and parameter records

mod delegation;
mod genesis;
mod msgs;
mod params;
mod validator;

pub use delegation::{
    Delegation, Redelegation, RedelegationEntry, UnbondingDelegation, UnbondingDelegationEntry,
};
pub use genesis::{ActiveValidator, GenesisState, LastValidatorPower};
pub use msgs::{MsgCreateValidator, MsgEditValidator};
pub use params::{
    Params, DEFAULT_BOND_DENOM, DEFAULT_HISTORICAL_ENTRIES, DEFAULT_MAX_ENTRIES,
    DEFAULT_MAX_VALIDATORS, DEFAULT_UNBONDING_TIME,
};
pub use validator::{
    BondStatus, Commission, CommissionRates, Description, Validator,
    COMMISSION_UPDATE_INTERVAL_SECS, MAX_DETAILS_LENGTH, MAX_IDENTITY_LENGTH, MAX_MONIKER_LENGTH,
    MAX_SECURITY_CONTACT_LENGTH, MAX_WEBSITE_LENGTH,
};
