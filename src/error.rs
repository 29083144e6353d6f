// Errors returned by keeper operations and queries

use crate::config::ConfigError;
use crate::ledger::LedgerError;
use crate::shares::{ShareError, Shares};
use crate::staking::BondStatus;
use crate::storage::StoreError;
use crate::types::Address;
use thiserror::Error;

/// Coarse classification of a [`StakingError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InsufficientShares,
    InsufficientFunds,
    CapacityExceeded,
    InvalidState,
    InvalidArgument,
    Storage,
    /// Unrecoverable: execution must stop
    Fatal,
}

#[derive(Error, Debug)]
pub enum StakingError {
    #[error("Validator not found: {0}")]
    ValidatorNotFound(Address),

    #[error("Delegation not found: delegator {delegator}, validator {validator}")]
    DelegationNotFound { delegator: Address, validator: Address },

    #[error("Unbonding delegation not found: delegator {delegator}, validator {validator}")]
    UnbondingDelegationNotFound { delegator: Address, validator: Address },

    #[error("Validator already exists: {0}")]
    ValidatorExists(Address),

    #[error("Consensus key already in use by validator {0}")]
    ConsensusKeyInUse(Address),

    #[error("Insufficient shares: held {held}, requested {requested}")]
    InsufficientShares { held: Shares, requested: Shares },

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(LedgerError),

    #[error("Too many unbonding entries for pair (max {max})")]
    MaxUnbondingEntries { max: u32 },

    #[error("Too many redelegation entries for pair (max {max})")]
    MaxRedelegationEntries { max: u32 },

    #[error("Invalid status transition for {validator}: {from} -> {to}")]
    InvalidTransition {
        validator: Address,
        from: BondStatus,
        to: BondStatus,
    },

    #[error("Validator {0} is jailed")]
    ValidatorJailed(Address),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Share conversion failed: {0}")]
    Shares(#[from] ShareError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Ledger error: {0}")]
    Ledger(LedgerError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Commit failed after ledger transfers were applied: {0}")]
    CommitFailed(StoreError),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("State machine halted after a fatal error")]
    Halted,
}

impl From<LedgerError> for StakingError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds { .. } => StakingError::InsufficientFunds(err),
            other => StakingError::Ledger(other),
        }
    }
}

impl StakingError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StakingError::ValidatorNotFound(_)
            | StakingError::DelegationNotFound { .. }
            | StakingError::UnbondingDelegationNotFound { .. } => ErrorKind::NotFound,
            StakingError::ValidatorExists(_) | StakingError::ConsensusKeyInUse(_) => {
                ErrorKind::AlreadyExists
            }
            StakingError::InsufficientShares { .. } => ErrorKind::InsufficientShares,
            StakingError::InsufficientFunds(_) => ErrorKind::InsufficientFunds,
            StakingError::MaxUnbondingEntries { .. } | StakingError::MaxRedelegationEntries { .. } => {
                ErrorKind::CapacityExceeded
            }
            StakingError::InvalidTransition { .. }
            | StakingError::ValidatorJailed(_)
            | StakingError::InvalidState(_) => ErrorKind::InvalidState,
            StakingError::InvalidArgument(_) | StakingError::Config(_) => ErrorKind::InvalidArgument,
            StakingError::Shares(share_err) => match share_err {
                ShareError::InvalidExchangeRate { .. } => ErrorKind::InvalidState,
                ShareError::ExceedsTotal { .. } => ErrorKind::InsufficientShares,
                ShareError::Overflow
                | ShareError::NegativeFraction(_)
                | ShareError::InvalidFormat(_) => ErrorKind::InvalidArgument,
            },
            StakingError::Storage(_) => ErrorKind::Storage,
            StakingError::Ledger(ledger_err) if ledger_err.is_partial() => ErrorKind::Fatal,
            StakingError::Ledger(_) => ErrorKind::InvalidState,
            StakingError::CommitFailed(_)
            | StakingError::InvariantViolation(_)
            | StakingError::Halted => ErrorKind::Fatal,
        }
    }

    /// Whether the error must stop state-machine execution
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}
