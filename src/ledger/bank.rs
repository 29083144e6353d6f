// Ledger collaborator - moves fungible balances for the keeper
// The keeper never inspects balances; it only asks the ledger to move them.

use crate::types::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Errors reported by a ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient funds in {account}: available {available}, required {required}")]
    InsufficientFunds {
        account: Address,
        available: Amount,
        required: Amount,
    },

    #[error("Transfer rejected: {0}")]
    Rejected(String),

    #[error("Balance would overflow")]
    Overflow,

    #[error("Transfer batch failed after partial effect: {0}")]
    PartialFailure(String),
}

impl LedgerError {
    /// Whether some transfers of a batch took effect before the failure
    pub fn is_partial(&self) -> bool {
        matches!(self, LedgerError::PartialFailure(_))
    }
}

// ============================================================================
// TRANSFERS
// ============================================================================

/// One balance movement requested by the keeper
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transfer {
    /// Account to module pool (delegation)
    ToModule {
        account: Address,
        pool: Address,
        amount: Amount,
    },
    /// Pool to pool (bonding status changes, undelegation)
    BetweenPools {
        src: Address,
        dst: Address,
        amount: Amount,
    },
    /// Module pool to account (matured unbonding payout)
    FromModule {
        pool: Address,
        account: Address,
        amount: Amount,
    },
    /// Destroy pool tokens (slashing)
    Burn { pool: Address, amount: Amount },
}

impl Transfer {
    pub fn amount(&self) -> Amount {
        match self {
            Transfer::ToModule { amount, .. }
            | Transfer::BetweenPools { amount, .. }
            | Transfer::FromModule { amount, .. }
            | Transfer::Burn { amount, .. } => *amount,
        }
    }

    /// The transfer that undoes this one; burns cannot be undone
    pub fn reverse(&self) -> Option<Transfer> {
        match self {
            Transfer::ToModule {
                account,
                pool,
                amount,
            } => Some(Transfer::FromModule {
                pool: *pool,
                account: *account,
                amount: *amount,
            }),
            Transfer::BetweenPools { src, dst, amount } => Some(Transfer::BetweenPools {
                src: *dst,
                dst: *src,
                amount: *amount,
            }),
            Transfer::FromModule {
                pool,
                account,
                amount,
            } => Some(Transfer::ToModule {
                account: *account,
                pool: *pool,
                amount: *amount,
            }),
            Transfer::Burn { .. } => None,
        }
    }

    fn apply<L: Ledger + ?Sized>(&self, ledger: &mut L) -> Result<(), LedgerError> {
        match self {
            Transfer::ToModule {
                account,
                pool,
                amount,
            } => ledger.move_to_module(account, pool, *amount),
            Transfer::BetweenPools { src, dst, amount } => {
                ledger.move_between_pools(src, dst, *amount)
            }
            Transfer::FromModule {
                pool,
                account,
                amount,
            } => ledger.move_from_module(pool, account, *amount),
            Transfer::Burn { pool, amount } => ledger.burn(pool, *amount),
        }
    }
}

/// Order in which a batch is applied: movements as recorded, then burns as
/// recorded
pub fn execution_order(transfers: &[Transfer]) -> Vec<&Transfer> {
    let (burns, mut ordered): (Vec<&Transfer>, Vec<&Transfer>) = transfers
        .iter()
        .partition(|t| matches!(t, Transfer::Burn { .. }));
    ordered.extend(burns);
    ordered
}

// ============================================================================
// LEDGER TRAIT
// ============================================================================

/// Custody of fungible balances, consumed by the keeper
///
/// Each single movement must be atomic and fail without partial effect.
pub trait Ledger {
    fn move_to_module(&mut self, account: &Address, pool: &Address, amount: Amount) -> Result<(), LedgerError>;

    fn move_between_pools(&mut self, src: &Address, dst: &Address, amount: Amount) -> Result<(), LedgerError>;

    fn move_from_module(&mut self, pool: &Address, account: &Address, amount: Amount) -> Result<(), LedgerError>;

    fn burn(&mut self, pool: &Address, amount: Amount) -> Result<(), LedgerError>;

    /// Apply every transfer of one keeper operation, all or nothing
    ///
    /// Transfers are not applied in the order given. Implementations must
    /// follow [`execution_order`]: every non-burn movement in its recorded
    /// relative order, then every burn in its recorded relative order. Burns
    /// only lower balances, so deferring them never fails a movement that
    /// would have succeeded in recorded order.
    ///
    /// The default undoes applied movements if a later one fails. A failure
    /// after a burn is a partial failure.
    fn execute(&mut self, transfers: &[Transfer]) -> Result<(), LedgerError> {
        let mut applied: Vec<&Transfer> = Vec::new();
        for transfer in execution_order(transfers) {
            if let Err(err) = transfer.apply(self) {
                for done in applied.iter().rev() {
                    let undo = done.reverse().ok_or_else(|| {
                        LedgerError::PartialFailure(format!("burn applied before failure: {}", err))
                    })?;
                    undo.apply(self)
                        .map_err(|e| LedgerError::PartialFailure(e.to_string()))?;
                }
                return Err(err);
            }
            applied.push(transfer);
        }
        Ok(())
    }
}

// ============================================================================
// MEMORY LEDGER
// ============================================================================

/// In-memory ledger for hosts without a bank and for tests
#[derive(Clone, Debug, Default)]
pub struct MemoryLedger {
    balances: BTreeMap<Address, Amount>,
    blocked: BTreeSet<Address>,
    burned: Amount,
    history: Vec<Transfer>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account balance
    pub fn with_balance(mut self, account: Address, amount: Amount) -> Self {
        self.balances.insert(account, amount);
        self
    }

    /// Credit an account outside of keeper control
    pub fn mint(&mut self, account: Address, amount: Amount) {
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Make every transfer touching `account` fail
    pub fn block_account(&mut self, account: Address) {
        self.blocked.insert(account);
    }

    pub fn unblock_account(&mut self, account: &Address) {
        self.blocked.remove(account);
    }

    pub fn balance(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn total_burned(&self) -> Amount {
        self.burned
    }

    /// Sum of all balances (burned tokens excluded)
    pub fn total_supply(&self) -> Amount {
        self.balances.values().sum()
    }

    /// Transfers applied so far, in order
    pub fn history(&self) -> &[Transfer] {
        &self.history
    }

    fn check_open(&self, account: &Address) -> Result<(), LedgerError> {
        if self.blocked.contains(account) {
            return Err(LedgerError::Rejected(format!("account {} is blocked", account)));
        }
        Ok(())
    }

    fn debit(&mut self, account: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.check_open(account)?;
        let available = self.balance(account);
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                account: *account,
                available,
                required: amount,
            });
        }
        self.balances.insert(*account, available - amount);
        Ok(())
    }

    fn credit(&mut self, account: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.check_open(account)?;
        let balance = self
            .balance(account)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.balances.insert(*account, balance);
        Ok(())
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.check_open(to)?;
        self.debit(from, amount)?;
        if let Err(err) = self.credit(to, amount) {
            // Restore the debit so the movement has no partial effect
            self.balances.insert(*from, self.balance(from) + amount);
            return Err(err);
        }
        Ok(())
    }
}

impl Ledger for MemoryLedger {
    fn move_to_module(&mut self, account: &Address, pool: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.transfer(account, pool, amount)?;
        self.history.push(Transfer::ToModule {
            account: *account,
            pool: *pool,
            amount,
        });
        Ok(())
    }

    fn move_between_pools(&mut self, src: &Address, dst: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.transfer(src, dst, amount)?;
        self.history.push(Transfer::BetweenPools {
            src: *src,
            dst: *dst,
            amount,
        });
        Ok(())
    }

    fn move_from_module(&mut self, pool: &Address, account: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.transfer(pool, account, amount)?;
        self.history.push(Transfer::FromModule {
            pool: *pool,
            account: *account,
            amount,
        });
        Ok(())
    }

    fn burn(&mut self, pool: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.debit(pool, amount)?;
        self.burned = self.burned.saturating_add(amount);
        self.history.push(Transfer::Burn { pool: *pool, amount });
        Ok(())
    }

    /// Applies the batch to a copy and swaps it in only if all transfers succeed
    fn execute(&mut self, transfers: &[Transfer]) -> Result<(), LedgerError> {
        let mut staged = self.clone();
        for transfer in execution_order(transfers) {
            transfer.apply(&mut staged)?;
        }
        *self = staged;
        Ok(())
    }
}
