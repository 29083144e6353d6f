// Ledger module - TOKEN CUSTODY
// The bank-side collaborator the keeper moves balances through, and the
// module pool accounts it moves them between

mod accounts;
mod bank;

pub use accounts::{
    AccountResolver, ModuleAccounts, ModulePool, BONDED_POOL_NAME, NOT_BONDED_POOL_NAME,
};
pub use bank::{execution_order, Ledger, LedgerError, MemoryLedger, Transfer};
