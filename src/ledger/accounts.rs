// Module pool accounts
// Resolves the staking module's logical pools to account addresses

use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const BONDED_POOL_NAME: &str = "bonded_tokens_pool";
pub const NOT_BONDED_POOL_NAME: &str = "not_bonded_tokens_pool";

/// Custody pools owned by the staking module
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModulePool {
    /// Tokens backing bonded validators
    Bonded,
    /// Tokens of unbonded and unbonding validators, plus in-flight unbondings
    NotBonded,
}

impl ModulePool {
    pub fn name(&self) -> &'static str {
        match self {
            ModulePool::Bonded => BONDED_POOL_NAME,
            ModulePool::NotBonded => NOT_BONDED_POOL_NAME,
        }
    }
}

impl fmt::Display for ModulePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps a logical pool to a stable account identity
pub trait AccountResolver {
    fn pool_account(&self, pool: ModulePool) -> Address;
}

/// Default resolver: the pool address is derived from the pool name
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModuleAccounts;

impl AccountResolver for ModuleAccounts {
    fn pool_account(&self, pool: ModulePool) -> Address {
        Address::derive(pool.name().as_bytes())
    }
}
