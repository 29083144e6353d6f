// stakecore - proof-of-stake validator and delegation accounting
//
// Validators, delegations, unbonding and redelegation queues, slashing and
// active-set selection over an ordered key-value store. Every state change
// runs against a write cache and commits only if the whole operation succeeds.

pub mod config;
pub mod error;
pub mod keeper;
pub mod ledger;
pub mod query;
pub mod shares;
pub mod staking;
pub mod storage;
pub mod telemetry;
pub mod types;

pub use config::{ConfigError, KeeperConfig};
pub use error::{ErrorKind, StakingError};
pub use keeper::{BlockContext, Keeper};
pub use ledger::{Ledger, MemoryLedger};
pub use query::Snapshot;
pub use shares::Shares;
pub use storage::{MemStore, SledStore};
pub use types::{Address, Amount};
