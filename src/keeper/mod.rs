// Keeper module - STATE TRANSITIONS
// Orchestrates registry, delegation, queue and slashing operations over one
// all-or-nothing write cache per call

mod delegation;
mod executor;
mod genesis;
mod invariants;
mod queue;
mod reader;
mod redelegation;
mod registry;
mod slash;
mod state;
mod validator_set;

pub use invariants::check_all as check_invariants;
pub use executor::Keeper;
pub use queue::{QueuedEntry, SweepSummary};
pub use reader::StakingReader;
pub use state::{pool_for, BlockContext, PoolAccounts, StakingState};
pub use validator_set::stored_active_set;
