// Maturity queues
//
// The unbonding queue holds both unbonding and redelegation entries, keyed by
// completion time then unbonding id, so one scan yields them in completion
// order with creation order breaking ties. The validator queue holds
// unbonding validators keyed by their unbonding time.

use crate::error::StakingError;
use crate::keeper::reader::StakingReader;
use crate::keeper::state::{BlockContext, StakingState};
use crate::ledger::ModulePool;
use crate::staking::BondStatus;
use crate::storage::{keys, KvStore};
use crate::types::Address;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Record an unbonding queue key points at
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueuedEntry {
    Unbonding {
        delegator: Address,
        validator: Address,
    },
    Redelegation {
        delegator: Address,
        src: Address,
        dst: Address,
    },
}

/// What a sweep completed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub unbondings: usize,
    pub redelegations: usize,
    pub validators: usize,
}

impl<S: KvStore + ?Sized> StakingState<'_, S> {
    /// Pay out matured unbonding entries and retire matured redelegations
    pub fn complete_matured_entries(&mut self, ctx: &BlockContext) -> Result<SweepSummary, StakingError> {
        let mut summary = SweepSummary::default();

        for (key, queued) in self.matured_unbonding_queue(&ctx.time)? {
            let unbonding_id = keys::trailing_u64(&key)?;
            match queued {
                QueuedEntry::Unbonding {
                    delegator,
                    validator,
                } => {
                    let removed = match self.get_unbonding_delegation(&delegator, &validator)? {
                        Some(mut ubd) => {
                            let entry = ubd.remove_entry(unbonding_id);
                            self.set_unbonding_delegation(&ubd)?;
                            entry
                        }
                        None => None,
                    };
                    match removed {
                        Some(entry) => {
                            self.move_from_module(ModulePool::NotBonded, delegator, entry.balance);
                            summary.unbondings += 1;
                            info!(
                                "Unbonding {} completed: paid {} to {} from validator {}",
                                unbonding_id, entry.balance, delegator, validator
                            );
                        }
                        None => warn!("Unbonding queue entry {} has no record", unbonding_id),
                    }
                }
                QueuedEntry::Redelegation {
                    delegator,
                    src,
                    dst,
                } => {
                    let removed = match self.get_redelegation(&delegator, &src, &dst)? {
                        Some(mut red) => {
                            let entry = red.remove_entry(unbonding_id);
                            self.set_redelegation(&red)?;
                            entry
                        }
                        None => None,
                    };
                    if removed.is_some() {
                        summary.redelegations += 1;
                        info!(
                            "Redelegation {} completed: {} from {} to {}",
                            unbonding_id, delegator, src, dst
                        );
                    } else {
                        warn!("Redelegation queue entry {} has no record", unbonding_id);
                    }
                }
            }
            self.delete_key(key);
        }

        Ok(summary)
    }

    /// Move validators whose unbonding time has passed to Unbonded
    pub fn unbond_matured_validators(&mut self, ctx: &BlockContext) -> Result<usize, StakingError> {
        let mut completed = 0;

        for (key, operator) in self.matured_validator_queue(&ctx.time)? {
            self.delete_key(key);

            let mut validator = match self.get_validator(&operator)? {
                Some(validator) => validator,
                None => {
                    warn!("Validator queue entry for unknown validator {}", operator);
                    continue;
                }
            };
            if !validator.is_unbonding() || validator.unbonding_time > ctx.time {
                continue;
            }

            validator.set_status(BondStatus::Unbonded)?;
            if validator.is_prunable() {
                self.remove_validator(&operator)?;
                info!("Validator {} finished unbonding and was pruned", operator);
            } else {
                self.set_validator(&validator)?;
                info!("Validator {} finished unbonding", operator);
            }
            completed += 1;
        }

        Ok(completed)
    }
}
