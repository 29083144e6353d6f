// Redelegation - move stake between validators without unbonding

use crate::error::StakingError;
use crate::keeper::executor::Keeper;
use crate::keeper::queue::QueuedEntry;
use crate::keeper::reader::StakingReader;
use crate::keeper::state::{BlockContext, StakingState};
use crate::ledger::{AccountResolver, Ledger};
use crate::shares::Shares;
use crate::staking::{BondStatus, Redelegation, RedelegationEntry};
use crate::storage::{CommitStore, KvStore};
use crate::types::Address;
use chrono::{DateTime, Utc};
use tracing::info;

impl<S: KvStore + ?Sized> StakingState<'_, S> {
    /// Move `shares` of the delegation to `src` over to `dst`
    ///
    /// The destination delegation is credited at once. The entry recorded
    /// here only keeps the new shares slashable for infractions at `src`
    /// until it completes. Nothing is recorded when `src` is unbonded.
    pub fn begin_redelegation(
        &mut self,
        ctx: &BlockContext,
        delegator: &Address,
        src: &Address,
        dst: &Address,
        shares: Shares,
    ) -> Result<DateTime<Utc>, StakingError> {
        if src == dst {
            return Err(StakingError::InvalidArgument(
                "cannot redelegate to the same validator".into(),
            ));
        }
        let params = self.params()?;
        let src_validator = self.must_get_validator(src)?;
        self.must_get_validator(dst)?;

        if self.has_receiving_redelegation(delegator, src)? {
            return Err(StakingError::InvalidState(format!(
                "redelegation from {} is still maturing into {}",
                delegator, src
            )));
        }

        let mut red = self
            .get_redelegation(delegator, src, dst)?
            .unwrap_or_else(|| Redelegation::new(*delegator, *src, *dst));
        if red.entries.len() >= params.max_entries as usize {
            return Err(StakingError::MaxRedelegationEntries {
                max: params.max_entries,
            });
        }

        let amount = self.unbond(delegator, src, shares)?;
        if amount == 0 {
            return Err(StakingError::InvalidArgument("redelegation amount too small".into()));
        }
        let shares_dst = self.delegate(*delegator, amount, src_validator.status, dst, false)?;

        let (completion_time, creation_height) = match src_validator.status {
            BondStatus::Unbonded => {
                info!(
                    "Redelegation by {} from {} to {} of {} tokens completed immediately",
                    delegator, src, dst, amount
                );
                return Ok(ctx.time);
            }
            BondStatus::Unbonding => (src_validator.unbonding_time, src_validator.unbonding_height),
            BondStatus::Bonded => (ctx.time_after(params.unbonding_time)?, ctx.height),
        };

        let unbonding_id = self.next_unbonding_id()?;
        red.add_entry(RedelegationEntry {
            creation_height,
            completion_time,
            initial_balance: amount,
            shares_dst,
            unbonding_id,
        });
        self.set_redelegation(&red)?;
        self.insert_unbonding_queue(
            &completion_time,
            unbonding_id,
            &QueuedEntry::Redelegation {
                delegator: *delegator,
                src: *src,
                dst: *dst,
            },
        )?;

        info!(
            "Redelegation {} by {} from {} to {} of {} tokens completes at {}",
            unbonding_id, delegator, src, dst, amount, completion_time
        );
        Ok(completion_time)
    }
}

impl<S: CommitStore, L: Ledger, A: AccountResolver> Keeper<S, L, A> {
    /// Redelegate shares, returning when the redelegation completes
    pub fn begin_redelegation(
        &mut self,
        ctx: &BlockContext,
        delegator: &Address,
        src: &Address,
        dst: &Address,
        shares: Shares,
    ) -> Result<DateTime<Utc>, StakingError> {
        self.execute("begin_redelegation", |state| {
            state.begin_redelegation(ctx, delegator, src, dst, shares)
        })
    }
}
