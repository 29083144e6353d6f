// Keeper Property Tests
// Randomized operation sequences checked for conservation and price behavior

#[path = "../common/mod.rs"]
mod common;

use chrono::{DateTime, TimeDelta, Utc};
use common::*;
use primitive_types::U256;
use proptest::prelude::*;
use rust_decimal::Decimal;
use stakecore::keeper::BlockContext;
use stakecore::query::QueryPoolRequest;
use stakecore::shares::Shares;
use stakecore::staking::BondStatus;
use stakecore::types::{Address, Amount};

const DELEGATORS: [&str; 3] = ["dave", "erin", "frank"];
const VALIDATORS: [&str; 3] = ["alice", "bob", "carol"];
const E12: Amount = 1_000_000_000_000;
const E24: Amount = E12 * E12;
const FUNDING: Amount = 100 * E24;
const VALIDATOR_STAKE: Amount = 1_000_000 * E12;

#[derive(Clone, Debug)]
enum Op {
    Delegate { delegator: usize, validator: usize, amount: Amount },
    Undelegate { delegator: usize, validator: usize, percent: u32 },
    Redelegate { delegator: usize, src: usize, dst: usize, percent: u32 },
    Slash { validator: usize, factor_bps: u32 },
    Block { advance_secs: u64 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, 0..3usize, E12..E24)
            .prop_map(|(delegator, validator, amount)| Op::Delegate { delegator, validator, amount }),
        (0..3usize, 0..3usize, 1..=100u32)
            .prop_map(|(delegator, validator, percent)| Op::Undelegate { delegator, validator, percent }),
        (0..3usize, 0..3usize, 0..3usize, 1..=100u32)
            .prop_map(|(delegator, src, dst, percent)| Op::Redelegate { delegator, src, dst, percent }),
        (0..3usize, 1..5_000u32).prop_map(|(validator, factor_bps)| Op::Slash { validator, factor_bps }),
        (1..2 * UNBONDING_SECS).prop_map(|advance_secs| Op::Block { advance_secs }),
    ]
}

/// `percent` of `shares`, cut to whole share units
fn portion(shares: Shares, percent: u32) -> Shares {
    if percent >= 100 {
        return shares;
    }
    shares.mul_fraction(Decimal::new(percent as i64, 2)).unwrap()
}

/// Price (tokens per share) did not drop, compared exactly
fn price_not_below(old: (Amount, Shares), new: (Amount, Shares)) -> bool {
    U256::from(new.0).full_mul(old.1.units()) >= U256::from(old.0).full_mul(new.1.units())
}

/// Consensus power of `tokens` at one token per unit, saturating
fn power_of(tokens: Amount) -> u64 {
    u64::try_from(tokens).unwrap_or(u64::MAX)
}

struct Harness {
    keeper: TestKeeper,
    height: u64,
    now: DateTime<Utc>,
}

impl Harness {
    fn new() -> Self {
        let funded: Vec<(Address, Amount)> = DELEGATORS.iter().map(|d| (addr(d), FUNDING)).collect();
        let mut keeper = new_keeper(&funded);
        for (seed, name) in VALIDATORS.iter().enumerate() {
            create_validator(&mut keeper, name, seed as u8 + 1, VALIDATOR_STAKE);
        }
        Self {
            keeper,
            height: 1,
            now: time_at(1),
        }
    }

    fn ctx(&self) -> BlockContext {
        BlockContext::new(self.height, self.now)
    }

    fn held(&self, delegator: Address, validator: Address) -> Option<Shares> {
        self.keeper.get_delegation(&delegator, &validator).ok().map(|d| d.shares)
    }

    fn apply(&mut self, op: &Op) {
        let ctx = self.ctx();
        let result = match *op {
            Op::Delegate { delegator, validator, amount } => self
                .keeper
                .delegate(&addr(DELEGATORS[delegator]), amount, BondStatus::Unbonded, &addr(VALIDATORS[validator]), true)
                .map(|_| ()),
            Op::Undelegate { delegator, validator, percent } => {
                let (del, val) = (addr(DELEGATORS[delegator]), addr(VALIDATORS[validator]));
                match self.held(del, val).map(|s| portion(s, percent)) {
                    Some(shares) if !shares.is_zero() => self.keeper.undelegate(&ctx, &del, &val, shares).map(|_| ()),
                    _ => Ok(()),
                }
            }
            Op::Redelegate { delegator, src, dst, percent } => {
                let (del, src, dst) = (addr(DELEGATORS[delegator]), addr(VALIDATORS[src]), addr(VALIDATORS[dst]));
                match self.held(del, src).map(|s| portion(s, percent)) {
                    Some(shares) if !shares.is_zero() && src != dst => {
                        self.keeper.begin_redelegation(&ctx, &del, &src, &dst, shares).map(|_| ())
                    }
                    _ => Ok(()),
                }
            }
            Op::Slash { validator, factor_bps } => {
                let power = self
                    .keeper
                    .get_validator(&addr(VALIDATORS[validator]))
                    .map(|v| v.consensus_power(1))
                    .unwrap_or(0);
                let factor = Decimal::new(factor_bps as i64, 4);
                self.keeper
                    .slash(&ctx, &cons_key(validator as u8 + 1).address(), self.height, power, factor)
                    .map(|_| ())
            }
            Op::Block { advance_secs } => {
                self.height += 1;
                self.now += TimeDelta::seconds(advance_secs as i64);
                self.keeper.on_block_complete(self.height, self.now).map(|_| ())
            }
        };
        if let Err(err) = result {
            assert!(!err.is_fatal(), "{:?} failed fatally: {}", op, err);
        }
    }

    /// Pool balances match what staking state says they should hold
    fn assert_pools_match(&self) {
        let pool = self.keeper.snapshot().unwrap().pool(&QueryPoolRequest {}).unwrap().pool;
        assert_eq!(bonded_pool(&self.keeper), pool.bonded_tokens);
        assert_eq!(not_bonded_pool(&self.keeper), pool.not_bonded_tokens);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_random_operations_conserve_state(ops in prop::collection::vec(op(), 1..40)) {
        let mut harness = Harness::new();
        let supply = harness.keeper.ledger().total_supply();

        for op in &ops {
            harness.apply(op);
            prop_assert!(!harness.keeper.is_halted());
            prop_assert!(harness.keeper.check_invariants().is_ok());
            harness.assert_pools_match();
            let ledger = harness.keeper.ledger();
            prop_assert_eq!(ledger.total_supply() + ledger.total_burned(), supply);
        }
    }

    #[test]
    fn prop_delegate_undelegate_round_trip(
        self_bond in E12..E24,
        amount in E12..E24,
        bonded in any::<bool>(),
        slash_bps in prop::option::of(1u32..5_000),
    ) {
        let dave = addr("dave");
        let mut keeper = new_keeper(&[(dave, amount)]);
        let validator = create_validator(&mut keeper, "alice", 1, self_bond);
        if bonded || slash_bps.is_some() {
            keeper.on_block_complete(1, time_at(1)).unwrap();
        }
        if let Some(bps) = slash_bps {
            keeper
                .slash(&ctx(2), &cons_key(1).address(), 2, power_of(self_bond), Decimal::new(bps as i64, 4))
                .unwrap();
        }

        let shares = keeper.delegate(&dave, amount, BondStatus::Unbonded, &validator, true).unwrap();
        let completion = keeper.undelegate(&ctx(3), &dave, &validator, shares).unwrap();
        let claim = keeper.get_unbonding_delegation(&dave, &validator).unwrap().entries[0].balance;

        prop_assert!(claim <= amount);
        prop_assert!(amount - claim <= 1);
        if slash_bps.is_none() {
            prop_assert_eq!(claim, amount);
        }

        keeper.on_block_complete(4, completion).unwrap();
        prop_assert_eq!(keeper.ledger().balance(&dave), claim);
    }

    #[test]
    fn prop_price_never_drops_through_delegation_flow(
        flows in prop::collection::vec((any::<bool>(), E12..E24, 1..=99u32), 1..20),
        slash_bps in 1u32..5_000,
    ) {
        let dave = addr("dave");
        let mut keeper = new_keeper_with(test_config().with_max_entries(32), &[(dave, 20 * E24)]);
        let validator = create_validator(&mut keeper, "alice", 1, VALIDATOR_STAKE);
        keeper.on_block_complete(1, time_at(1)).unwrap();
        let price = |k: &TestKeeper| {
            let v = k.get_validator(&validator).unwrap();
            (v.tokens, v.delegator_shares)
        };

        for (height, (is_delegate, amount, percent)) in flows.into_iter().enumerate() {
            let before = price(&keeper);
            if is_delegate {
                keeper.delegate(&dave, amount, BondStatus::Unbonded, &validator, true).unwrap();
            } else if let Ok(delegation) = keeper.get_delegation(&dave, &validator) {
                let shares = portion(delegation.shares, percent);
                if !shares.is_zero() {
                    keeper.undelegate(&ctx(height as u64 + 2), &dave, &validator, shares).unwrap();
                }
            }
            prop_assert!(price_not_below(before, price(&keeper)));
        }

        let before = price(&keeper);
        keeper
            .slash(&ctx(40), &cons_key(1).address(), 40, power_of(before.0), Decimal::new(slash_bps as i64, 4))
            .unwrap();
        let after = price(&keeper);
        prop_assert!(after.1 == before.1);
        prop_assert!(after.0 <= before.0);
    }
}
