// Delegation Tests
// Tests for validator creation, delegation and the all-or-nothing contract

#[path = "../common/mod.rs"]
mod common;

use common::*;
use rust_decimal_macros::dec;
use stakecore::shares::Shares;
use stakecore::staking::{BondStatus, MsgEditValidator};
use stakecore::types::Amount;
use stakecore::ErrorKind;

// ============================================================================
// CREATE VALIDATOR
// ============================================================================

#[test]
fn test_create_validator_self_delegates() {
    let mut keeper = new_keeper(&[]);
    let operator = create_validator(&mut keeper, "alice", 1, 1_000);

    let validator = keeper.get_validator(&operator).unwrap();
    assert_eq!(validator.status, BondStatus::Unbonded);
    assert_eq!(validator.tokens, 1_000);
    assert_eq!(validator.delegator_shares, Shares::whole(1000));

    let delegation = keeper.get_delegation(&operator, &operator).unwrap();
    assert_eq!(delegation.shares, Shares::whole(1000));

    // Unbonded validators keep their tokens in the not-bonded pool
    assert_eq!(not_bonded_pool(&keeper), 1_000);
    assert_eq!(bonded_pool(&keeper), 0);
    assert_eq!(keeper.ledger().balance(&operator), 0);
}

#[test]
fn test_create_validator_twice_fails() {
    let mut keeper = new_keeper(&[]);
    create_validator(&mut keeper, "alice", 1, 1_000);
    keeper.ledger_mut().mint(addr("alice"), 1_000);

    let err = keeper.create_validator(&ctx(0), create_msg("alice", 2, 1_000)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[test]
fn test_create_validator_with_taken_consensus_key_fails() {
    let mut keeper = new_keeper(&[(addr("bob"), 1_000)]);
    create_validator(&mut keeper, "alice", 1, 1_000);

    let err = keeper.create_validator(&ctx(0), create_msg("bob", 1, 1_000)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert!(!keeper.has_validator(&addr("bob")).unwrap());
}

#[test]
fn test_create_validator_indexes_consensus_address() {
    let mut keeper = new_keeper(&[(addr("alice"), 1_000)]);
    let mut msg = create_msg("alice", 1, 1_000);
    msg.consensus_pubkey = random_cons_key();
    let cons_addr = msg.consensus_pubkey.address();
    keeper.create_validator(&ctx(0), msg).unwrap();
    keeper.on_block_complete(1, time_at(1)).unwrap();

    // Slashing finds the validator through its consensus address
    assert_eq!(keeper.slash(&ctx(2), &cons_addr, 2, 1_000, dec!(0.5)).unwrap(), 500);
}

#[test]
fn test_create_validator_below_min_self_delegation_fails() {
    let mut keeper = new_keeper(&[(addr("alice"), 1_000)]);
    let mut msg = create_msg("alice", 1, 10);
    msg.min_self_delegation = 50;

    let err = keeper.create_validator(&ctx(0), msg).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_create_validator_without_funds_leaves_no_record() {
    let mut keeper = new_keeper(&[]);

    let err = keeper.create_validator(&ctx(0), create_msg("alice", 1, 1_000)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    assert!(!keeper.has_validator(&addr("alice")).unwrap());
    assert!(keeper.get_all_validators().unwrap().is_empty());
}

// ============================================================================
// DELEGATE
// ============================================================================

#[test]
fn test_delegate_at_current_price() {
    let mut keeper = new_keeper(&[(addr("dave"), 500)]);
    let validator = create_validator(&mut keeper, "alice", 1, 1_000);

    let shares = keeper
        .delegate(&addr("dave"), 500, BondStatus::Unbonded, &validator, true)
        .unwrap();
    assert_eq!(shares, Shares::whole(500));

    let record = keeper.get_validator(&validator).unwrap();
    assert_eq!(record.tokens, 1_500);
    assert_eq!(record.delegator_shares, Shares::whole(1500));
    assert_eq!(keeper.get_delegation(&addr("dave"), &validator).unwrap().shares, Shares::whole(500));
}

#[test]
fn test_repeat_delegation_accumulates_shares() {
    let mut keeper = new_keeper(&[(addr("dave"), 300)]);
    let validator = create_validator(&mut keeper, "alice", 1, 1_000);

    keeper.delegate(&addr("dave"), 100, BondStatus::Unbonded, &validator, true).unwrap();
    keeper.delegate(&addr("dave"), 200, BondStatus::Unbonded, &validator, true).unwrap();

    assert_eq!(keeper.get_delegation(&addr("dave"), &validator).unwrap().shares, Shares::whole(300));
}

#[test]
fn test_delegate_to_bonded_validator_funds_bonded_pool() {
    let mut keeper = new_keeper(&[(addr("dave"), 500)]);
    let validator = create_validator(&mut keeper, "alice", 1, 1_000);
    keeper.on_block_complete(1, time_at(1)).unwrap();
    assert!(keeper.get_validator(&validator).unwrap().is_bonded());
    assert_eq!(bonded_pool(&keeper), 1_000);

    keeper.delegate(&addr("dave"), 500, BondStatus::Unbonded, &validator, true).unwrap();

    assert_eq!(bonded_pool(&keeper), 1_500);
    assert_eq!(not_bonded_pool(&keeper), 0);
}

#[test]
fn test_delegate_insufficient_funds_mutates_nothing() {
    let mut keeper = new_keeper(&[(addr("dave"), 10)]);
    let validator = create_validator(&mut keeper, "alice", 1, 1_000);
    let before = keeper.snapshot().unwrap().state_hash();

    let err = keeper
        .delegate(&addr("dave"), 500, BondStatus::Unbonded, &validator, true)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    assert_eq!(keeper.snapshot().unwrap().state_hash(), before);
    assert_eq!(keeper.ledger().balance(&addr("dave")), 10);
    assert!(!keeper.is_halted());
}

#[test]
fn test_delegate_zero_is_rejected() {
    let mut keeper = new_keeper(&[(addr("dave"), 10)]);
    let validator = create_validator(&mut keeper, "alice", 1, 1_000);

    let err = keeper
        .delegate(&addr("dave"), 0, BondStatus::Unbonded, &validator, true)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_delegate_to_unknown_validator_fails() {
    let mut keeper = new_keeper(&[(addr("dave"), 10)]);

    let err = keeper
        .delegate(&addr("dave"), 10, BondStatus::Unbonded, &addr("nobody"), true)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_delegate_to_jailed_validator_fails() {
    let mut keeper = new_keeper(&[(addr("dave"), 10)]);
    let validator = create_validator(&mut keeper, "alice", 1, 1_000);
    keeper.jail(&validator).unwrap();

    let err = keeper
        .delegate(&addr("dave"), 10, BondStatus::Unbonded, &validator, true)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(keeper.ledger().balance(&addr("dave")), 10);
}

// ============================================================================
// EDIT, JAIL, UNJAIL
// ============================================================================

#[test]
fn test_jail_and_unjail() {
    let mut keeper = new_keeper(&[]);
    let validator = create_validator(&mut keeper, "alice", 1, 1_000);

    keeper.jail(&validator).unwrap();
    assert!(keeper.get_validator(&validator).unwrap().jailed);
    assert_eq!(keeper.jail(&validator).unwrap_err().kind(), ErrorKind::InvalidState);

    keeper.unjail(&validator).unwrap();
    assert!(!keeper.get_validator(&validator).unwrap().jailed);
    assert_eq!(keeper.unjail(&validator).unwrap_err().kind(), ErrorKind::InvalidState);
}

#[test]
fn test_edit_validator_commission_rate_limits() {
    let mut keeper = new_keeper(&[]);
    let validator = create_validator(&mut keeper, "alice", 1, 1_000);
    let day_later = ctx_after(0, 24 * 60 * 60);

    // Too soon after creation
    let msg = MsgEditValidator {
        commission_rate: Some(dec!(0.105)),
        ..Default::default()
    };
    let err = keeper.edit_validator(&ctx(1), &validator, msg.clone()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    // Larger than the max change rate
    let jump = MsgEditValidator {
        commission_rate: Some(dec!(0.15)),
        ..Default::default()
    };
    let err = keeper.edit_validator(&day_later, &validator, jump).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let edited = keeper.edit_validator(&day_later, &validator, msg).unwrap();
    assert_eq!(edited.commission.rates.rate, dec!(0.105));
    assert_eq!(edited.commission.update_time, day_later.time);
}

#[test]
fn test_edit_min_self_delegation_only_increases() {
    let mut keeper = new_keeper(&[]);
    let validator = create_validator(&mut keeper, "alice", 1, 1_000);

    let raise = MsgEditValidator {
        min_self_delegation: Some(500),
        ..Default::default()
    };
    assert_eq!(keeper.edit_validator(&ctx(1), &validator, raise).unwrap().min_self_delegation, 500);

    let lower = MsgEditValidator {
        min_self_delegation: Some(100),
        ..Default::default()
    };
    let err = keeper.edit_validator(&ctx(1), &validator, lower).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let beyond_tokens = MsgEditValidator {
        min_self_delegation: Some(5_000),
        ..Default::default()
    };
    let err = keeper.edit_validator(&ctx(1), &validator, beyond_tokens).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

// ============================================================================
// LARGE STAKES
// ============================================================================

#[test]
fn test_share_sums_stay_exact_after_slash_at_large_stakes() {
    let stake: Amount = 100_000_000_000_000;
    let mut keeper = new_keeper(&[]);
    let validator = create_validator(&mut keeper, "alice", 1, stake);
    keeper.on_block_complete(1, time_at(1)).unwrap();
    keeper
        .slash(&ctx(2), &cons_key(1).address(), 2, stake as u64, dec!(0.07))
        .unwrap();

    // 0.93 tokens per share: every issue below is a non-terminating fraction
    let mut expected = keeper.get_delegation(&validator, &validator).unwrap().shares;
    for i in 0..20u128 {
        let delegator = addr(&format!("delegator-{}", i));
        let amount = 12_000_000_000_000 + i * 7_919;
        keeper.ledger_mut().mint(delegator, amount);
        let issued = keeper
            .delegate(&delegator, amount, BondStatus::Unbonded, &validator, true)
            .unwrap();
        expected = expected.checked_add(issued).unwrap();

        assert!(!keeper.is_halted());
        keeper.check_invariants().unwrap();
    }

    let record = keeper.get_validator(&validator).unwrap();
    assert_eq!(record.delegator_shares, expected);
    assert_eq!(record.tokens, stake / 100 * 93 + 20 * 12_000_000_000_000 + 7_919 * 190);
}

#[test]
fn test_delegate_and_undelegate_at_large_stakes() {
    let e21: Amount = 1_000_000_000_000_000_000_000;
    let mut keeper = new_keeper(&[(addr("dave"), e21)]);
    let validator = create_validator(&mut keeper, "alice", 1, e21);

    let issued = keeper
        .delegate(&addr("dave"), e21, BondStatus::Unbonded, &validator, true)
        .unwrap();
    assert_eq!(issued, Shares::whole(e21));

    let completion = keeper
        .undelegate(&ctx(1), &validator, &validator, Shares::whole(e21 / 2))
        .unwrap();
    let entry = keeper.get_unbonding_delegation(&validator, &validator).unwrap().entries[0].clone();
    assert_eq!(entry.balance, e21 / 2);

    let record = keeper.get_validator(&validator).unwrap();
    assert_eq!(record.tokens, 3 * e21 / 2);
    assert_eq!(record.delegator_shares, Shares::whole(3 * e21 / 2));
    assert_eq!(keeper.get_delegation(&validator, &validator).unwrap().shares, Shares::whole(e21 / 2));
    keeper.check_invariants().unwrap();

    keeper.on_block_complete(2, completion).unwrap();
    assert_eq!(keeper.ledger().balance(&validator), e21 / 2);
    assert!(!keeper.is_halted());
}
