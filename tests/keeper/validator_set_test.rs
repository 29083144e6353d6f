// Validator Set Tests
// Tests for active-set selection and validator status transitions

#[path = "../common/mod.rs"]
mod common;

use common::*;
use stakecore::shares::Shares;
use stakecore::staking::BondStatus;
use stakecore::KeeperConfig;

// ============================================================================
// ACTIVE SET
// ============================================================================

#[test]
fn test_active_set_orders_by_power_then_operator() {
    let mut keeper = new_keeper(&[]);
    let alice = create_validator(&mut keeper, "alice", 1, 3_000);
    let bob = create_validator(&mut keeper, "bob", 2, 1_000);
    let carol = create_validator(&mut keeper, "carol", 3, 1_000);

    let active = keeper.on_block_complete(1, time_at(1)).unwrap();

    let mut tied = vec![bob, carol];
    tied.sort();
    let order: Vec<_> = active.iter().map(|v| v.operator_address).collect();
    assert_eq!(order, vec![alice, tied[0], tied[1]]);
    assert_eq!(active[0].power, 3_000);
    assert_eq!(active[0].consensus_pubkey, cons_key(1));
    assert_eq!(keeper.active_set().unwrap(), active);
}

#[test]
fn test_active_set_capped_at_max_validators() {
    let mut keeper = new_keeper_with(test_config().with_max_validators(2), &[]);
    let alice = create_validator(&mut keeper, "alice", 1, 3_000);
    let bob = create_validator(&mut keeper, "bob", 2, 2_000);
    let carol = create_validator(&mut keeper, "carol", 3, 1_000);

    let active = keeper.on_block_complete(1, time_at(1)).unwrap();

    assert_eq!(active.len(), 2);
    assert!(keeper.get_validator(&alice).unwrap().is_bonded());
    assert!(keeper.get_validator(&bob).unwrap().is_bonded());
    assert!(keeper.get_validator(&carol).unwrap().is_unbonded());
    assert_eq!(bonded_pool(&keeper), 5_000);
    assert_eq!(not_bonded_pool(&keeper), 1_000);

    let by_power: Vec<_> = keeper
        .get_bonded_validators_by_power()
        .unwrap()
        .into_iter()
        .map(|v| v.operator_address)
        .collect();
    assert_eq!(by_power, vec![alice, bob]);
}

#[test]
fn test_zero_power_validators_stay_out() {
    let config = KeeperConfig::new().with_unbonding_time(std::time::Duration::from_secs(60));
    let mut keeper = new_keeper_with(config, &[]);
    let alice = create_validator(&mut keeper, "alice", 1, 1_000);

    // 1_000 tokens is below one unit of power at the default reduction
    let active = keeper.on_block_complete(1, time_at(1)).unwrap();

    assert!(active.is_empty());
    assert!(keeper.get_validator(&alice).unwrap().is_unbonded());
}

// ============================================================================
// STATUS TRANSITIONS
// ============================================================================

#[test]
fn test_displaced_validator_unbonds_then_matures() {
    let mut keeper = new_keeper_with(test_config().with_max_validators(2), &[]);
    create_validator(&mut keeper, "alice", 1, 3_000);
    let bob = create_validator(&mut keeper, "bob", 2, 2_000);
    keeper.on_block_complete(1, time_at(1)).unwrap();

    create_validator(&mut keeper, "carol", 3, 5_000);
    let active = keeper.on_block_complete(2, time_at(2)).unwrap();
    assert!(active.iter().all(|v| v.operator_address != bob));

    let unbonding = keeper.get_validator(&bob).unwrap();
    assert_eq!(unbonding.status, BondStatus::Unbonding);
    assert_eq!(unbonding.unbonding_height, 2);
    assert_eq!(bonded_pool(&keeper), 8_000);
    assert_eq!(not_bonded_pool(&keeper), 2_000);

    keeper.on_block_complete(3, time_at(3)).unwrap();
    assert!(keeper.get_validator(&bob).unwrap().is_unbonding());

    keeper.on_block_complete(4, unbonding.unbonding_time).unwrap();
    assert!(keeper.get_validator(&bob).unwrap().is_unbonded());
}

#[test]
fn test_unbonding_validator_can_rebond() {
    let dave = addr("dave");
    let mut keeper = new_keeper_with(test_config().with_max_validators(2), &[(dave, 4_000)]);
    let alice = create_validator(&mut keeper, "alice", 1, 3_000);
    let bob = create_validator(&mut keeper, "bob", 2, 2_000);
    keeper.on_block_complete(1, time_at(1)).unwrap();
    create_validator(&mut keeper, "carol", 3, 5_000);
    keeper.on_block_complete(2, time_at(2)).unwrap();
    let unbonding_time = keeper.get_validator(&bob).unwrap().unbonding_time;

    keeper.delegate(&dave, 4_000, BondStatus::Unbonded, &bob, true).unwrap();
    keeper.on_block_complete(3, time_at(3)).unwrap();

    assert!(keeper.get_validator(&bob).unwrap().is_bonded());
    assert!(keeper.get_validator(&alice).unwrap().is_unbonding());

    // The stale queue entry no longer applies
    keeper.on_block_complete(4, unbonding_time).unwrap();
    assert!(keeper.get_validator(&bob).unwrap().is_bonded());
    assert_eq!(bonded_pool(&keeper), 11_000);
}

#[test]
fn test_jailed_validator_leaves_active_set() {
    let mut keeper = new_keeper(&[]);
    let alice = create_validator(&mut keeper, "alice", 1, 3_000);
    let bob = create_validator(&mut keeper, "bob", 2, 2_000);
    keeper.on_block_complete(1, time_at(1)).unwrap();

    keeper.jail(&alice).unwrap();
    let active = keeper.on_block_complete(2, time_at(2)).unwrap();

    assert_eq!(active.len(), 1);
    assert_eq!(active[0].operator_address, bob);
    assert!(keeper.get_validator(&alice).unwrap().is_unbonding());
    assert_eq!(not_bonded_pool(&keeper), 3_000);
}

#[test]
fn test_power_change_updates_active_set() {
    let dave = addr("dave");
    let mut keeper = new_keeper(&[(dave, 500)]);
    let alice = create_validator(&mut keeper, "alice", 1, 1_000);
    keeper.on_block_complete(1, time_at(1)).unwrap();

    keeper.delegate(&dave, 500, BondStatus::Unbonded, &alice, true).unwrap();
    let active = keeper.on_block_complete(2, time_at(2)).unwrap();
    assert_eq!(active[0].power, 1_500);

    keeper.undelegate(&ctx(3), &dave, &alice, Shares::whole(250)).unwrap();
    let active = keeper.on_block_complete(3, time_at(3)).unwrap();
    assert_eq!(active[0].power, 1_250);
}

#[test]
fn test_repeated_height_returns_stored_set() {
    let mut keeper = new_keeper(&[]);
    create_validator(&mut keeper, "alice", 1, 1_000);
    let first = keeper.on_block_complete(1, time_at(1)).unwrap();

    create_validator(&mut keeper, "bob", 2, 5_000);
    let again = keeper.on_block_complete(1, time_at(1)).unwrap();

    assert_eq!(again, first);
    assert!(keeper.get_validator(&addr("bob")).unwrap().is_unbonded());
}
