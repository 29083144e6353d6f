// Halt Tests
// Tests for fatal failures latching the keeper into a halted state

#[path = "../common/mod.rs"]
mod common;

use common::*;
use rust_decimal_macros::dec;
use stakecore::keeper::Keeper;
use stakecore::ledger::{Ledger, LedgerError, MemoryLedger};
use stakecore::shares::Shares;
use stakecore::staking::BondStatus;
use stakecore::storage::{CommitStore, KvPair, KvStore, MemStore, StoreError, WriteBatch};
use stakecore::types::{Address, Amount};
use stakecore::{ErrorKind, StakingError};

/// Ledger that refuses burns once its allowance runs out
struct BurnLimitedLedger {
    inner: MemoryLedger,
    burns_allowed: usize,
}

impl Ledger for BurnLimitedLedger {
    fn move_to_module(&mut self, account: &Address, pool: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.inner.move_to_module(account, pool, amount)
    }

    fn move_between_pools(&mut self, src: &Address, dst: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.inner.move_between_pools(src, dst, amount)
    }

    fn move_from_module(&mut self, pool: &Address, account: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.inner.move_from_module(pool, account, amount)
    }

    fn burn(&mut self, pool: &Address, amount: Amount) -> Result<(), LedgerError> {
        if self.burns_allowed == 0 {
            return Err(LedgerError::Rejected("burn refused".into()));
        }
        self.burns_allowed -= 1;
        self.inner.burn(pool, amount)
    }
}

/// Store whose commits can be made to fail
struct FlakyStore {
    inner: MemStore,
    fail_commits: bool,
}

impl KvStore for FlakyStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(key)
    }

    fn range(&self, start: &[u8], end: Option<&[u8]>) -> Result<Vec<KvPair>, StoreError> {
        self.inner.range(start, end)
    }
}

impl CommitStore for FlakyStore {
    fn apply(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        if self.fail_commits {
            return Err(StoreError::DatabaseError("disk full".into()));
        }
        self.inner.apply(batch)
    }

    fn snapshot(&self) -> Result<MemStore, StoreError> {
        self.inner.snapshot()
    }
}

#[test]
fn test_invariant_violation_halts() {
    init_logging();
    let dave = addr("dave");
    let mut keeper = new_keeper(&[(dave, 100)]);
    let validator = create_validator(&mut keeper, "alice", 1, 1_000);

    // Shares with no delegation backing them
    let mut broken = empty_validator("bob", 2, BondStatus::Unbonded);
    broken.tokens = 10;
    broken.delegator_shares = Shares::whole(10);
    let err = keeper.set_validator(broken).unwrap_err();

    assert!(matches!(err, StakingError::InvariantViolation(_)));
    assert!(keeper.is_halted());
    assert!(!keeper.has_validator(&addr("bob")).unwrap());

    let err = keeper.delegate(&dave, 100, BondStatus::Unbonded, &validator, true).unwrap_err();
    assert!(matches!(err, StakingError::Halted));
    assert_eq!(err.kind(), ErrorKind::Fatal);
    // Reads keep working
    assert_eq!(keeper.get_validator(&validator).unwrap().tokens, 1_000);
}

#[test]
fn test_recoverable_errors_do_not_halt() {
    let mut keeper = new_keeper(&[]);
    let validator = create_validator(&mut keeper, "alice", 1, 1_000);

    assert!(keeper.delegate(&addr("dave"), 10, BondStatus::Unbonded, &validator, true).is_err());
    assert!(keeper.jail(&addr("nobody")).is_err());
    assert!(!keeper.is_halted());
    keeper.jail(&validator).unwrap();
}

#[test]
fn test_partial_ledger_failure_halts() {
    init_logging();
    let dave = addr("dave");
    let ledger = BurnLimitedLedger {
        inner: MemoryLedger::new().with_balance(dave, 500).with_balance(addr("alice"), 1_000),
        burns_allowed: usize::MAX,
    };
    let mut keeper = Keeper::new(MemStore::new(), ledger, test_config()).unwrap();
    let validator = addr("alice");
    keeper.create_validator(&ctx(0), create_msg("alice", 1, 1_000)).unwrap();
    keeper.delegate(&dave, 500, BondStatus::Unbonded, &validator, true).unwrap();
    keeper.on_block_complete(1, time_at(1)).unwrap();
    keeper.undelegate(&ctx(3), &dave, &validator, Shares::whole(200)).unwrap();
    let before = keeper.snapshot().unwrap().state_hash();

    // The unbonding entry burn lands, the validator burn is refused
    keeper.ledger_mut().burns_allowed = 1;
    let err = keeper.slash(&ctx(5), &cons_key(1).address(), 2, 1_500, dec!(0.1)).unwrap_err();

    assert!(err.is_fatal());
    assert!(keeper.is_halted());
    assert_eq!(keeper.snapshot().unwrap().state_hash(), before);
}

#[test]
fn test_commit_failure_after_transfers_halts() {
    let dave = addr("dave");
    let store = FlakyStore {
        inner: MemStore::new(),
        fail_commits: false,
    };
    let ledger = MemoryLedger::new().with_balance(dave, 100).with_balance(addr("alice"), 1_000);
    let mut keeper = Keeper::new(store, ledger, test_config()).unwrap();
    let validator = addr("alice");
    keeper.create_validator(&ctx(0), create_msg("alice", 1, 1_000)).unwrap();

    keeper.store_mut().fail_commits = true;

    // Nothing moved yet, so the keeper can carry on
    let err = keeper.jail(&validator).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(!keeper.is_halted());

    let err = keeper.delegate(&dave, 100, BondStatus::Unbonded, &validator, true).unwrap_err();
    assert!(matches!(err, StakingError::CommitFailed(_)));
    assert!(keeper.is_halted());
}
