// Shared fixtures for keeper and query tests
#![allow(dead_code)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use ed25519_dalek::SigningKey;
use rust_decimal_macros::dec;
use stakecore::keeper::{BlockContext, Keeper};
use stakecore::ledger::{MemoryLedger, ModulePool};
use stakecore::staking::{
    BondStatus, Commission, CommissionRates, Description, MsgCreateValidator, Params, Validator,
};
use stakecore::storage::MemStore;
use stakecore::types::{Address, Amount, ConsensusPubKey};
use stakecore::KeeperConfig;

pub type TestKeeper = Keeper<MemStore, MemoryLedger>;

/// Seconds between consecutive test blocks
pub const BLOCK_SECS: i64 = 5;

/// Unbonding period used by most tests
pub const UNBONDING_SECS: u64 = 3_600;

/// Route keeper logs to the test output; later calls are no-ops
pub fn init_logging() {
    stakecore::telemetry::init_tracing_with(Some("stakecore=debug"));
}

pub fn addr(name: &str) -> Address {
    Address::derive(name.as_bytes())
}

pub fn cons_key(seed: u8) -> ConsensusPubKey {
    let signing = SigningKey::from_bytes(&[seed; 32]);
    ConsensusPubKey::from_verifying_key(&signing.verifying_key())
}

/// Consensus key from a freshly generated signing key
pub fn random_cons_key() -> ConsensusPubKey {
    let signing = SigningKey::generate(&mut rand::rngs::OsRng);
    ConsensusPubKey::from_verifying_key(&signing.verifying_key())
}

pub fn genesis_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

pub fn time_at(height: u64) -> DateTime<Utc> {
    genesis_time() + TimeDelta::seconds(height as i64 * BLOCK_SECS)
}

pub fn ctx(height: u64) -> BlockContext {
    BlockContext::new(height, time_at(height))
}

/// Context `secs` past the block at `height`
pub fn ctx_after(height: u64, secs: u64) -> BlockContext {
    BlockContext::new(height, time_at(height) + TimeDelta::seconds(secs as i64))
}

/// One token per unit of power, short unbonding, invariants on
pub fn test_config() -> KeeperConfig {
    KeeperConfig::new()
        .with_params(Params::new().with_unbonding_time(std::time::Duration::from_secs(UNBONDING_SECS)))
        .with_power_reduction(1)
}

pub fn new_keeper(balances: &[(Address, Amount)]) -> TestKeeper {
    new_keeper_with(test_config(), balances)
}

pub fn new_keeper_with(config: KeeperConfig, balances: &[(Address, Amount)]) -> TestKeeper {
    let mut ledger = MemoryLedger::new();
    for (account, amount) in balances {
        ledger.mint(*account, *amount);
    }
    Keeper::new(MemStore::new(), ledger, config).unwrap()
}

pub fn rates() -> CommissionRates {
    CommissionRates::new(dec!(0.1), dec!(0.2), dec!(0.01))
}

pub fn create_msg(name: &str, seed: u8, value: Amount) -> MsgCreateValidator {
    MsgCreateValidator {
        operator_address: addr(name),
        consensus_pubkey: cons_key(seed),
        description: Description::new(name, "", "", "", ""),
        commission: rates(),
        min_self_delegation: 1,
        value,
    }
}

/// Create a validator funded from its own account
pub fn create_validator(keeper: &mut TestKeeper, name: &str, seed: u8, value: Amount) -> Address {
    keeper.ledger_mut().mint(addr(name), value);
    keeper.create_validator(&ctx(0), create_msg(name, seed, value)).unwrap();
    addr(name)
}

/// An empty validator record in the given status, not yet stored
pub fn empty_validator(name: &str, seed: u8, status: BondStatus) -> Validator {
    let mut validator = Validator::new(
        addr(name),
        cons_key(seed),
        Description::new(name, "", "", "", ""),
        Commission::new(rates(), genesis_time()),
        1,
    );
    validator.status = status;
    validator
}

pub fn bonded_pool(keeper: &TestKeeper) -> Amount {
    keeper.ledger().balance(&keeper.pool_account(ModulePool::Bonded))
}

pub fn not_bonded_pool(keeper: &TestKeeper) -> Amount {
    keeper.ledger().balance(&keeper.pool_account(ModulePool::NotBonded))
}
