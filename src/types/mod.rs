// Types module - shared primitives (addresses, keys, token amounts)

mod address;
mod power;

pub use address::{Address, AddressError, ConsensusPubKey, ADDRESS_LEN};
pub use power::{tokens_from_consensus_power, tokens_to_consensus_power, Amount, DEFAULT_POWER_REDUCTION};
