// Shares module - converts tokens to validator shares and back

mod price;
mod units;

pub use price::{amount_fraction, shares_to_tokens, tokens_to_shares, ShareError};
pub use units::{Shares, SHARE_PRECISION};
