// Share price engine
//
// Pure conversions between tokens and a validator's shares. Token amounts are
// widened before multiplying, so the conversions hold for every `Amount`.
// Both directions truncate toward zero.

use crate::shares::units::{fraction_parts, narrow_units, Shares};
use crate::types::Amount;
use primitive_types::{U256, U512};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors from share conversions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
    #[error("Invalid exchange rate: {shares} shares outstanding against zero tokens")]
    InvalidExchangeRate { shares: Shares },

    #[error("Shares exceed total: requested {requested}, outstanding {outstanding}")]
    ExceedsTotal { requested: Shares, outstanding: Shares },

    #[error("Arithmetic overflow in share conversion")]
    Overflow,

    #[error("Fraction {0} is negative")]
    NegativeFraction(Decimal),

    #[error("Invalid share amount: {0:?}")]
    InvalidFormat(String),
}

fn narrow_amount(value: U512) -> Result<Amount, ShareError> {
    if value > U512::from(Amount::MAX) {
        return Err(ShareError::Overflow);
    }
    Ok(value.low_u128())
}

/// Shares issued for `tokens` at the price implied by `(total_tokens, total_shares)`
///
/// A validator without shares issues them 1:1.
pub fn tokens_to_shares(tokens: Amount, total_tokens: Amount, total_shares: Shares) -> Result<Shares, ShareError> {
    if total_shares.is_zero() {
        return Ok(Shares::whole(tokens));
    }
    if total_tokens == 0 {
        return Err(ShareError::InvalidExchangeRate { shares: total_shares });
    }

    let product = U256::from(tokens).full_mul(total_shares.units());
    let units = narrow_units(product / U512::from(total_tokens))?;
    Ok(Shares::from_units(units))
}

/// Tokens backing `shares`, truncated toward zero
pub fn shares_to_tokens(shares: Shares, total_tokens: Amount, total_shares: Shares) -> Result<Amount, ShareError> {
    if shares.is_zero() {
        return Ok(0);
    }
    if shares > total_shares {
        return Err(ShareError::ExceedsTotal {
            requested: shares,
            outstanding: total_shares,
        });
    }

    let product = shares.units().full_mul(U256::from(total_tokens));
    narrow_amount(product / U512::from(total_shares.units()))
}

/// `trunc(amount * fraction)` for a nonnegative fraction
pub fn amount_fraction(amount: Amount, fraction: Decimal) -> Result<Amount, ShareError> {
    let (numerator, denominator) = fraction_parts(fraction)?;
    let product = U256::from(amount).full_mul(numerator);
    narrow_amount(product / U512::from(denominator))
}
