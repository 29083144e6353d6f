// Share quantities
//
// Shares are counted as a whole number of share units, 10^-18 of a share
// each, held in 256 bits. Sums and differences are exact at any stake size,
// and products go through 512 bits before they are truncated.

use crate::shares::ShareError;
use primitive_types::{U256, U512};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Fractional digits of one share unit
pub const SHARE_PRECISION: u32 = 18;

fn units_per_share() -> U256 {
    U256::exp10(SHARE_PRECISION as usize)
}

/// Narrow a 512-bit product back to share units
pub(crate) fn narrow_units(value: U512) -> Result<U256, ShareError> {
    U256::try_from(value).map_err(|_| ShareError::Overflow)
}

/// Split a nonnegative decimal into `numerator / 10^scale`
pub(crate) fn fraction_parts(fraction: Decimal) -> Result<(U256, U256), ShareError> {
    let mantissa = u128::try_from(fraction.mantissa()).map_err(|_| ShareError::NegativeFraction(fraction))?;
    Ok((U256::from(mantissa), U256::exp10(fraction.scale() as usize)))
}

/// An exact, nonnegative number of shares
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Shares(U256);

impl Shares {
    pub const ZERO: Shares = Shares(U256([0; 4]));

    /// `count` whole shares
    pub fn whole(count: u128) -> Self {
        Shares(U256::from(count) * units_per_share())
    }

    pub fn from_units(units: U256) -> Self {
        Shares(units)
    }

    /// Raw count of 10^-18 share units
    pub fn units(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Shares) -> Option<Shares> {
        self.0.checked_add(other.0).map(Shares)
    }

    pub fn checked_sub(self, other: Shares) -> Option<Shares> {
        self.0.checked_sub(other.0).map(Shares)
    }

    /// `self * fraction`, truncated to whole share units
    pub fn mul_fraction(self, fraction: Decimal) -> Result<Shares, ShareError> {
        let (numerator, denominator) = fraction_parts(fraction)?;
        let product = self.0.full_mul(numerator) / U512::from(denominator);
        narrow_units(product).map(Shares)
    }
}

impl fmt::Display for Shares {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = units_per_share();
        let whole = self.0 / unit;
        let fraction = (self.0 % unit).low_u64();
        if fraction == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:018}", fraction);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl fmt::Debug for Shares {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shares({})", self)
    }
}

impl FromStr for Shares {
    type Err = ShareError;

    /// Parse a plain decimal such as `"100"` or `"0.25"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ShareError::InvalidFormat(s.to_string());
        let (whole, fraction) = match s.split_once('.') {
            Some((_, "")) => return Err(invalid()),
            Some(parts) => parts,
            None => (s, ""),
        };
        let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty()
            || fraction.len() > SHARE_PRECISION as usize
            || !digits_only(whole)
            || !digits_only(fraction)
        {
            return Err(invalid());
        }

        let whole = U256::from_dec_str(whole).map_err(|_| invalid())?;
        let fraction = U256::from_dec_str(&format!("{:0<18}", fraction)).map_err(|_| invalid())?;
        whole
            .checked_mul(units_per_share())
            .and_then(|units| units.checked_add(fraction))
            .map(Shares)
            .ok_or_else(invalid)
    }
}

impl Serialize for Shares {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Shares {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}
