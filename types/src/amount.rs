//! Exact decimal token amounts.
//!
//! A [`TokenAmount`] is a human-facing decimal ("0.001") held as an integer
//! mantissa plus a decimal scale, so no floating-point rounding ever touches it.
//! Conversion into the chain's smallest unit is exact: an amount that cannot be
//! represented at the chain's precision is an error, never silently floored.

use crate::TypeError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Largest supported scale; `10^38` is the biggest power of ten a `u128` holds.
pub const MAX_SCALE: u8 = 38;

/// A non-negative decimal amount, `units / 10^scale`.
///
/// Always normalized: trailing fractional zeros are stripped, so equal values
/// have equal representations and the derived `PartialEq`/`Hash` are sound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenAmount {
    units: u128,
    scale: u8,
}

impl TokenAmount {
    pub const ZERO: Self = Self { units: 0, scale: 0 };

    /// Build from a mantissa and scale, e.g. `(1, 3)` is `0.001`.
    pub fn from_parts(units: u128, scale: u8) -> Result<Self, TypeError> {
        if scale > MAX_SCALE {
            return Err(TypeError::InvalidAmount(format!("scale {scale} exceeds {MAX_SCALE}")));
        }
        Ok(Self { units, scale }.normalized())
    }

    /// Exact inverse of [`TokenAmount::to_raw`].
    pub fn from_raw(raw: u128, decimals: u8) -> Result<Self, TypeError> {
        Self::from_parts(raw, decimals)
    }

    /// Convert to the chain's smallest unit given its decimal precision.
    pub fn to_raw(&self, decimals: u8) -> Result<u128, TypeError> {
        if self.scale > decimals {
            return Err(TypeError::PrecisionExceeded {
                scale: self.scale,
                decimals,
            });
        }
        let factor = 10u128
            .checked_pow(u32::from(decimals - self.scale))
            .ok_or(TypeError::Overflow)?;
        self.units.checked_mul(factor).ok_or(TypeError::Overflow)
    }

    pub fn units(&self) -> u128 {
        self.units
    }

    /// Number of significant fractional digits.
    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.units == 0
    }

    fn normalized(mut self) -> Self {
        if self.units == 0 {
            return Self::ZERO;
        }
        while self.scale > 0 && self.units % 10 == 0 {
            self.units /= 10;
            self.scale -= 1;
        }
        self
    }

    /// Mantissa rescaled to `scale`, `None` when it no longer fits.
    fn units_at(&self, scale: u8) -> Option<u128> {
        10u128
            .checked_pow(u32::from(scale - self.scale))
            .and_then(|f| self.units.checked_mul(f))
    }
}

impl Ord for TokenAmount {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        match (self.units_at(scale), other.units_at(scale)) {
            (Some(a), Some(b)) => a.cmp(&b),
            // Only the side being scaled up can overflow, and it is then the larger one.
            (None, _) => Ordering::Greater,
            (_, None) => Ordering::Less,
        }
    }
}

impl PartialOrd for TokenAmount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for TokenAmount {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || TypeError::InvalidAmount(s.to_string());

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (s, None),
        };
        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let frac = frac_part.unwrap_or("");
        if frac_part.is_some() && frac.is_empty() {
            return Err(invalid());
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let scale = u8::try_from(frac.len())
            .ok()
            .filter(|s| *s <= MAX_SCALE)
            .ok_or_else(invalid)?;

        let mut units: u128 = 0;
        for b in int_part.bytes().chain(frac.bytes()) {
            units = units
                .checked_mul(10)
                .and_then(|u| u.checked_add(u128::from(b - b'0')))
                .ok_or(TypeError::Overflow)?;
        }
        Ok(Self { units, scale }.normalized())
    }
}

impl TryFrom<String> for TokenAmount {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TokenAmount> for String {
    fn from(a: TokenAmount) -> Self {
        a.to_string()
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.units);
        }
        let divisor = 10u128.pow(u32::from(self.scale));
        write!(
            f,
            "{}.{:0width$}",
            self.units / divisor,
            self.units % divisor,
            width = usize::from(self.scale)
        )
    }
}
