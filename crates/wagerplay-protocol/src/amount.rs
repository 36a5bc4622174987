//! Fixed-point token amounts.
//!
//! Wagers and payouts are stored as an integer count of minor units
//! (10⁻⁸ of a token, the same granularity as an on-chain octa). Repeated
//! additions to a running balance therefore never drift the way `f64`
//! arithmetic does; the decimal form only exists at the edges, for
//! parsing user input and for display.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// An amount of the wagered token, in minor units.
///
/// Serialized as the plain integer count of minor units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Number of decimal places carried by the minor unit.
    pub const DECIMALS: u32 = 8;

    /// Minor units per whole token.
    pub const UNIT: u64 = 10u64.pow(Self::DECIMALS);

    pub const ZERO: Amount = Amount(0);

    /// Wraps a raw minor-unit count.
    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Returns the raw minor-unit count.
    pub const fn minor(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Multiplies by a whole factor, e.g. the number of stakes in a pot.
    pub fn checked_mul(self, factor: u64) -> Option<Amount> {
        self.0.checked_mul(factor).map(Amount)
    }

    /// Parses a non-negative decimal string such as `"0.5"` or `"12"`.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidAmount`] for empty input, signs,
    /// non-digit characters, more than [`Self::DECIMALS`] fractional
    /// digits, or values that overflow `u64` minor units.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let s = input.trim();
        let invalid = |why: &str| ProtocolError::InvalidAmount(format!("{why}: {input:?}"));

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("empty amount"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("expected an unsigned decimal"));
        }
        if frac.len() > Self::DECIMALS as usize {
            return Err(invalid("too many decimal places"));
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount too large"))?
        };
        let mut frac_minor: u64 = 0;
        for (i, digit) in frac.bytes().enumerate() {
            let place = 10u64.pow(Self::DECIMALS - 1 - i as u32);
            frac_minor += u64::from(digit - b'0') * place;
        }

        whole
            .checked_mul(Self::UNIT)
            .and_then(|w| w.checked_add(frac_minor))
            .map(Amount)
            .ok_or_else(|| invalid("amount too large"))
    }
}

impl FromStr for Amount {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Prints the shortest exact decimal form: `0.5`, `1`, `0.00000001`.
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::UNIT;
        let frac = self.0 % Self::UNIT;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:0width$}", width = Self::DECIMALS as usize);
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}
