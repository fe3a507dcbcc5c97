//! Monetary amounts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of base units in one coin.
pub const COIN: i64 = 100_000_000;

/// A monetary amount in base units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub fn new(units: i64) -> Self {
        Self(units)
    }

    pub fn from_coins(coins: i64) -> Self {
        Self(coins * COIN)
    }

    pub fn units(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:08}", self.0 / COIN, (self.0 % COIN).abs())
    }
}
