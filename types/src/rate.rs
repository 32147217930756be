//! Interest rate type.
//!
//! Rates are fixed-point integers scaled by [`PRECISION`] and expressed per
//! second of elapsed time: an account with rate `r` grows by
//! `principal * r / PRECISION` every second (simple interest between
//! settlements).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-point scale shared by rates and growth factors (1e18).
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// A per-second accrual rate scaled by [`PRECISION`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Rate(u128);

impl Rate {
    pub const ZERO: Self = Self(0);

    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}e-18/s", self.0)
    }
}
