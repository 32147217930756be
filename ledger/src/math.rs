//! Fixed-point helpers.
//!
//! Products of two `u128` values are widened to 256 bits before dividing, so
//! `principal * growth` cannot overflow for any representable principal.

use primitive_types::U256;
use rebase_types::{Rate, PRECISION};

/// `floor(a * b / denom)`, or `None` when `denom == 0` or the quotient
/// does not fit in `u128`.
pub fn mul_div_floor(a: u128, b: u128, denom: u128) -> Option<u128> {
    if denom == 0 {
        return None;
    }
    let out = U256::from(a) * U256::from(b) / U256::from(denom);
    u128::try_from(out).ok()
}

/// Linear growth factor for `elapsed` seconds at `rate`, scaled by [`PRECISION`].
///
/// `PRECISION + rate * elapsed`; exactly `PRECISION` when either is zero.
pub fn growth_factor(rate: Rate, elapsed: u64) -> Option<u128> {
    if rate.is_zero() || elapsed == 0 {
        return Some(PRECISION);
    }
    rate.raw()
        .checked_mul(u128::from(elapsed))?
        .checked_add(PRECISION)
}

/// `principal * growth / PRECISION`.
pub fn accrue(principal: u128, rate: Rate, elapsed: u64) -> Option<u128> {
    let growth = growth_factor(rate, elapsed)?;
    mul_div_floor(principal, growth, PRECISION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_handles_products_beyond_u128() {
        let big = u128::MAX / 2;
        assert_eq!(mul_div_floor(big, PRECISION, PRECISION), Some(big));
        assert_eq!(mul_div_floor(u128::MAX, 2, 1), None);
        assert_eq!(mul_div_floor(1, 1, 0), None);
    }

    #[test]
    fn growth_is_precision_without_rate_or_time() {
        assert_eq!(growth_factor(Rate::ZERO, 1_000), Some(PRECISION));
        assert_eq!(growth_factor(Rate::new(5), 0), Some(PRECISION));
        assert_eq!(growth_factor(Rate::new(5), 10), Some(PRECISION + 50));
    }

    #[test]
    fn accrue_truncates_towards_zero() {
        // 1e-9 per second for 1 second on 999 units is 0.000000999 units.
        assert_eq!(accrue(999, Rate::new(1_000_000_000), 1), Some(999));
        // 1% per second for 10 seconds: 1000 * 1.1 = 1100.
        assert_eq!(accrue(1_000, Rate::new(PRECISION / 100), 10), Some(1_100));
    }
}
