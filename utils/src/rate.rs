//! Rate formatting helpers.

use rebase_types::{Rate, PRECISION};

const SECS_PER_YEAR: u128 = 365 * 24 * 60 * 60;

/// Simple (non-compounded) yearly growth of a per-second rate, in basis points.
pub fn annual_rate_bps(rate: Rate) -> u128 {
    rate.raw().saturating_mul(SECS_PER_YEAR).saturating_mul(10_000) / PRECISION
}

/// Human-readable rate: raw value plus its simple yearly percentage.
pub fn format_rate(rate: Rate) -> String {
    let bps = annual_rate_bps(rate);
    format!("{} ({}.{:02}%/yr)", rate.raw(), bps / 100, bps % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_is_zero_bps() {
        assert_eq!(annual_rate_bps(Rate::ZERO), 0);
        assert_eq!(format_rate(Rate::ZERO), "0 (0.00%/yr)");
    }

    #[test]
    fn default_rate_is_about_158_percent() {
        // 5e10 * 31_536_000 * 10_000 / 1e18 = 15_768
        assert_eq!(annual_rate_bps(Rate::new(50_000_000_000)), 15_768);
    }
}
