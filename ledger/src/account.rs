//! Per-account accrual state.

use crate::math;
use rebase_types::{Rate, Timestamp};
use serde::{Deserialize, Serialize};

/// Accrual state for a single account.
///
/// The visible balance is never stored: it is derived from `principal`,
/// `rate` and the time since `last_settled`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Explicitly minted amount net of burns, plus interest settled so far.
    pub principal: u128,
    /// Rate frozen at the last mint or transfer-in that assigned one.
    pub rate: Rate,
    /// When interest was last folded into `principal`.
    pub last_settled: Timestamp,
}

impl AccountState {
    /// A fresh, unfunded account whose accrual clock starts at `now`.
    pub fn new(now: Timestamp) -> Self {
        Self {
            principal: 0,
            rate: Rate::ZERO,
            last_settled: now,
        }
    }

    /// Balance including unsettled interest at `now`.
    ///
    /// Returns `None` if the result does not fit in `u128`.
    pub fn balance_checked(&self, now: Timestamp) -> Option<u128> {
        math::accrue(self.principal, self.rate, self.last_settled.elapsed_since(now))
    }

    /// Interest accrued since the last settlement.
    pub fn pending_interest(&self, now: Timestamp) -> Option<u128> {
        self.balance_checked(now)?.checked_sub(self.principal)
    }

    /// The state after folding accrued interest into principal at `now`,
    /// together with the settled amount.
    ///
    /// The clock moves to `now` even when nothing accrued, so the same window
    /// is never counted twice.
    pub fn settled(&self, now: Timestamp) -> Option<(Self, u128)> {
        let increase = self.pending_interest(now)?;
        let settled = Self {
            principal: self.principal.checked_add(increase)?,
            rate: self.rate,
            last_settled: now.max(self.last_settled),
        };
        Some((settled, increase))
    }

    /// No principal and no assigned rate; such an account need not be stored.
    pub fn is_blank(&self) -> bool {
        self.principal == 0 && self.rate.is_zero()
    }
}
