//! Amount selection for burns, transfers and redemptions.
//!
//! Callers either name an exact principal amount or ask for the whole settled
//! balance. There is no magic numeric sentinel for "everything".

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much of an account's settled balance an operation should move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Amount {
    /// Exactly this many raw units.
    Exact(u128),
    /// The account's full balance after settlement.
    All,
}

impl Amount {
    /// Resolve against the settled balance of the account.
    ///
    /// `All` resolves to `available`; `Exact` is returned as-is, even if it
    /// exceeds `available` (the caller rejects that case).
    pub fn resolve(self, available: u128) -> u128 {
        match self {
            Self::Exact(amount) => amount,
            Self::All => available,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl From<u128> for Amount {
    fn from(amount: u128) -> Self {
        Self::Exact(amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(amount) => write!(f, "{amount}"),
            Self::All => write!(f, "all"),
        }
    }
}
