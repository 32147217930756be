//! Ledger parameters fixed at ledger creation.

use crate::rate::Rate;
use serde::{Deserialize, Serialize};

/// Default global rate: 5e10 at 1e18 precision, i.e. 5e-8 of principal per second.
pub const DEFAULT_GLOBAL_RATE: Rate = Rate::new(50_000_000_000);

/// Parameters a ledger is created with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerParams {
    /// Rate offered to new depositors until the admin lowers it.
    pub initial_global_rate: Rate,
}

impl Default for LedgerParams {
    fn default() -> Self {
        Self {
            initial_global_rate: DEFAULT_GLOBAL_RATE,
        }
    }
}
