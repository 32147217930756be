//! Ledger-wide state.

use crate::error::LedgerError;
use rebase_types::Rate;
use serde::{Deserialize, Serialize};

/// The rate offered to new depositors. Owned by one ledger instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalState {
    global_rate: Rate,
}

impl GlobalState {
    pub fn new(initial_rate: Rate) -> Self {
        Self {
            global_rate: initial_rate,
        }
    }

    pub fn global_rate(&self) -> Rate {
        self.global_rate
    }

    /// Lower (or keep) the global rate. Returns the previous rate.
    ///
    /// The rate never increases over the ledger's lifetime.
    pub fn lower_to(&mut self, new_rate: Rate) -> Result<Rate, LedgerError> {
        if new_rate > self.global_rate {
            return Err(LedgerError::RateIncreaseRejected {
                current: self.global_rate,
                requested: new_rate,
            });
        }
        let old = self.global_rate;
        self.global_rate = new_rate;
        Ok(old)
    }
}
