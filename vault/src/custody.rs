//! Boundary to whatever holds the backing asset.

use rebase_types::AccountId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CustodyError {
    #[error("insufficient reserves: need {needed}, hold {available}")]
    InsufficientReserves { needed: u128, available: u128 },

    #[error("custody rejected the transfer: {0}")]
    Rejected(String),
}

/// Holds the backing asset for one vault.
///
/// Amounts are exchanged 1:1 with ledger principal; there is no fee.
pub trait BackingCustody {
    /// Take `value` of backing asset from `from` into custody.
    fn accept(&mut self, from: &AccountId, value: u128) -> Result<(), CustodyError>;

    /// Send `value` of backing asset out of custody to `to`.
    fn release(&mut self, to: &AccountId, value: u128) -> Result<(), CustodyError>;

    /// Backing asset currently held.
    fn reserves(&self) -> u128;
}
