//! Ledger errors.
//!
//! Every variant is terminal for the call that produced it: the ledger never
//! keeps a partially applied mutation.

use rebase_store::StoreError;
use rebase_types::{AccountId, Rate, Timestamp};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("global rate can only decrease: current {current}, requested {requested}")]
    RateIncreaseRejected { current: Rate, requested: Rate },

    #[error("insufficient principal: need {needed}, available {available}")]
    InsufficientPrincipal { needed: u128, available: u128 },

    #[error("insufficient allowance: need {needed}, approved {approved}")]
    InsufficientAllowance { needed: u128, approved: u128 },

    #[error("{0} does not hold the mint and burn capability")]
    UnauthorizedMinter(AccountId),

    #[error("{0} is not the ledger admin")]
    UnauthorizedAdmin(AccountId),

    #[error("timestamp {now} precedes the last applied mutation at {last}")]
    ClockRegression { last: Timestamp, now: Timestamp },

    #[error("arithmetic overflow in ledger computation")]
    Overflow,

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}
