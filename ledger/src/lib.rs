//! Accrual ledger: the balance model of the rebase token.
//!
//! `balance(a, t) = principal(a) × (1 + rate(a) × (t − last_settled(a)))`
//!
//! This crate handles:
//! - Balance computation from principal, frozen rate and elapsed time
//! - Settlement of accrued interest before every mutation
//! - Mint / burn restricted to capability holders
//! - Transfers with rate inheritance for unfunded recipients
//! - The monotone (non-increasing) global rate
//! - Checkpoints for multi-step calls and an event journal for observers

pub mod access;
pub mod account;
pub mod capability;
pub mod checkpoint;
pub mod error;
pub mod event;
pub mod global;
pub mod ledger;
pub mod math;

pub use account::AccountState;
pub use capability::{BalanceLedger, MintBurnLedger, RateAdmin};
pub use checkpoint::LedgerCheckpoint;
pub use error::LedgerError;
pub use event::LedgerEvent;
pub use global::GlobalState;
pub use ledger::AccrualLedger;
