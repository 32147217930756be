//! Fundamental types for the rebase ledger.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! account identifiers, domain identifiers, amounts, rates, timestamps and digests.

pub mod address;
pub mod amount;
pub mod domain;
pub mod error;
pub mod hash;
pub mod params;
pub mod rate;
pub mod time;

pub use address::AccountId;
pub use amount::Amount;
pub use domain::DomainId;
pub use error::TypesError;
pub use hash::MessageDigest;
pub use params::LedgerParams;
pub use rate::{Rate, PRECISION};
pub use time::Timestamp;
