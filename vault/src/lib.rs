//! Vault: converts backing value into ledger principal and back.
//!
//! Deposits mint at the ledger's current global rate; redemptions burn and
//! then release backing value 1:1. Custody of the backing asset is an
//! external collaborator behind [`BackingCustody`].

pub mod custody;
pub mod error;
pub mod vault;

pub use custody::{BackingCustody, CustodyError};
pub use error::VaultError;
pub use vault::Vault;
