//! Abstract storage traits for the rebase workspace.
//!
//! Every storage backend (in-memory for testing, embedded databases in
//! production) implements these traits. The ledger and bridge crates depend
//! only on the traits.

pub mod consumed;
pub mod error;
pub mod ledger;

pub use consumed::ConsumedMessageStore;
pub use error::StoreError;
pub use ledger::LedgerStore;
