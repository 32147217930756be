//! Nullable infrastructure for deterministic testing.
//!
//! Everything a domain touches outside its own ledger (time, storage, the
//! backing asset, message transport) sits behind a trait or a plain value.
//! The implementations here:
//! - return deterministic values
//! - can be steered programmatically, including into failure
//! - never touch the filesystem or network

pub mod clock;
pub mod custody;
pub mod store;
pub mod transport;

pub use clock::NullClock;
pub use custody::NullCustody;
pub use store::{NullConsumedStore, NullLedgerStore};
pub use transport::NullTransport;
