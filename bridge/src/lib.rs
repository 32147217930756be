//! Bridge endpoint: lock/burn on the source domain, release/mint on the
//! destination, with the sender's frozen rate carried in the message.

pub mod endpoint;
pub mod error;

pub use endpoint::BridgeEndpoint;
pub use error::{BridgeError, RejectReason};
