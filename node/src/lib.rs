//! Rebase node: hosts a set of ledger domains in one process.
//!
//! The node:
//! - assembles each domain (ledger, vault, bridge endpoint) from config
//! - relays bridge messages between domains asynchronously, with optional
//!   reordering and bounded retries
//! - publishes ledger events to an [`EventBus`] and Prometheus metrics

pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod ledger_event;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod relay;

pub use clock::{Clock, SystemClock};
pub use config::{DomainConfig, NodeConfig, RelayConfig};
pub use domain::{
    bridge_account, vault_account, AccountSnapshot, Domain, DomainSetup, DomainSnapshot,
    Observers,
};
pub use error::NodeError;
pub use ledger_event::EventBus;
pub use logging::{init_logging, LogFormat};
pub use metrics::DomainMetrics;
pub use node::RebaseNode;
pub use relay::{DeadLetter, Relay, RelayStats, SharedDomain, SubmitSlot};
