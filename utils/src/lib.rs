//! Shared utilities for the rebase workspace.

pub mod logging;
pub mod rate;
pub mod time;

pub use logging::init_tracing;
pub use rate::{annual_rate_bps, format_rate};
pub use time::{format_duration, format_elapsed};
