//! Domain identifier: one per independent ledger.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one ledger domain taking part in the bridge.
///
/// A domain owns exactly one ledger and one bridge endpoint. Messages name
/// both their source and destination domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DomainId(u64);

impl DomainId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "domain#{}", self.0)
    }
}

impl From<u64> for DomainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
