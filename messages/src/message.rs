//! The bridge message and its identity.

use rebase_types::{AccountId, DomainId, Rate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value in transit between two domains.
///
/// `amount` was burned from `sender` on `source_domain`; the destination
/// mints it to `destination_account` at `rate`, the sender's frozen rate at
/// the time of the burn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeMessage {
    pub source_domain: DomainId,
    pub destination_domain: DomainId,
    /// Per-source outbound counter, starting at zero.
    pub sequence: u64,
    pub sender: AccountId,
    pub destination_account: AccountId,
    pub amount: u128,
    pub rate: Rate,
}

impl BridgeMessage {
    pub fn id(&self) -> MessageId {
        MessageId {
            source_domain: self.source_domain,
            sequence: self.sequence,
        }
    }

    /// Structural checks that need no ledger state.
    pub fn is_well_formed(&self) -> bool {
        self.amount > 0
            && self.source_domain != self.destination_domain
            && self.sender.is_valid()
            && self.destination_account.is_valid()
    }
}

/// Globally unique message identity: a source never reuses a sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId {
    pub source_domain: DomainId,
    pub sequence: u64,
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source_domain, self.sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> BridgeMessage {
        BridgeMessage {
            source_domain: DomainId::new(1),
            destination_domain: DomainId::new(2),
            sequence: 3,
            sender: AccountId::new("acct_alice"),
            destination_account: AccountId::new("acct_bob"),
            amount: 10,
            rate: Rate::new(1),
        }
    }

    #[test]
    fn id_is_source_and_sequence() {
        let id = message().id();
        assert_eq!(id.source_domain, DomainId::new(1));
        assert_eq!(id.sequence, 3);
        assert_eq!(id.to_string(), "domain#1/3");
    }

    #[test]
    fn zero_amount_is_not_well_formed() {
        let mut m = message();
        assert!(m.is_well_formed());
        m.amount = 0;
        assert!(!m.is_well_formed());
    }

    #[test]
    fn loopback_is_not_well_formed() {
        let mut m = message();
        m.destination_domain = m.source_domain;
        assert!(!m.is_well_formed());
    }
}
