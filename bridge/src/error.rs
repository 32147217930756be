use rebase_ledger::LedgerError;
use rebase_messages::{MessageError, MessageId};
use rebase_store::StoreError;
use rebase_types::{AccountId, DomainId};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridge amount must be non-zero")]
    ZeroAmountRejected,

    #[error("no route to {0}")]
    UnknownDomain(DomainId),

    #[error("invalid destination account: {0}")]
    InvalidAccount(AccountId),

    #[error("message rejected: {0}")]
    DuplicateOrInvalidMessage(RejectReason),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("message error: {0}")]
    Message(#[from] MessageError),
}

/// Why an inbound message was not applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    AlreadyConsumed(MessageId),
    /// Same id as a consumed message, different payload.
    DigestMismatch(MessageId),
    WrongDestination { id: MessageId, destination: DomainId },
    UntrustedSource(DomainId),
    Malformed(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyConsumed(id) => write!(f, "{id} already consumed"),
            Self::DigestMismatch(id) => write!(f, "{id} redelivered with a different payload"),
            Self::WrongDestination { id, destination } => {
                write!(f, "{id} is addressed to {destination}")
            }
            Self::UntrustedSource(domain) => write!(f, "source {domain} is not configured"),
            Self::Malformed(reason) => write!(f, "malformed: {reason}"),
        }
    }
}
