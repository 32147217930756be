use rebase_types::DomainId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("ledger error: {0}")]
    Ledger(#[from] rebase_ledger::LedgerError),

    #[error("vault error: {0}")]
    Vault(#[from] rebase_vault::VaultError),

    #[error("bridge error: {0}")]
    Bridge(#[from] rebase_bridge::BridgeError),

    #[error("message error: {0}")]
    Message(#[from] rebase_messages::MessageError),

    #[error("store error: {0}")]
    Store(#[from] rebase_store::StoreError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("unknown domain: {0}")]
    UnknownDomain(DomainId),

    #[error("relay is shut down")]
    RelayClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
