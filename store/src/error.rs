use thiserror::Error;

/// Failures a storage backend can report to the ledger or a bridge endpoint.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record the caller requires is absent (e.g. ledger meta on load).
    #[error("missing record: {0}")]
    NotFound(String),

    /// A write-once key was written twice.
    #[error("record already exists: {0}")]
    Duplicate(String),

    /// The backend refused or failed the operation.
    #[error("storage backend failed: {0}")]
    Backend(String),

    /// A stored value does not have the expected shape.
    #[error("stored record is malformed: {0}")]
    Corruption(String),
}
