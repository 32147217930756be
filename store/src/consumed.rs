//! Replay registry storage for bridge endpoints.

use crate::StoreError;
use rebase_types::{DomainId, MessageDigest};

/// Records which inbound bridge messages an endpoint has already applied.
///
/// Keys are `(source_domain, sequence)` pairs; the value is the digest of the
/// applied payload so a redelivery with altered content can be told apart
/// from an honest duplicate.
pub trait ConsumedMessageStore {
    fn get_consumed(
        &self,
        source: DomainId,
        sequence: u64,
    ) -> Result<Option<MessageDigest>, StoreError>;

    /// Record a consumed message. Fails with [`StoreError::Duplicate`] if the
    /// key is already present.
    fn put_consumed(
        &self,
        source: DomainId,
        sequence: u64,
        digest: MessageDigest,
    ) -> Result<(), StoreError>;

    fn consumed_count(&self) -> Result<u64, StoreError>;

    /// Whether a message from `source` with `sequence` was already applied.
    fn is_consumed(&self, source: DomainId, sequence: u64) -> Result<bool, StoreError> {
        self.get_consumed(source, sequence).map(|d| d.is_some())
    }
}
