//! Blake2b digests of encoded messages.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use rebase_types::MessageDigest;

use crate::codec;
use crate::error::MessageError;
use crate::message::BridgeMessage;

type Blake2b256 = Blake2b<U32>;

/// 256-bit Blake2b of arbitrary bytes.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Digest of the canonical encoding of `message`.
pub fn message_digest(message: &BridgeMessage) -> Result<MessageDigest, MessageError> {
    let bytes = codec::encode(message)?;
    Ok(MessageDigest::new(blake2b_256(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebase_types::{AccountId, DomainId, Rate};

    fn sample() -> BridgeMessage {
        BridgeMessage {
            source_domain: DomainId::new(1),
            destination_domain: DomainId::new(2),
            sequence: 0,
            sender: AccountId::new("acct_alice"),
            destination_account: AccountId::new("acct_bob"),
            amount: 40,
            rate: Rate::new(7),
        }
    }

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(
            message_digest(&sample()).unwrap(),
            message_digest(&sample()).unwrap()
        );
    }

    #[test]
    fn any_field_change_changes_digest() {
        let base = message_digest(&sample()).unwrap();
        let mut altered = sample();
        altered.amount = 41;
        assert_ne!(message_digest(&altered).unwrap(), base);

        let mut altered = sample();
        altered.rate = Rate::new(8);
        assert_ne!(message_digest(&altered).unwrap(), base);
    }

    #[test]
    fn blake2b_known_lengths() {
        assert_ne!(blake2b_256(b""), [0u8; 32]);
        assert_ne!(blake2b_256(b"a"), blake2b_256(b"b"));
    }
}
