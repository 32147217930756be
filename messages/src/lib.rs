//! Cross-domain bridge messages.
//!
//! A [`BridgeMessage`] carries value burned on a source domain to the
//! destination domain that mints it back. Messages travel as versioned
//! bincode frames (see [`codec`]); the destination keys its replay registry
//! by [`MessageId`] and stores the [`digest`] of the frame it applied.

pub mod codec;
pub mod digest;
pub mod error;
pub mod message;

pub use codec::{decode, encode, MAX_MESSAGE_SIZE, WIRE_VERSION};
pub use digest::{blake2b_256, message_digest};
pub use error::MessageError;
pub use message::{BridgeMessage, MessageId};
