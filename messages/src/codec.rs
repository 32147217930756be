//! Wire framing: one version byte followed by the bincode body.

use crate::error::MessageError;
use crate::message::BridgeMessage;

/// Current frame version.
pub const WIRE_VERSION: u8 = 1;

/// Maximum frame size in bytes, version byte included.
pub const MAX_MESSAGE_SIZE: usize = 4 * 1024;

/// Encode a message into a versioned frame.
pub fn encode(message: &BridgeMessage) -> Result<Vec<u8>, MessageError> {
    let body = bincode::serialize(message).map_err(|e| MessageError::Malformed(e.to_string()))?;
    let size = body.len() + 1;
    if size > MAX_MESSAGE_SIZE {
        return Err(MessageError::MessageTooLarge {
            size,
            max: MAX_MESSAGE_SIZE,
        });
    }
    let mut frame = Vec::with_capacity(size);
    frame.push(WIRE_VERSION);
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Decode a frame. Identifiers that fail validation are reported as malformed.
pub fn decode(frame: &[u8]) -> Result<BridgeMessage, MessageError> {
    if frame.len() > MAX_MESSAGE_SIZE {
        return Err(MessageError::MessageTooLarge {
            size: frame.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    let (&version, body) = frame.split_first().ok_or(MessageError::Empty)?;
    if version != WIRE_VERSION {
        return Err(MessageError::UnsupportedVersion(version));
    }
    let message: BridgeMessage =
        bincode::deserialize(body).map_err(|e| MessageError::Malformed(e.to_string()))?;
    if !message.sender.is_valid() || !message.destination_account.is_valid() {
        return Err(MessageError::Malformed("invalid account identifier".into()));
    }
    Ok(message)
}
