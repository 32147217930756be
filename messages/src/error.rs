use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("unsupported wire version: {0}")]
    UnsupportedVersion(u8),

    #[error("message too large: {size} > {max}")]
    MessageTooLarge { size: usize, max: usize },

    #[error("empty frame")]
    Empty,

    #[error("malformed message: {0}")]
    Malformed(String),
}
