//! Parsing errors for the fundamental types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid account identifier: {0}")]
    InvalidAccount(String),

    #[error("invalid domain identifier: {0}")]
    InvalidDomain(String),
}
