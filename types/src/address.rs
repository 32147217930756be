//! Account identifier with `acct_` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A ledger account, always prefixed with `acct_`.
///
/// Accounts are plain holders of principal. Vaults and bridge endpoints are
/// accounts too: the minter capability is granted to their identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// The standard prefix for all account identifiers.
    pub const PREFIX: &'static str = "acct_";

    /// Create a new account identifier from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `acct_`. Use [`AccountId::parse`]
    /// for untrusted input.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "account must start with acct_");
        Self(s)
    }

    /// Parse an identifier from untrusted input (CLI, wire, config).
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let id = Self(raw.to_string());
        if id.is_valid() {
            Ok(id)
        } else {
            Err(TypesError::InvalidAccount(raw.to_string()))
        }
    }

    /// Return the raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier carries the prefix, a non-empty name, and no whitespace.
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(Self::PREFIX)
            && self.0.len() > Self::PREFIX.len()
            && !self.0.chars().any(char::is_whitespace)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_prefixed_names() {
        let id = AccountId::parse("acct_alice").unwrap();
        assert_eq!(id.as_str(), "acct_alice");
        assert!(id.is_valid());
    }

    #[test]
    fn parse_rejects_bare_prefix_and_foreign_names() {
        assert!(AccountId::parse("acct_").is_err());
        assert!(AccountId::parse("alice").is_err());
        assert!(AccountId::parse("acct_al ice").is_err());
    }

    #[test]
    #[should_panic(expected = "acct_")]
    fn new_panics_without_prefix() {
        AccountId::new("bob");
    }
}
