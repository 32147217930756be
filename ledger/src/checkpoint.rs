//! Checkpoints for multi-step calls that must fail as a whole.
//!
//! A vault redemption burns first and releases backing value second; if the
//! release fails the burn has to disappear with it. The caller takes a
//! checkpoint of the accounts it is about to touch and restores it on error.

use crate::account::AccountState;
use rebase_types::{AccountId, Timestamp};

/// Saved ledger state for a fixed set of accounts.
#[derive(Clone, Debug)]
#[must_use = "a checkpoint does nothing unless restored or dropped deliberately"]
pub struct LedgerCheckpoint {
    pub(crate) accounts: Vec<(AccountId, Option<AccountState>)>,
    pub(crate) total_principal: u128,
    pub(crate) clock: Timestamp,
    pub(crate) event_len: usize,
}

impl LedgerCheckpoint {
    /// Accounts covered by this checkpoint.
    pub fn accounts(&self) -> impl Iterator<Item = &AccountId> {
        self.accounts.iter().map(|(id, _)| id)
    }
}
