//! Capability checks: one admin, a set of mint/burn holders.

use crate::error::LedgerError;
use rebase_types::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    admin: AccountId,
    minters: BTreeSet<AccountId>,
}

impl AccessControl {
    pub fn new(admin: AccountId) -> Self {
        Self {
            admin,
            minters: BTreeSet::new(),
        }
    }

    pub fn admin(&self) -> &AccountId {
        &self.admin
    }

    pub fn is_minter(&self, who: &AccountId) -> bool {
        self.minters.contains(who)
    }

    pub fn minters(&self) -> impl Iterator<Item = &AccountId> {
        self.minters.iter()
    }

    pub fn require_admin(&self, caller: &AccountId) -> Result<(), LedgerError> {
        if *caller == self.admin {
            Ok(())
        } else {
            Err(LedgerError::UnauthorizedAdmin(caller.clone()))
        }
    }

    pub fn require_minter(&self, caller: &AccountId) -> Result<(), LedgerError> {
        if self.is_minter(caller) {
            Ok(())
        } else {
            Err(LedgerError::UnauthorizedMinter(caller.clone()))
        }
    }

    /// Returns `true` if the grantee did not hold the capability before.
    pub fn grant(&mut self, grantee: AccountId) -> bool {
        self.minters.insert(grantee)
    }

    /// Returns `true` if the account held the capability.
    pub fn revoke(&mut self, account: &AccountId) -> bool {
        self.minters.remove(account)
    }
}
