//! Nullable custody: an in-memory backing asset with switchable failures.

use rebase_types::AccountId;
use rebase_vault::{BackingCustody, CustodyError};
use std::collections::HashMap;

/// Holds backing value in memory and tracks what each account paid in and
/// got back.
#[derive(Default)]
pub struct NullCustody {
    reserves: u128,
    deposited: HashMap<AccountId, u128>,
    released: HashMap<AccountId, u128>,
    fail_accept: bool,
    fail_release: bool,
}

impl NullCustody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_accept(&mut self, fail: bool) {
        self.fail_accept = fail;
    }

    pub fn set_fail_release(&mut self, fail: bool) {
        self.fail_release = fail;
    }

    pub fn deposited_by(&self, account: &AccountId) -> u128 {
        self.deposited.get(account).copied().unwrap_or(0)
    }

    pub fn released_to(&self, account: &AccountId) -> u128 {
        self.released.get(account).copied().unwrap_or(0)
    }
}

impl BackingCustody for NullCustody {
    fn accept(&mut self, from: &AccountId, value: u128) -> Result<(), CustodyError> {
        if self.fail_accept {
            return Err(CustodyError::Rejected("accept disabled".into()));
        }
        self.reserves = self
            .reserves
            .checked_add(value)
            .ok_or_else(|| CustodyError::Rejected("reserves overflow".into()))?;
        *self.deposited.entry(from.clone()).or_default() += value;
        Ok(())
    }

    fn release(&mut self, to: &AccountId, value: u128) -> Result<(), CustodyError> {
        if self.fail_release {
            return Err(CustodyError::Rejected("release disabled".into()));
        }
        if value > self.reserves {
            return Err(CustodyError::InsufficientReserves {
                needed: value,
                available: self.reserves,
            });
        }
        self.reserves -= value;
        *self.released.entry(to.clone()).or_default() += value;
        Ok(())
    }

    fn reserves(&self) -> u128 {
        self.reserves
    }
}
