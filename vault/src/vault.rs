//! Deposit and redemption.
//!
//! Ordering contract: ledger state changes first, external value movement
//! second. If the external step fails, the ledger is restored from the
//! checkpoint taken at the start of the call, so a burn is never observable
//! without its matching release (and a mint never without its deposit).

use rebase_ledger::MintBurnLedger;
use rebase_types::{AccountId, Amount, Timestamp};
use tracing::{debug, info, warn};

use crate::custody::BackingCustody;
use crate::error::VaultError;

/// A vault bound to one ledger through its mint/burn capability.
///
/// The vault's `id` is the account the ledger admin grants the capability to.
pub struct Vault<C: BackingCustody> {
    id: AccountId,
    custody: C,
}

impl<C: BackingCustody> Vault<C> {
    pub fn new(id: AccountId, custody: C) -> Self {
        Self { id, custody }
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn custody(&self) -> &C {
        &self.custody
    }

    pub fn custody_mut(&mut self) -> &mut C {
        &mut self.custody
    }

    /// Take `value` of backing asset and mint the same principal to `caller`
    /// at the ledger's current global rate.
    pub fn deposit<L: MintBurnLedger>(
        &mut self,
        ledger: &mut L,
        caller: &AccountId,
        value: u128,
        now: Timestamp,
    ) -> Result<(), VaultError> {
        if value == 0 {
            return Err(VaultError::ZeroAmountRejected);
        }
        let rate = ledger.global_rate();
        let checkpoint = ledger.checkpoint(&[caller]);
        ledger.mint(&self.id, caller, value, rate, now)?;

        if let Err(source) = self.custody.accept(caller, value) {
            ledger.restore(checkpoint);
            warn!(vault = %self.id, account = %caller, value, error = %source, "deposit rejected by custody, mint rolled back");
            return Err(VaultError::DepositRejected {
                account: caller.clone(),
                amount: value,
                source,
            });
        }
        info!(vault = %self.id, account = %caller, value, %rate, "deposit");
        Ok(())
    }

    /// Burn `amount` (or the whole settled balance) from `caller` and release
    /// the same value of backing asset. Returns the released amount.
    pub fn redeem<L: MintBurnLedger>(
        &mut self,
        ledger: &mut L,
        caller: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<u128, VaultError> {
        let checkpoint = ledger.checkpoint(&[caller]);
        let burned = ledger.burn(&self.id, caller, amount, now)?;

        if let Err(source) = self.custody.release(caller, burned) {
            ledger.restore(checkpoint);
            warn!(vault = %self.id, account = %caller, burned, error = %source, "release failed, burn rolled back");
            return Err(VaultError::ReleaseFailed {
                account: caller.clone(),
                amount: burned,
                source,
            });
        }
        info!(vault = %self.id, account = %caller, released = burned, "redeem");
        Ok(burned)
    }

    /// Add backing value that pays for accrued interest. Mints nothing.
    pub fn fund_rewards(&mut self, from: &AccountId, value: u128) -> Result<(), VaultError> {
        if value == 0 {
            return Err(VaultError::ZeroAmountRejected);
        }
        self.custody
            .accept(from, value)
            .map_err(|source| VaultError::DepositRejected {
                account: from.clone(),
                amount: value,
                source,
            })?;
        debug!(vault = %self.id, %from, value, "rewards funded");
        Ok(())
    }
}
