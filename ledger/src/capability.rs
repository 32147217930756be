//! The three surfaces a ledger exposes.
//!
//! Holders and observers see [`BalanceLedger`]; vaults and bridge endpoints
//! work against [`MintBurnLedger`]; the rate administrator uses
//! [`RateAdmin`]. [`AccrualLedger`](crate::AccrualLedger) implements all
//! three.

use crate::checkpoint::LedgerCheckpoint;
use crate::error::LedgerError;
use rebase_types::{AccountId, Amount, Rate, Timestamp};

/// Read queries and holder-initiated transfers.
pub trait BalanceLedger {
    /// Balance including unsettled interest at `now`.
    fn balance_of(&self, account: &AccountId, now: Timestamp) -> u128;
    /// Settled principal, excluding interest accrued since the last settlement.
    fn principal_of(&self, account: &AccountId) -> u128;
    /// The account's frozen rate (zero for unknown accounts).
    fn rate_of(&self, account: &AccountId) -> Rate;
    /// The rate new depositors receive.
    fn global_rate(&self) -> Rate;
    /// Move principal between holders after settling both. Returns the moved amount.
    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<u128, LedgerError>;
}

/// Mint and burn, restricted to capability holders.
pub trait MintBurnLedger: BalanceLedger {
    fn mint(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
        amount: u128,
        rate: Rate,
        now: Timestamp,
    ) -> Result<(), LedgerError>;

    /// Burn from `account`. Returns the burned amount (resolved for [`Amount::All`]).
    fn burn(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<u128, LedgerError>;

    fn checkpoint(&self, accounts: &[&AccountId]) -> LedgerCheckpoint;

    fn restore(&mut self, checkpoint: LedgerCheckpoint);
}

/// Administrative operations, restricted to the ledger admin.
pub trait RateAdmin {
    fn set_global_rate(&mut self, caller: &AccountId, new_rate: Rate) -> Result<(), LedgerError>;

    fn grant_mint_and_burn_role(
        &mut self,
        caller: &AccountId,
        grantee: &AccountId,
    ) -> Result<(), LedgerError>;

    fn revoke_mint_and_burn_role(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
    ) -> Result<(), LedgerError>;
}
