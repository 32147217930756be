//! Events journaled by the ledger for observers.

use rebase_types::{AccountId, Rate};
use serde::{Deserialize, Serialize};

/// A committed ledger mutation.
///
/// The ledger appends events as mutations commit; the owner drains them with
/// [`AccrualLedger::drain_events`](crate::AccrualLedger::drain_events).
/// Rolling back to a checkpoint discards events recorded after it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// Accrued interest was folded into principal.
    InterestSettled { account: AccountId, amount: u128 },
    Minted {
        account: AccountId,
        amount: u128,
        rate: Rate,
    },
    Burned { account: AccountId, amount: u128 },
    Transferred {
        from: AccountId,
        to: AccountId,
        amount: u128,
    },
    /// A previously unfunded recipient took over the sender's rate.
    RateInherited { account: AccountId, rate: Rate },
    Approval {
        owner: AccountId,
        spender: AccountId,
        amount: u128,
    },
    GlobalRateChanged { old: Rate, new: Rate },
    MinterGranted { account: AccountId },
    MinterRevoked { account: AccountId },
}
