use rebase_ledger::LedgerError;
use rebase_types::AccountId;
use thiserror::Error;

use crate::custody::CustodyError;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("deposit amount must be non-zero")]
    ZeroAmountRejected,

    #[error("releasing {amount} to {account} failed; redemption rolled back: {source}")]
    ReleaseFailed {
        account: AccountId,
        amount: u128,
        #[source]
        source: CustodyError,
    },

    #[error("custody refused deposit of {amount} from {account}; mint rolled back: {source}")]
    DepositRejected {
        account: AccountId,
        amount: u128,
        #[source]
        source: CustodyError,
    },

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
