use proptest::prelude::*;

use rebase_ledger::{AccrualLedger, LedgerError};
use rebase_types::{AccountId, Amount, DomainId, LedgerParams, Rate, Timestamp, PRECISION};

fn account(name: &str) -> AccountId {
    AccountId::new(format!("acct_{name}"))
}

fn funded_ledger(rate: u128, principal: u128, at: u64) -> AccrualLedger {
    let admin = account("admin");
    let minter = account("minter");
    let mut ledger = AccrualLedger::new(
        DomainId::new(1),
        admin.clone(),
        &LedgerParams {
            initial_global_rate: Rate::new(rate),
        },
    );
    ledger.grant_mint_and_burn_role(&admin, &minter).unwrap();
    ledger
        .mint(&minter, &account("alice"), principal, Rate::new(rate), Timestamp::new(at))
        .unwrap();
    ledger
}

proptest! {
    /// Equal time steps add equal interest (within one unit of truncation).
    #[test]
    fn accrual_is_linear_between_mutations(
        rate in 0u128..PRECISION / 1_000,
        principal in 0u128..1_000_000_000_000_000_000_000,
        start in 0u64..1_000_000,
        step in 1u64..1_000_000,
    ) {
        let ledger = funded_ledger(rate, principal, start);
        let alice = account("alice");
        let b0 = ledger.balance_of(&alice, Timestamp::new(start));
        let b1 = ledger.balance_of(&alice, Timestamp::new(start + step));
        let b2 = ledger.balance_of(&alice, Timestamp::new(start + 2 * step));
        let first = b1 - b0;
        let second = b2 - b1;
        prop_assert!(first.abs_diff(second) <= 1, "first={} second={}", first, second);
    }

    /// Balance never decreases with time while nothing mutates the account.
    #[test]
    fn balance_monotonic_in_time(
        rate in 0u128..PRECISION,
        principal in 0u128..u64::MAX as u128,
        t1 in 0u64..1_000_000,
        dt in 0u64..1_000_000,
    ) {
        let ledger = funded_ledger(rate, principal, 0);
        let alice = account("alice");
        let a = ledger.balance_of(&alice, Timestamp::new(t1));
        let b = ledger.balance_of(&alice, Timestamp::new(t1 + dt));
        prop_assert!(b >= a);
    }

    /// A transfer leaves the sum of both balances unchanged.
    #[test]
    fn transfer_conserves_balances(
        rate in 0u128..PRECISION / 1_000,
        principal in 1u128..1_000_000_000_000,
        elapsed in 0u64..100_000,
        pct in 0u128..=100,
    ) {
        let mut ledger = funded_ledger(rate, principal, 0);
        let alice = account("alice");
        let bob = account("bob");
        let now = Timestamp::new(elapsed);
        let before = ledger.balance_of(&alice, now) + ledger.balance_of(&bob, now);
        let amount = ledger.balance_of(&alice, now) * pct / 100;
        ledger.transfer(&alice, &bob, Amount::Exact(amount), now).unwrap();
        let after = ledger.balance_of(&alice, now) + ledger.balance_of(&bob, now);
        prop_assert_eq!(before, after);
        prop_assert_eq!(ledger.total_principal(), after);
    }

    /// A rate above the current global rate is always refused.
    #[test]
    fn global_rate_never_increases(current in 0u128..u128::MAX - 1, bump in 1u128..1_000) {
        let mut ledger = funded_ledger(current, 1, 0);
        let requested = Rate::new(current.saturating_add(bump));
        let result = ledger.set_global_rate(&account("admin"), requested);
        prop_assert!(
            matches!(result, Err(LedgerError::RateIncreaseRejected { .. })),
            "expected RateIncreaseRejected"
        );
        prop_assert_eq!(ledger.global_rate(), Rate::new(current));
    }

    /// Burning everything always empties the account.
    #[test]
    fn burn_all_zeroes_balance(
        rate in 0u128..PRECISION / 1_000,
        principal in 0u128..1_000_000_000_000,
        elapsed in 0u64..1_000_000,
    ) {
        let mut ledger = funded_ledger(rate, principal, 0);
        let alice = account("alice");
        let now = Timestamp::new(elapsed);
        let expected = ledger.balance_of(&alice, now);
        let burned = ledger.burn(&account("minter"), &alice, Amount::All, now).unwrap();
        prop_assert_eq!(burned, expected);
        prop_assert_eq!(ledger.balance_of(&alice, now), 0);
        prop_assert_eq!(ledger.total_principal(), 0);
    }
}
