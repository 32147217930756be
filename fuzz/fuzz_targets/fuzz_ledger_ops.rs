#![no_main]

use libfuzzer_sys::fuzz_target;

use rebase_ledger::AccrualLedger;
use rebase_types::{AccountId, Amount, DomainId, LedgerParams, Rate, Timestamp};

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[..bytes.len().min(8)].copy_from_slice(&bytes[..bytes.len().min(8)]);
    u64::from_le_bytes(buf)
}

// Drive a ledger with arbitrary operations. Nothing may panic, and the
// tracked total must equal the sum of stored principals after each step.
fuzz_target!(|data: &[u8]| {
    let admin = AccountId::new("acct_admin");
    let accounts = [
        AccountId::new("acct_a"),
        AccountId::new("acct_b"),
        AccountId::new("acct_c"),
    ];
    let mut ledger = AccrualLedger::new(DomainId::new(1), admin.clone(), &LedgerParams::default());
    ledger
        .grant_mint_and_burn_role(&admin, &admin)
        .expect("admin grants itself");

    let mut now = 0u64;
    for op in data.chunks(10) {
        if op.len() < 2 {
            break;
        }
        let who = &accounts[op[1] as usize % accounts.len()];
        let other = &accounts[(op[1] as usize / 3) % accounts.len()];
        let value = u128::from(read_u64(&op[2..]));
        now = now.saturating_add(u64::from(op[0] >> 4) * 3_600);
        let at = Timestamp::new(now);

        let _ = match op[0] % 5 {
            0 => ledger.mint(&admin, who, value, ledger.global_rate(), at).map(|_| 0),
            1 => ledger.burn(&admin, who, Amount::Exact(value), at),
            2 => ledger.transfer(who, other, Amount::Exact(value), at),
            3 => ledger
                .set_global_rate(&admin, Rate::new(value))
                .map(|_| 0),
            _ => ledger.burn(&admin, who, Amount::All, at),
        };

        ledger.drain_events();

        let stored: u128 = ledger.accounts().map(|(_, state)| state.principal).sum();
        assert_eq!(stored, ledger.total_principal());
    }
});
