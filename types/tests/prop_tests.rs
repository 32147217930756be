use proptest::prelude::*;

use rebase_types::{AccountId, Amount, DomainId, Rate, Timestamp};

proptest! {
    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// Timestamp elapsed_since: elapsed_since(now) = now - self (saturating).
    #[test]
    fn timestamp_elapsed_since(base in 0u64..1_000_000, offset in 0u64..1_000_000) {
        let t = Timestamp::new(base);
        let now = Timestamp::new(base + offset);
        prop_assert_eq!(t.elapsed_since(now), offset);
    }

    /// Timestamp elapsed_since saturates to 0 when now < self.
    #[test]
    fn timestamp_elapsed_since_saturates(
        base in 1u64..1_000_000,
        deficit in 1u64..1_000_000,
    ) {
        let later = Timestamp::new(base + deficit);
        let earlier = Timestamp::new(base);
        prop_assert_eq!(later.elapsed_since(earlier), 0);
    }

    /// plus_secs never wraps.
    #[test]
    fn timestamp_plus_secs_saturates(base in 0u64..u64::MAX, secs in 0u64..u64::MAX) {
        let shifted = Timestamp::new(base).plus_secs(secs);
        prop_assert!(shifted >= Timestamp::new(base));
    }

    /// Amount::All always resolves to the full available balance.
    #[test]
    fn amount_all_resolves_to_available(available in 0u128..u128::MAX) {
        prop_assert_eq!(Amount::All.resolve(available), available);
    }

    /// Amount::Exact is independent of the available balance.
    #[test]
    fn amount_exact_is_unchanged(amount in 0u128..u128::MAX, available in 0u128..u128::MAX) {
        prop_assert_eq!(Amount::Exact(amount).resolve(available), amount);
    }

    /// Rate ordering follows the raw value, which the monotone global rate relies on.
    #[test]
    fn rate_ordering(a in 0u128..u128::MAX, b in 0u128..u128::MAX) {
        prop_assert_eq!(Rate::new(a) <= Rate::new(b), a <= b);
    }

    /// Domain ids survive the bincode boundary used by the bridge wire format.
    #[test]
    fn domain_id_bincode_roundtrip(id in 0u64..u64::MAX) {
        let domain = DomainId::new(id);
        let encoded = bincode::serialize(&domain).unwrap();
        let decoded: DomainId = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, domain);
    }

    /// Any prefixed alphanumeric name parses as an account.
    #[test]
    fn account_parse_accepts_prefixed(name in "[a-z0-9]{1,40}") {
        let raw = format!("acct_{name}");
        let id = AccountId::parse(&raw).unwrap();
        prop_assert_eq!(id.as_str(), raw.as_str());
    }
}
