//! End-to-end tests across hosted domains:
//! deposit → bridge send → relay delivery → mint → redeem.
//!
//! These wire together the vault, the bridge endpoints and the relay the
//! same way the node does, with nullable custody, stores and clock.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use rebase_bridge::{BridgeError, RejectReason};
use rebase_ledger::{LedgerError, LedgerEvent};
use rebase_messages::codec;
use rebase_node::{
    Clock, Domain, DomainSetup, EventBus, NodeConfig, NodeError, Observers, RebaseNode,
};
use rebase_nullables::{NullClock, NullConsumedStore, NullCustody, NullTransport};
use rebase_store::ConsumedMessageStore;
use rebase_types::{AccountId, Amount, DomainId, LedgerParams, Rate, Timestamp, PRECISION};
use rebase_vault::VaultError;

type SimNode = RebaseNode<NullCustody, NullConsumedStore>;

const HOME: DomainId = DomainId::new(1);
const AWAY: DomainId = DomainId::new(2);
const RATE: u64 = (PRECISION / 1_000) as u64;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn account(name: &str) -> AccountId {
    AccountId::new(format!("acct_{name}"))
}

fn admin() -> AccountId {
    account("admin")
}

fn config() -> NodeConfig {
    let mut config = NodeConfig {
        initial_global_rate: RATE,
        ..NodeConfig::default()
    };
    config.relay.retry_delay_ms = 5;
    config
}

fn start(config: NodeConfig) -> (SimNode, Arc<NullClock>) {
    start_with_events(config, EventBus::new())
}

fn start_with_events(config: NodeConfig, events: EventBus) -> (SimNode, Arc<NullClock>) {
    let clock = Arc::new(NullClock::new(0));
    let node_clock: Arc<dyn Clock> = clock.clone();
    let node = RebaseNode::start(config, node_clock, events, |_| {
        (NullCustody::new(), NullConsumedStore::new())
    })
    .expect("node starts");
    (node, clock)
}

async fn rate_of(node: &SimNode, domain: DomainId, who: &AccountId) -> Rate {
    node.domain(domain).unwrap().lock().await.ledger().rate_of(who)
}

async fn principal_of(node: &SimNode, domain: DomainId, who: &AccountId) -> u128 {
    node.domain(domain)
        .unwrap()
        .lock()
        .await
        .ledger()
        .principal_of(who)
}

// ---------------------------------------------------------------------------
// 1. Bridge conservation and rate carry-over
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bridged_value_arrives_at_source_rate() {
    let (node, clock) = start(config());
    let alice = account("alice");
    let bob = account("bob");

    node.deposit(HOME, &alice, 100).await.unwrap();
    node.set_global_rate(AWAY, &admin(), Rate::new(1)).await.unwrap();

    node.bridge(HOME, &alice, 40, AWAY, &bob).await.unwrap();
    node.flush().await;

    assert_eq!(principal_of(&node, HOME, &alice).await, 60);
    assert_eq!(principal_of(&node, AWAY, &bob).await, 40);
    assert_eq!(rate_of(&node, AWAY, &bob).await, Rate::new(RATE as u128));

    clock.advance(10);
    assert_eq!(node.balance_of(HOME, &alice).await.unwrap(), 60);
    assert_eq!(node.balance_of(AWAY, &bob).await.unwrap(), 40);
    clock.advance(90);
    assert_eq!(node.balance_of(HOME, &alice).await.unwrap(), 66);
    assert_eq!(node.balance_of(AWAY, &bob).await.unwrap(), 44);
    node.shutdown().await;
}

#[tokio::test]
async fn send_settles_accrued_interest_before_burning() {
    let (node, clock) = start(config());
    let alice = account("alice");
    node.deposit(HOME, &alice, 100).await.unwrap();
    clock.advance(10);
    node.bridge(HOME, &alice, 40, AWAY, &account("bob"))
        .await
        .unwrap();
    node.flush().await;
    assert_eq!(principal_of(&node, HOME, &alice).await, 61);
    node.shutdown().await;
}

// ---------------------------------------------------------------------------
// 2. Reordered delivery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reordered_delivery_conserves_totals() {
    let mut config = config();
    config.relay.reorder = true;
    config.relay.reorder_seed = Some(42);
    let (node, _clock) = start(config);
    let alice = account("alice");
    node.deposit(HOME, &alice, 1_000).await.unwrap();

    let mut sent = 0u128;
    for i in 1..=20u128 {
        let to = account(&format!("r{}", i % 4));
        node.bridge(HOME, &alice, i, AWAY, &to).await.unwrap();
        sent += i;
    }
    node.flush().await;

    let away = node.domain(AWAY).unwrap();
    let away = away.lock().await;
    assert_eq!(away.ledger().total_principal(), sent);
    assert_eq!(away.endpoint().consumed().consumed_count().unwrap(), 20);
    drop(away);

    let stats = node.relay_stats();
    assert_eq!(stats.delivered, 20);
    assert_eq!(stats.pending, 0);
    assert_eq!(principal_of(&node, HOME, &alice).await, 1_000 - sent);
    node.shutdown().await;
}

// ---------------------------------------------------------------------------
// 3. Retries and dead letters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delivery_retries_until_registry_recovers() {
    let mut config = config();
    config.enable_metrics = true;
    config.relay.max_delivery_attempts = 1_000;
    let (node, _clock) = start(config);
    let alice = account("alice");
    let bob = account("bob");
    node.deposit(HOME, &alice, 100).await.unwrap();

    let away = node.domain(AWAY).unwrap();
    away.lock().await.endpoint().consumed().set_fail_writes(true);

    node.bridge(HOME, &alice, 40, AWAY, &bob).await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(node.relay_stats().pending, 1);
    assert_eq!(principal_of(&node, AWAY, &bob).await, 0);

    away.lock().await.endpoint().consumed().set_fail_writes(false);
    node.flush().await;

    assert_eq!(principal_of(&node, AWAY, &bob).await, 40);
    let text = node.metrics_text().unwrap().expect("metrics enabled");
    assert!(text.contains("rebase_bridge_retries_total"));
    node.shutdown().await;
}

#[tokio::test]
async fn exhausted_attempts_are_dead_lettered() {
    let mut config = config();
    config.relay.max_delivery_attempts = 2;
    config.relay.retry_delay_ms = 1;
    let (node, _clock) = start(config);
    let alice = account("alice");
    node.deposit(HOME, &alice, 100).await.unwrap();
    node.domain(AWAY)
        .unwrap()
        .lock()
        .await
        .endpoint()
        .consumed()
        .set_fail_writes(true);

    let id = node
        .bridge(HOME, &alice, 40, AWAY, &account("bob"))
        .await
        .unwrap();
    node.flush().await;

    let letters = node.dead_letters();
    assert_eq!(letters.len(), 1);
    assert_eq!(letters[0].id, id);
    assert_eq!(letters[0].attempts, 2);
    assert_eq!(principal_of(&node, AWAY, &account("bob")).await, 0);
    node.shutdown().await;
}

#[tokio::test]
async fn dead_letters_redeliver_once_the_fault_clears() {
    let mut config = config();
    config.relay.max_delivery_attempts = 2;
    config.relay.retry_delay_ms = 1;
    let (node, _clock) = start(config);
    let alice = account("alice");
    let bob = account("bob");
    node.deposit(HOME, &alice, 100).await.unwrap();
    let away = node.domain(AWAY).unwrap();
    away.lock().await.endpoint().consumed().set_fail_writes(true);

    node.bridge(HOME, &alice, 40, AWAY, &bob).await.unwrap();
    node.flush().await;
    assert_eq!(node.dead_letters().len(), 1);
    assert!(!node.dead_letters()[0].frame.is_empty());

    away.lock().await.endpoint().consumed().set_fail_writes(false);
    assert_eq!(node.redeliver_dead_letters().await.unwrap(), 1);
    node.flush().await;

    let home_total = node
        .domain(HOME)
        .unwrap()
        .lock()
        .await
        .ledger()
        .total_principal();
    let away_total = away.lock().await.ledger().total_principal();
    assert_eq!(home_total + away_total, 100);
    assert_eq!(principal_of(&node, AWAY, &bob).await, 40);
    assert!(node.dead_letters().is_empty());
    assert_eq!(node.relay_stats().delivered, 1);

    // Nothing left to resubmit.
    assert_eq!(node.redeliver_dead_letters().await.unwrap(), 0);
    node.shutdown().await;
}

// ---------------------------------------------------------------------------
// 4. Vault round trip across domains
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bridged_principal_redeems_against_destination_reserves() {
    let (node, _clock) = start(config());
    let alice = account("alice");
    let bob = account("bob");
    node.deposit(HOME, &alice, 100).await.unwrap();
    node.bridge(HOME, &alice, 40, AWAY, &bob).await.unwrap();
    node.flush().await;

    // Nothing was deposited on the destination, so there is nothing to release.
    let err = node.redeem(AWAY, &bob, Amount::All).await.unwrap_err();
    assert!(matches!(
        err,
        NodeError::Vault(VaultError::ReleaseFailed { amount: 40, .. })
    ));
    assert_eq!(principal_of(&node, AWAY, &bob).await, 40);

    node.fund_rewards(AWAY, &account("treasury"), 40)
        .await
        .unwrap();
    assert_eq!(node.redeem(AWAY, &bob, Amount::All).await.unwrap(), 40);
    assert_eq!(node.balance_of(AWAY, &bob).await.unwrap(), 0);

    assert_eq!(node.redeem(HOME, &alice, Amount::All).await.unwrap(), 60);
    node.shutdown().await;
}

#[tokio::test]
async fn rate_cut_only_affects_new_deposits() {
    let (node, _clock) = start(config());
    let alice = account("alice");
    let carol = account("carol");
    node.deposit(HOME, &alice, 100).await.unwrap();
    node.set_global_rate(HOME, &admin(), Rate::new(10)).await.unwrap();
    node.deposit(HOME, &carol, 100).await.unwrap();

    assert_eq!(rate_of(&node, HOME, &alice).await, Rate::new(RATE as u128));
    assert_eq!(rate_of(&node, HOME, &carol).await, Rate::new(10));

    let err = node
        .set_global_rate(HOME, &admin(), Rate::new(11))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        NodeError::Ledger(LedgerError::RateIncreaseRejected { .. })
    ));
    let err = node
        .set_global_rate(HOME, &alice, Rate::new(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        NodeError::Ledger(LedgerError::UnauthorizedAdmin(_))
    ));
    node.shutdown().await;
}

#[tokio::test]
async fn bridge_to_unhosted_domain_burns_nothing() {
    let (node, _clock) = start(config());
    let alice = account("alice");
    node.deposit(HOME, &alice, 100).await.unwrap();
    let err = node
        .bridge(HOME, &alice, 10, DomainId::new(99), &account("bob"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        NodeError::Bridge(BridgeError::UnknownDomain(_))
    ));
    assert_eq!(principal_of(&node, HOME, &alice).await, 100);
    assert!(matches!(
        node.deposit(DomainId::new(99), &alice, 1).await,
        Err(NodeError::UnknownDomain(_))
    ));
    node.shutdown().await;
}

// ---------------------------------------------------------------------------
// 5. Observers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn event_bus_sees_both_sides_of_a_bridge() {
    let seen = Arc::new(StdMutex::new(Vec::new()));
    let mut bus = EventBus::new();
    let sink = Arc::clone(&seen);
    bus.subscribe(Box::new(move |domain, event| match event {
        LedgerEvent::Minted { amount, .. } => sink.lock().unwrap().push(("mint", domain, *amount)),
        LedgerEvent::Burned { amount, .. } => sink.lock().unwrap().push(("burn", domain, *amount)),
        _ => {}
    }));
    let (node, _clock) = start_with_events(config(), bus);
    let alice = account("alice");
    node.deposit(HOME, &alice, 100).await.unwrap();
    node.bridge(HOME, &alice, 25, AWAY, &account("bob"))
        .await
        .unwrap();
    node.flush().await;

    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![("mint", HOME, 100), ("burn", HOME, 25), ("mint", AWAY, 25)]
    );
    node.shutdown().await;
}

#[tokio::test]
async fn metrics_disabled_by_default() {
    let (node, _clock) = start(config());
    assert!(node.metrics_text().unwrap().is_none());
    node.shutdown().await;
}

#[tokio::test]
async fn snapshot_reports_every_domain() {
    let (node, _clock) = start(config());
    node.deposit(HOME, &account("alice"), 100).await.unwrap();
    node.bridge(HOME, &account("alice"), 30, AWAY, &account("bob"))
        .await
        .unwrap();
    node.flush().await;

    let snapshots = node.snapshot().await.unwrap();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].total_principal, 70);
    assert_eq!(snapshots[0].next_sequence, 1);
    assert_eq!(snapshots[1].total_principal, 30);
    assert_eq!(snapshots[1].consumed_messages, 1);
    node.shutdown().await;
}

// ---------------------------------------------------------------------------
// 6. Manual transport: duplicates and reversed order without the relay
// ---------------------------------------------------------------------------

fn domain(id: DomainId, remote: DomainId) -> Domain<NullCustody, NullConsumedStore> {
    let mut domain = Domain::new(
        DomainSetup {
            id,
            name: format!("d{}", id.as_u64()),
            admin: admin(),
            params: LedgerParams {
                initial_global_rate: Rate::new(RATE as u128),
            },
        },
        NullCustody::new(),
        NullConsumedStore::new(),
        Observers::default(),
    )
    .unwrap();
    domain.add_remote(remote);
    domain
}

#[test]
fn reversed_and_replayed_frames_apply_exactly_once() {
    let mut home = domain(HOME, AWAY);
    let mut away = domain(AWAY, HOME);
    let transport = NullTransport::new();
    let alice = account("alice");
    let bob = account("bob");
    let t0 = Timestamp::new(0);

    home.deposit(&alice, 100, t0).unwrap();
    for amount in [10u128, 20, 30] {
        let message = home.send(&alice, amount, AWAY, &bob, t0).unwrap();
        transport.send(codec::encode(&message).unwrap());
    }
    let replay = transport.peek_next().unwrap();
    transport.reverse();

    for frame in transport.drain() {
        away.receive_frame(&frame, t0).unwrap();
    }
    let err = away.receive_frame(&replay, t0).unwrap_err();
    assert!(matches!(
        err,
        NodeError::Bridge(BridgeError::DuplicateOrInvalidMessage(
            RejectReason::AlreadyConsumed(_)
        ))
    ));
    assert_eq!(away.ledger().principal_of(&bob), 60);
    assert_eq!(home.ledger().principal_of(&alice), 40);
    assert_eq!(transport.sent_count(), 3);
}

#[test]
fn frame_for_another_domain_is_rejected() {
    let mut home = domain(HOME, AWAY);
    let third = DomainId::new(3);
    let mut other = domain(third, HOME);
    let alice = account("alice");
    let t0 = Timestamp::new(0);
    home.deposit(&alice, 100, t0).unwrap();
    let message = home.send(&alice, 10, AWAY, &account("bob"), t0).unwrap();

    let err = other
        .receive_frame(&codec::encode(&message).unwrap(), t0)
        .unwrap_err();
    assert!(matches!(
        err,
        NodeError::Bridge(BridgeError::DuplicateOrInvalidMessage(
            RejectReason::WrongDestination { .. }
        ))
    ));
    assert_eq!(other.ledger().total_principal(), 0);
}
