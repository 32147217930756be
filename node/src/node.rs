//! The node: every configured domain plus the relay between them.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rebase_messages::MessageId;
use rebase_store::ConsumedMessageStore;
use rebase_types::{AccountId, Amount, DomainId, Rate};
use rebase_vault::BackingCustody;
use tokio::sync::Mutex;
use tracing::info;

use crate::clock::Clock;
use crate::config::NodeConfig;
use crate::domain::{Domain, DomainSetup, DomainSnapshot, Observers};
use crate::ledger_event::EventBus;
use crate::metrics::DomainMetrics;
use crate::relay::{DeadLetter, Relay, RelayStats, SharedDomain};
use crate::NodeError;

pub struct RebaseNode<C, S>
where
    C: BackingCustody + Send + 'static,
    S: ConsumedMessageStore + Send + 'static,
{
    config: NodeConfig,
    domains: BTreeMap<DomainId, SharedDomain<C, S>>,
    relay: Relay,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<DomainMetrics>>,
}

impl<C, S> RebaseNode<C, S>
where
    C: BackingCustody + Send + 'static,
    S: ConsumedMessageStore + Send + 'static,
{
    /// Assemble every configured domain and start the relay.
    ///
    /// `backends` supplies the custody and replay registry for each domain.
    /// Must be called inside a tokio runtime.
    pub fn start(
        config: NodeConfig,
        clock: Arc<dyn Clock>,
        events: EventBus,
        mut backends: impl FnMut(DomainId) -> (C, S),
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let admin = config.admin_account()?;
        let metrics = if config.enable_metrics {
            Some(Arc::new(DomainMetrics::new()?))
        } else {
            None
        };
        let observers = Observers {
            metrics: metrics.clone(),
            events: Arc::new(events),
        };

        let ids: Vec<DomainId> = config.domain_ids().collect();
        let mut domains = BTreeMap::new();
        for domain_config in &config.domains {
            let id = DomainId::new(domain_config.id);
            let (custody, consumed) = backends(id);
            let mut domain = Domain::new(
                DomainSetup {
                    id,
                    name: domain_config.name.clone(),
                    admin: admin.clone(),
                    params: config.ledger_params(),
                },
                custody,
                consumed,
                observers.clone(),
            )?;
            for remote in &ids {
                domain.add_remote(*remote);
            }
            domains.insert(id, Arc::new(Mutex::new(domain)));
        }

        let routes: HashMap<DomainId, SharedDomain<C, S>> = domains
            .iter()
            .map(|(id, domain)| (*id, Arc::clone(domain)))
            .collect();
        let relay = Relay::spawn(routes, &config.relay, Arc::clone(&clock), metrics.clone());

        info!(domains = domains.len(), reorder = config.relay.reorder, "node started");
        Ok(Self {
            config,
            domains,
            relay,
            clock,
            metrics,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn domain(&self, id: DomainId) -> Result<SharedDomain<C, S>, NodeError> {
        self.domains
            .get(&id)
            .cloned()
            .ok_or(NodeError::UnknownDomain(id))
    }

    pub fn domain_ids(&self) -> impl Iterator<Item = DomainId> + '_ {
        self.domains.keys().copied()
    }

    pub async fn deposit(
        &self,
        domain: DomainId,
        caller: &AccountId,
        value: u128,
    ) -> Result<(), NodeError> {
        let mut domain = self.domain(domain)?.lock_owned().await;
        let now = self.clock.now();
        domain.deposit(caller, value, now)
    }

    pub async fn redeem(
        &self,
        domain: DomainId,
        caller: &AccountId,
        amount: Amount,
    ) -> Result<u128, NodeError> {
        let mut domain = self.domain(domain)?.lock_owned().await;
        let now = self.clock.now();
        domain.redeem(caller, amount, now)
    }

    pub async fn fund_rewards(
        &self,
        domain: DomainId,
        from: &AccountId,
        value: u128,
    ) -> Result<(), NodeError> {
        self.domain(domain)?.lock().await.fund_rewards(from, value)
    }

    pub async fn transfer(
        &self,
        domain: DomainId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<u128, NodeError> {
        let mut domain = self.domain(domain)?.lock_owned().await;
        let now = self.clock.now();
        domain.transfer(from, to, amount, now)
    }

    pub async fn set_global_rate(
        &self,
        domain: DomainId,
        caller: &AccountId,
        rate: Rate,
    ) -> Result<(), NodeError> {
        self.domain(domain)?
            .lock()
            .await
            .set_global_rate(caller, rate)
    }

    /// Burn on `source` and hand the message to the relay. The mint on
    /// `destination` happens later; see [`RebaseNode::flush`].
    ///
    /// The relay slot is claimed before the burn, so a stopped relay fails
    /// the call with nothing burned.
    pub async fn bridge(
        &self,
        source: DomainId,
        sender: &AccountId,
        amount: u128,
        destination: DomainId,
        destination_account: &AccountId,
    ) -> Result<MessageId, NodeError> {
        let source = self.domain(source)?;
        let slot = self.relay.reserve().await?;
        let message = {
            let mut domain = source.lock_owned().await;
            let now = self.clock.now();
            domain.send(sender, amount, destination, destination_account, now)?
        };
        slot.submit(&message)?;
        Ok(message.id())
    }

    pub async fn balance_of(
        &self,
        domain: DomainId,
        account: &AccountId,
    ) -> Result<u128, NodeError> {
        let domain = self.domain(domain)?.lock_owned().await;
        let now = self.clock.now();
        Ok(domain.balance_of(account, now))
    }

    /// Wait until the relay has settled every submitted message.
    pub async fn flush(&self) {
        self.relay.wait_idle().await;
    }

    pub fn relay_stats(&self) -> RelayStats {
        self.relay.stats()
    }

    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.relay.dead_letters()
    }

    /// Give every dead-lettered message a fresh attempt budget, e.g. once
    /// the fault that exhausted it has cleared.
    pub async fn redeliver_dead_letters(&self) -> Result<usize, NodeError> {
        self.relay.redeliver_dead_letters().await
    }

    pub async fn snapshot(&self) -> Result<Vec<DomainSnapshot>, NodeError> {
        let now = self.clock.now();
        let mut snapshots = Vec::with_capacity(self.domains.len());
        for domain in self.domains.values() {
            snapshots.push(domain.lock().await.snapshot(now)?);
        }
        Ok(snapshots)
    }

    /// Prometheus text exposition, if metrics are enabled.
    pub fn metrics_text(&self) -> Result<Option<String>, NodeError> {
        self.metrics
            .as_ref()
            .map(|m| m.gather_text())
            .transpose()
            .map_err(NodeError::from)
    }

    /// Drain the relay and stop it.
    pub async fn shutdown(self) {
        self.relay.wait_idle().await;
        self.relay.shutdown().await;
        info!("node stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebase_nullables::{NullClock, NullConsumedStore, NullCustody};
    use rebase_types::Timestamp;
    use std::sync::atomic::{AtomicU64, Ordering};

    const HOME: DomainId = DomainId::new(1);
    const AWAY: DomainId = DomainId::new(2);

    type SimNode = RebaseNode<NullCustody, NullConsumedStore>;

    fn start(config: NodeConfig, clock: Arc<dyn Clock>) -> SimNode {
        RebaseNode::start(config, clock, EventBus::new(), |_| {
            (NullCustody::new(), NullConsumedStore::new())
        })
        .unwrap()
    }

    /// Every read returns one second later than the previous one.
    #[derive(Default)]
    struct TickingClock(AtomicU64);

    impl Clock for TickingClock {
        fn now(&self) -> Timestamp {
            Timestamp::new(self.0.fetch_add(1, Ordering::SeqCst))
        }
    }

    #[tokio::test]
    async fn bridge_with_stopped_relay_burns_nothing() {
        let node = start(NodeConfig::default(), Arc::new(NullClock::new(0)));
        let alice = AccountId::new("acct_alice");
        node.deposit(HOME, &alice, 100).await.unwrap();

        node.relay.abort().await;
        let err = node
            .bridge(HOME, &alice, 40, AWAY, &AccountId::new("acct_bob"))
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::RelayClosed));

        let home = node.domain(HOME).unwrap();
        let home = home.lock().await;
        assert_eq!(home.ledger().principal_of(&alice), 100);
        assert_eq!(home.endpoint().next_sequence(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deposits_never_regress_the_ledger_clock() {
        let config = NodeConfig {
            initial_global_rate: 0,
            ..NodeConfig::default()
        };
        let node = Arc::new(start(config, Arc::new(TickingClock::default())));

        let mut handles = Vec::new();
        for i in 0..64 {
            let node = Arc::clone(&node);
            handles.push(tokio::spawn(async move {
                let who = AccountId::new(format!("acct_user{}", i % 8));
                node.deposit(HOME, &who, 10).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let home = node.domain(HOME).unwrap();
        assert_eq!(home.lock().await.ledger().total_principal(), 640);
    }
}
