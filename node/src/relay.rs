//! Asynchronous delivery of bridge messages between hosted domains.
//!
//! `send` on the source domain completes on its own; the relay picks the
//! encoded frame up later and applies it on the destination. Each wake-up
//! drains everything queued into one batch, optionally shuffles it, and
//! delivers it. Failures that may heal (ledger or store errors) are retried
//! after `retry_delay_ms` up to `max_delivery_attempts`, then parked as dead
//! letters until [`Relay::redeliver_dead_letters`]; rejected messages
//! (duplicate, forged, misrouted) are dropped at once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use prometheus::IntCounterVec;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rebase_bridge::BridgeError;
use rebase_messages::{codec, BridgeMessage, MessageId};
use rebase_store::ConsumedMessageStore;
use rebase_types::DomainId;
use rebase_vault::BackingCustody;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::RelayConfig;
use crate::domain::Domain;
use crate::metrics::DomainMetrics;
use crate::NodeError;

pub type SharedDomain<C, S> = Arc<Mutex<Domain<C, S>>>;

struct Envelope {
    id: MessageId,
    destination: DomainId,
    frame: Vec<u8>,
    attempts: u32,
}

/// A message the relay gave up on. The source burn is already committed, so
/// the frame is kept for [`Relay::redeliver_dead_letters`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeadLetter {
    pub id: MessageId,
    pub destination: DomainId,
    pub attempts: u32,
    pub error: String,
    pub frame: Vec<u8>,
}

#[derive(Default)]
struct RelayState {
    pending: AtomicUsize,
    delivered: AtomicU64,
    rejected: AtomicU64,
    idle: Notify,
    dead_letters: StdMutex<Vec<DeadLetter>>,
}

impl RelayState {
    fn settle_one(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Delivery outcome counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub pending: usize,
    pub delivered: u64,
    pub rejected: u64,
    pub dead_lettered: usize,
}

pub struct Relay {
    tx: mpsc::Sender<Envelope>,
    state: Arc<RelayState>,
    task: JoinHandle<()>,
}

impl Relay {
    /// Start the delivery task. Must be called inside a tokio runtime.
    pub fn spawn<C, S>(
        routes: HashMap<DomainId, SharedDomain<C, S>>,
        config: &RelayConfig,
        clock: Arc<dyn Clock>,
        metrics: Option<Arc<DomainMetrics>>,
    ) -> Self
    where
        C: BackingCustody + Send + 'static,
        S: ConsumedMessageStore + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        let state = Arc::new(RelayState::default());
        let worker = Worker {
            rx,
            routes,
            clock,
            metrics,
            state: Arc::clone(&state),
            max_attempts: config.max_delivery_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            shuffle: config
                .reorder
                .then(|| StdRng::seed_from_u64(config.reorder_seed.unwrap_or_else(rand::random))),
        };
        let task = tokio::spawn(worker.run());
        Self { tx, state, task }
    }

    /// Claim a queue slot. Fails with [`NodeError::RelayClosed`] if the
    /// delivery task is gone, so callers can check before burning anything.
    pub async fn reserve(&self) -> Result<SubmitSlot<'_>, NodeError> {
        let permit = self
            .tx
            .reserve()
            .await
            .map_err(|_| NodeError::RelayClosed)?;
        Ok(SubmitSlot {
            permit,
            state: &self.state,
        })
    }

    /// Queue `message` for delivery to its destination domain.
    pub async fn submit(&self, message: &BridgeMessage) -> Result<(), NodeError> {
        self.reserve().await?.submit(message)
    }

    /// Requeue every dead letter with a fresh attempt budget. Returns how
    /// many were resubmitted.
    pub async fn redeliver_dead_letters(&self) -> Result<usize, NodeError> {
        let mut letters = self.take_dead_letters().into_iter();
        let mut count = 0;
        while let Some(letter) = letters.next() {
            let envelope = Envelope {
                id: letter.id,
                destination: letter.destination,
                frame: letter.frame,
                attempts: 0,
            };
            self.state.pending.fetch_add(1, Ordering::SeqCst);
            if let Err(mpsc::error::SendError(envelope)) = self.tx.send(envelope).await {
                self.state.settle_one();
                let mut unsent = vec![DeadLetter {
                    id: envelope.id,
                    destination: envelope.destination,
                    attempts: letter.attempts,
                    error: letter.error,
                    frame: envelope.frame,
                }];
                unsent.extend(letters);
                self.put_back_dead_letters(unsent);
                return Err(NodeError::RelayClosed);
            }
            count += 1;
        }
        if count > 0 {
            info!(count, "dead letters resubmitted");
        }
        Ok(count)
    }

    /// Messages submitted but not yet delivered, rejected or dead-lettered.
    pub fn pending(&self) -> usize {
        self.state.pending.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> RelayStats {
        RelayStats {
            pending: self.pending(),
            delivered: self.state.delivered.load(Ordering::SeqCst),
            rejected: self.state.rejected.load(Ordering::SeqCst),
            dead_lettered: self.dead_letters().len(),
        }
    }

    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        match self.state.dead_letters.lock() {
            Ok(letters) => letters.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn take_dead_letters(&self) -> Vec<DeadLetter> {
        match self.state.dead_letters.lock() {
            Ok(mut letters) => std::mem::take(&mut *letters),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    fn put_back_dead_letters(&self, unsent: Vec<DeadLetter>) {
        match self.state.dead_letters.lock() {
            Ok(mut letters) => letters.extend(unsent),
            Err(poisoned) => poisoned.into_inner().extend(unsent),
        }
    }

    /// Resolve once every submitted message has reached a final outcome.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.state.idle.notified();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Kill the delivery task and wait until the queue reports closed.
    #[cfg(test)]
    pub(crate) async fn abort(&self) {
        self.task.abort();
        while !self.tx.is_closed() {
            tokio::task::yield_now().await;
        }
    }

    /// Stop accepting messages, finish the queue, and join the task.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.task.await {
            warn!(error = %e, "relay task ended abnormally");
        }
    }
}

/// A claimed slot in the relay queue. Submitting through it cannot fail on
/// a closed channel.
pub struct SubmitSlot<'a> {
    permit: mpsc::Permit<'a, Envelope>,
    state: &'a RelayState,
}

impl SubmitSlot<'_> {
    pub fn submit(self, message: &BridgeMessage) -> Result<(), NodeError> {
        let envelope = Envelope {
            id: message.id(),
            destination: message.destination_domain,
            frame: codec::encode(message)?,
            attempts: 0,
        };
        self.state.pending.fetch_add(1, Ordering::SeqCst);
        self.permit.send(envelope);
        Ok(())
    }
}

struct Worker<C: BackingCustody, S: ConsumedMessageStore> {
    rx: mpsc::Receiver<Envelope>,
    routes: HashMap<DomainId, SharedDomain<C, S>>,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<DomainMetrics>>,
    state: Arc<RelayState>,
    max_attempts: u32,
    retry_delay: Duration,
    shuffle: Option<StdRng>,
}

enum Outcome {
    Delivered,
    Rejected(String),
    Retry(String),
}

impl<C, S> Worker<C, S>
where
    C: BackingCustody + Send + 'static,
    S: ConsumedMessageStore + Send + 'static,
{
    async fn run(mut self) {
        let mut retries: Vec<Envelope> = Vec::new();
        loop {
            let mut batch = Vec::new();
            if retries.is_empty() {
                match self.rx.recv().await {
                    Some(envelope) => batch.push(envelope),
                    None => break,
                }
            } else {
                tokio::time::sleep(self.retry_delay).await;
                batch.append(&mut retries);
            }
            while let Ok(envelope) = self.rx.try_recv() {
                batch.push(envelope);
            }
            if let Some(rng) = self.shuffle.as_mut() {
                batch.shuffle(rng);
            }

            for mut envelope in batch {
                envelope.attempts += 1;
                match self.deliver(&envelope).await {
                    Outcome::Delivered => {
                        self.state.delivered.fetch_add(1, Ordering::SeqCst);
                        self.state.settle_one();
                    }
                    Outcome::Rejected(reason) => {
                        warn!(id = %envelope.id, %reason, "relay dropped rejected message");
                        self.state.rejected.fetch_add(1, Ordering::SeqCst);
                        self.state.settle_one();
                    }
                    Outcome::Retry(error) if envelope.attempts < self.max_attempts => {
                        debug!(id = %envelope.id, attempt = envelope.attempts, %error, "delivery failed, will retry");
                        self.bump(|m| &m.delivery_retries, envelope.destination);
                        retries.push(envelope);
                    }
                    Outcome::Retry(error) => {
                        warn!(id = %envelope.id, attempts = envelope.attempts, %error, "giving up on message");
                        self.bump(|m| &m.messages_dead_lettered, envelope.destination);
                        self.dead_letter(DeadLetter {
                            id: envelope.id,
                            destination: envelope.destination,
                            attempts: envelope.attempts,
                            error,
                            frame: envelope.frame,
                        });
                    }
                }
            }
        }
        info!("relay stopped");
    }

    async fn deliver(&self, envelope: &Envelope) -> Outcome {
        let Some(domain) = self.routes.get(&envelope.destination) else {
            return Outcome::Rejected(format!("no route to {}", envelope.destination));
        };
        let mut domain = domain.lock().await;
        match domain.receive_frame(&envelope.frame, self.clock.now()) {
            Ok(_) => Outcome::Delivered,
            Err(NodeError::Bridge(BridgeError::DuplicateOrInvalidMessage(reason))) => {
                Outcome::Rejected(reason.to_string())
            }
            Err(e) => Outcome::Retry(e.to_string()),
        }
    }

    fn dead_letter(&self, letter: DeadLetter) {
        match self.state.dead_letters.lock() {
            Ok(mut letters) => letters.push(letter),
            Err(poisoned) => poisoned.into_inner().push(letter),
        }
        self.state.settle_one();
    }

    fn bump(&self, counter: fn(&DomainMetrics) -> &IntCounterVec, domain: DomainId) {
        if let Some(metrics) = &self.metrics {
            counter(metrics)
                .with_label_values(&[domain.as_u64().to_string().as_str()])
                .inc();
        }
    }
}
