//! Fan-out of ledger events to node-level subscribers.
//!
//! Domains drain their ledger's event journal after every operation and
//! publish each event here, tagged with the domain it happened on.

use rebase_ledger::LedgerEvent;
use rebase_types::DomainId;

type Listener = Box<dyn Fn(DomainId, &LedgerEvent) + Send + Sync>;

/// Synchronous fan-out event bus.
///
/// Listeners run inline on the publishing task while the domain lock is
/// held; keep handlers fast.
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, domain: DomainId, event: &LedgerEvent) {
        for listener in &self.listeners {
            listener(domain, event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
