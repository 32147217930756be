//! Prometheus metrics for hosted domains.
//!
//! One [`DomainMetrics`] is shared by every domain on the node; each series
//! carries a `domain` label. The struct owns its own [`Registry`] so tests
//! and multiple nodes in one process do not collide.

use prometheus::{
    register_counter_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_gauge_vec_with_registry, CounterVec, Encoder, IntCounterVec, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use rebase_ledger::LedgerEvent;
use rebase_types::DomainId;

pub struct DomainMetrics {
    pub registry: Registry,

    // ── Value flow ──────────────────────────────────────────────────────
    /// Principal minted (deposits, bridge receipts, settled interest excluded).
    pub minted: CounterVec,
    /// Principal burned (redemptions, bridge sends).
    pub burned: CounterVec,
    /// Interest folded into principal on settlement.
    pub interest_settled: CounterVec,

    // ── Bridge ──────────────────────────────────────────────────────────
    pub messages_sent: IntCounterVec,
    pub messages_received: IntCounterVec,
    /// Messages dropped as duplicate, forged, misrouted or undecodable.
    pub messages_rejected: IntCounterVec,
    /// Delivery attempts that failed and were scheduled again.
    pub delivery_retries: IntCounterVec,
    /// Messages abandoned after exhausting their delivery attempts.
    pub messages_dead_lettered: IntCounterVec,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub global_rate: IntGaugeVec,
    pub account_count: IntGaugeVec,
}

impl DomainMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let minted = register_counter_vec_with_registry!(
            Opts::new("rebase_minted_total", "Principal minted"),
            &["domain"],
            registry
        )?;
        let burned = register_counter_vec_with_registry!(
            Opts::new("rebase_burned_total", "Principal burned"),
            &["domain"],
            registry
        )?;
        let interest_settled = register_counter_vec_with_registry!(
            Opts::new(
                "rebase_interest_settled_total",
                "Interest folded into principal on settlement"
            ),
            &["domain"],
            registry
        )?;

        let messages_sent = register_int_counter_vec_with_registry!(
            Opts::new("rebase_bridge_sent_total", "Bridge messages sent"),
            &["domain"],
            registry
        )?;
        let messages_received = register_int_counter_vec_with_registry!(
            Opts::new("rebase_bridge_received_total", "Bridge messages applied"),
            &["domain"],
            registry
        )?;
        let messages_rejected = register_int_counter_vec_with_registry!(
            Opts::new("rebase_bridge_rejected_total", "Bridge messages rejected"),
            &["domain"],
            registry
        )?;
        let delivery_retries = register_int_counter_vec_with_registry!(
            Opts::new("rebase_bridge_retries_total", "Bridge delivery retries"),
            &["domain"],
            registry
        )?;
        let messages_dead_lettered = register_int_counter_vec_with_registry!(
            Opts::new(
                "rebase_bridge_dead_lettered_total",
                "Bridge messages abandoned after the last attempt"
            ),
            &["domain"],
            registry
        )?;

        let global_rate = register_int_gauge_vec_with_registry!(
            Opts::new("rebase_global_rate", "Global rate in 1e-18 per second"),
            &["domain"],
            registry
        )?;
        let account_count = register_int_gauge_vec_with_registry!(
            Opts::new("rebase_account_count", "Accounts known to the ledger"),
            &["domain"],
            registry
        )?;

        Ok(Self {
            registry,
            minted,
            burned,
            interest_settled,
            messages_sent,
            messages_received,
            messages_rejected,
            delivery_retries,
            messages_dead_lettered,
            global_rate,
            account_count,
        })
    }

    /// Fold one committed ledger event into the counters.
    pub fn observe(&self, domain: DomainId, event: &LedgerEvent) {
        let label = domain.as_u64().to_string();
        let label = [label.as_str()];
        match event {
            LedgerEvent::Minted { amount, .. } => {
                self.minted.with_label_values(&label).inc_by(*amount as f64)
            }
            LedgerEvent::Burned { amount, .. } => {
                self.burned.with_label_values(&label).inc_by(*amount as f64)
            }
            LedgerEvent::InterestSettled { amount, .. } => self
                .interest_settled
                .with_label_values(&label)
                .inc_by(*amount as f64),
            LedgerEvent::GlobalRateChanged { new, .. } => self
                .global_rate
                .with_label_values(&label)
                .set(i64::try_from(new.raw()).unwrap_or(i64::MAX)),
            _ => {}
        }
    }

    /// Encode every metric in the Prometheus text format.
    pub fn gather_text(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
