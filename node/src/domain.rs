//! One hosted domain: a ledger with its vault and bridge endpoint.
//!
//! The vault and the endpoint are accounts on the ledger; assembly grants
//! both the mint/burn capability. Every operation drains the ledger's event
//! journal afterwards and publishes it to metrics and the event bus.

use std::sync::Arc;

use rebase_bridge::{BridgeEndpoint, BridgeError};
use rebase_ledger::AccrualLedger;
use rebase_messages::{BridgeMessage, MessageId};
use rebase_store::ConsumedMessageStore;
use rebase_types::{AccountId, Amount, DomainId, LedgerParams, Rate, Timestamp};
use rebase_vault::{BackingCustody, Vault};
use serde::Serialize;
use tracing::{debug, info};

use crate::ledger_event::EventBus;
use crate::metrics::DomainMetrics;
use crate::NodeError;

/// Where a domain reports what happened on its ledger.
#[derive(Clone, Default)]
pub struct Observers {
    pub metrics: Option<Arc<DomainMetrics>>,
    pub events: Arc<EventBus>,
}

/// Static description of a domain to assemble.
#[derive(Clone, Debug)]
pub struct DomainSetup {
    pub id: DomainId,
    pub name: String,
    pub admin: AccountId,
    pub params: LedgerParams,
}

pub struct Domain<C: BackingCustody, S: ConsumedMessageStore> {
    id: DomainId,
    name: String,
    admin: AccountId,
    ledger: AccrualLedger,
    vault: Vault<C>,
    endpoint: BridgeEndpoint<S>,
    observers: Observers,
}

/// Serializable view of a domain at one point in time.
#[derive(Clone, Debug, Serialize)]
pub struct DomainSnapshot {
    pub id: u64,
    pub name: String,
    pub at: u64,
    pub global_rate: u128,
    pub total_principal: u128,
    pub reserves: u128,
    pub next_sequence: u64,
    pub consumed_messages: u64,
    pub accounts: Vec<AccountSnapshot>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AccountSnapshot {
    pub account: String,
    pub principal: u128,
    pub balance: u128,
    pub rate: u128,
    pub last_settled: u64,
}

/// Account the vault of `domain` operates under.
pub fn vault_account(domain: DomainId) -> AccountId {
    AccountId::new(format!("acct_vault_{}", domain.as_u64()))
}

/// Account the bridge endpoint of `domain` operates under.
pub fn bridge_account(domain: DomainId) -> AccountId {
    AccountId::new(format!("acct_bridge_{}", domain.as_u64()))
}

impl<C: BackingCustody, S: ConsumedMessageStore> Domain<C, S> {
    pub fn new(
        setup: DomainSetup,
        custody: C,
        consumed: S,
        observers: Observers,
    ) -> Result<Self, NodeError> {
        let DomainSetup {
            id,
            name,
            admin,
            params,
        } = setup;
        let mut ledger = AccrualLedger::new(id, admin.clone(), &params);
        let vault = Vault::new(vault_account(id), custody);
        let endpoint = BridgeEndpoint::new(bridge_account(id), id, consumed);
        ledger.grant_mint_and_burn_role(&admin, vault.id())?;
        ledger.grant_mint_and_burn_role(&admin, endpoint.id())?;

        if let Some(metrics) = &observers.metrics {
            metrics
                .global_rate
                .with_label_values(&[id.as_u64().to_string().as_str()])
                .set(i64::try_from(params.initial_global_rate.raw()).unwrap_or(i64::MAX));
        }
        info!(domain = %id, %name, rate = %params.initial_global_rate, "domain assembled");

        let mut domain = Self {
            id,
            name,
            admin,
            ledger,
            vault,
            endpoint,
            observers,
        };
        domain.publish();
        Ok(domain)
    }

    pub fn id(&self) -> DomainId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn admin(&self) -> &AccountId {
        &self.admin
    }

    pub fn ledger(&self) -> &AccrualLedger {
        &self.ledger
    }

    pub fn vault(&self) -> &Vault<C> {
        &self.vault
    }

    pub fn vault_mut(&mut self) -> &mut Vault<C> {
        &mut self.vault
    }

    pub fn endpoint(&self) -> &BridgeEndpoint<S> {
        &self.endpoint
    }

    pub fn add_remote(&mut self, remote: DomainId) -> bool {
        self.endpoint.add_remote(remote)
    }

    pub fn deposit(
        &mut self,
        caller: &AccountId,
        value: u128,
        now: Timestamp,
    ) -> Result<(), NodeError> {
        let result = self.vault.deposit(&mut self.ledger, caller, value, now);
        self.publish();
        Ok(result?)
    }

    pub fn redeem(
        &mut self,
        caller: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<u128, NodeError> {
        let result = self.vault.redeem(&mut self.ledger, caller, amount, now);
        self.publish();
        Ok(result?)
    }

    pub fn fund_rewards(&mut self, from: &AccountId, value: u128) -> Result<(), NodeError> {
        Ok(self.vault.fund_rewards(from, value)?)
    }

    pub fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<u128, NodeError> {
        let result = self.ledger.transfer(from, to, amount, now);
        self.publish();
        Ok(result?)
    }

    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: u128) {
        self.ledger.approve(owner, spender, amount);
        self.publish();
    }

    pub fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<u128, NodeError> {
        let result = self.ledger.transfer_from(spender, from, to, amount, now);
        self.publish();
        Ok(result?)
    }

    pub fn set_global_rate(&mut self, caller: &AccountId, rate: Rate) -> Result<(), NodeError> {
        let result = self.ledger.set_global_rate(caller, rate);
        self.publish();
        Ok(result?)
    }

    /// Burn on this domain and return the message for the relay.
    pub fn send(
        &mut self,
        sender: &AccountId,
        amount: u128,
        destination: DomainId,
        destination_account: &AccountId,
        now: Timestamp,
    ) -> Result<BridgeMessage, NodeError> {
        let result = self.endpoint.send(
            &mut self.ledger,
            sender,
            amount,
            destination,
            destination_account,
            now,
        );
        self.publish();
        let message = result?;
        if let Some(metrics) = &self.observers.metrics {
            metrics.messages_sent.with_label_values(&[self.label().as_str()]).inc();
        }
        Ok(message)
    }

    /// Apply an inbound frame.
    pub fn receive_frame(&mut self, frame: &[u8], now: Timestamp) -> Result<MessageId, NodeError> {
        let result = self.endpoint.receive_frame(&mut self.ledger, frame, now);
        self.publish();
        if let Some(metrics) = &self.observers.metrics {
            let label = self.label();
            match &result {
                Ok(_) => metrics
                    .messages_received
                    .with_label_values(&[label.as_str()])
                    .inc(),
                Err(BridgeError::DuplicateOrInvalidMessage(_)) => metrics
                    .messages_rejected
                    .with_label_values(&[label.as_str()])
                    .inc(),
                Err(_) => {}
            }
        }
        Ok(result?)
    }

    pub fn balance_of(&self, account: &AccountId, now: Timestamp) -> u128 {
        self.ledger.balance_of(account, now)
    }

    pub fn snapshot(&self, now: Timestamp) -> Result<DomainSnapshot, NodeError> {
        let mut accounts: Vec<AccountSnapshot> = self
            .ledger
            .accounts()
            .map(|(id, state)| AccountSnapshot {
                account: id.to_string(),
                principal: state.principal,
                balance: self.ledger.balance_of(id, now),
                rate: state.rate.raw(),
                last_settled: state.last_settled.as_secs(),
            })
            .collect();
        accounts.sort_by(|a, b| a.account.cmp(&b.account));

        Ok(DomainSnapshot {
            id: self.id.as_u64(),
            name: self.name.clone(),
            at: now.as_secs(),
            global_rate: self.ledger.global_rate().raw(),
            total_principal: self.ledger.total_principal(),
            reserves: self.vault.custody().reserves(),
            next_sequence: self.endpoint.next_sequence(),
            consumed_messages: self.endpoint.consumed().consumed_count()?,
            accounts,
        })
    }

    /// Drain the ledger journal into metrics and subscribers.
    fn publish(&mut self) {
        let events = self.ledger.drain_events();
        if events.is_empty() {
            return;
        }
        debug!(domain = %self.id, count = events.len(), "publishing ledger events");
        for event in &events {
            if let Some(metrics) = &self.observers.metrics {
                metrics.observe(self.id, event);
            }
            self.observers.events.emit(self.id, event);
        }
        if let Some(metrics) = &self.observers.metrics {
            metrics
                .account_count
                .with_label_values(&[self.label().as_str()])
                .set(self.ledger.account_count() as i64);
        }
    }

    fn label(&self) -> String {
        self.id.as_u64().to_string()
    }
}
