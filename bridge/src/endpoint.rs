//! One domain's side of the bridge.
//!
//! `send` burns on the local ledger and produces a message; `receive`
//! validates an inbound message and mints it on the local ledger. The
//! endpoint's `id` must hold the ledger's mint/burn capability.
//!
//! Receive ordering contract: the message is recorded as consumed only after
//! the mint commits. A failed mint leaves it retriable; a failed registry
//! write rolls the mint back.
//!
//! The outbound sequence is part of every message id, so it must survive a
//! restart: save it with [`BridgeEndpoint::save_to_store`] next to the ledger
//! and rebuild with [`BridgeEndpoint::load_from_store`].

use std::collections::BTreeSet;

use rebase_ledger::MintBurnLedger;
use rebase_messages::{codec, message_digest, BridgeMessage, MessageId};
use rebase_store::{ConsumedMessageStore, LedgerStore, StoreError};
use rebase_types::{AccountId, Amount, DomainId, Timestamp};
use tracing::{debug, info, warn};

use crate::error::{BridgeError, RejectReason};

fn sequence_key(domain: DomainId) -> Vec<u8> {
    format!("bridge_next_sequence/{}", domain.as_u64()).into_bytes()
}

pub struct BridgeEndpoint<S: ConsumedMessageStore> {
    id: AccountId,
    local_domain: DomainId,
    remotes: BTreeSet<DomainId>,
    next_sequence: u64,
    consumed: S,
}

impl<S: ConsumedMessageStore> BridgeEndpoint<S> {
    pub fn new(id: AccountId, local_domain: DomainId, consumed: S) -> Self {
        Self {
            id,
            local_domain,
            remotes: BTreeSet::new(),
            next_sequence: 0,
            consumed,
        }
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn local_domain(&self) -> DomainId {
        self.local_domain
    }

    /// Sequence the next outbound message will carry.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn consumed(&self) -> &S {
        &self.consumed
    }

    /// Trust `domain` as both a send destination and a receive source.
    /// Returns false if it was already configured or is the local domain.
    pub fn add_remote(&mut self, domain: DomainId) -> bool {
        if domain == self.local_domain {
            return false;
        }
        self.remotes.insert(domain)
    }

    pub fn remove_remote(&mut self, domain: DomainId) -> bool {
        self.remotes.remove(&domain)
    }

    pub fn remotes(&self) -> impl Iterator<Item = DomainId> + '_ {
        self.remotes.iter().copied()
    }

    pub fn is_remote(&self, domain: DomainId) -> bool {
        self.remotes.contains(&domain)
    }

    /// Burn `amount` of `sender`'s principal and emit a message minting it on
    /// `destination_domain` at the sender's frozen rate.
    pub fn send<L: MintBurnLedger>(
        &mut self,
        ledger: &mut L,
        sender: &AccountId,
        amount: u128,
        destination_domain: DomainId,
        destination_account: &AccountId,
        now: Timestamp,
    ) -> Result<BridgeMessage, BridgeError> {
        if amount == 0 {
            return Err(BridgeError::ZeroAmountRejected);
        }
        if !self.is_remote(destination_domain) {
            return Err(BridgeError::UnknownDomain(destination_domain));
        }
        if !destination_account.is_valid() {
            return Err(BridgeError::InvalidAccount(destination_account.clone()));
        }

        let message = BridgeMessage {
            source_domain: self.local_domain,
            destination_domain,
            sequence: self.next_sequence,
            sender: sender.clone(),
            destination_account: destination_account.clone(),
            amount,
            rate: ledger.rate_of(sender),
        };
        // Fail on an unencodable message before anything is burned.
        codec::encode(&message)?;

        ledger.burn(&self.id, sender, Amount::Exact(amount), now)?;
        self.next_sequence += 1;

        info!(
            id = %message.id(),
            %sender,
            to = %destination_account,
            amount,
            rate = %message.rate,
            "bridge send"
        );
        Ok(message)
    }

    /// Apply an inbound message. Returns its id on success.
    pub fn receive<L: MintBurnLedger>(
        &mut self,
        ledger: &mut L,
        message: &BridgeMessage,
        now: Timestamp,
    ) -> Result<MessageId, BridgeError> {
        let id = message.id();
        if let Err(reason) = self.check_inbound(message) {
            warn!(%id, %reason, "bridge message rejected");
            return Err(BridgeError::DuplicateOrInvalidMessage(reason));
        }

        let digest = message_digest(message)?;
        if let Some(existing) = self.consumed.get_consumed(id.source_domain, id.sequence)? {
            let reason = if existing == digest {
                RejectReason::AlreadyConsumed(id)
            } else {
                RejectReason::DigestMismatch(id)
            };
            warn!(%id, %reason, "bridge message rejected");
            return Err(BridgeError::DuplicateOrInvalidMessage(reason));
        }

        let checkpoint = ledger.checkpoint(&[&message.destination_account]);
        ledger.mint(
            &self.id,
            &message.destination_account,
            message.amount,
            message.rate,
            now,
        )?;

        if let Err(e) = self
            .consumed
            .put_consumed(id.source_domain, id.sequence, digest)
        {
            ledger.restore(checkpoint);
            warn!(%id, error = %e, "recording consumed message failed, mint rolled back");
            return Err(e.into());
        }

        info!(
            %id,
            to = %message.destination_account,
            amount = message.amount,
            rate = %message.rate,
            "bridge receive"
        );
        Ok(id)
    }

    /// Decode a wire frame and apply it.
    pub fn receive_frame<L: MintBurnLedger>(
        &mut self,
        ledger: &mut L,
        frame: &[u8],
        now: Timestamp,
    ) -> Result<MessageId, BridgeError> {
        let message = codec::decode(frame).map_err(|e| {
            debug!(error = %e, len = frame.len(), "undecodable bridge frame");
            BridgeError::DuplicateOrInvalidMessage(RejectReason::Malformed(e.to_string()))
        })?;
        self.receive(ledger, &message, now)
    }

    /// Persist the outbound sequence counter in the store's meta table.
    pub fn save_to_store(&self, store: &dyn LedgerStore) -> Result<(), BridgeError> {
        store.put_meta(
            &sequence_key(self.local_domain),
            &self.next_sequence.to_le_bytes(),
        )?;
        Ok(())
    }

    /// Rebuild an endpoint whose sequence continues from the last save.
    /// A store without a saved counter starts at zero. Remotes are
    /// configuration and are not persisted.
    pub fn load_from_store(
        id: AccountId,
        local_domain: DomainId,
        consumed: S,
        store: &dyn LedgerStore,
    ) -> Result<Self, BridgeError> {
        let mut endpoint = Self::new(id, local_domain, consumed);
        if let Some(bytes) = store.get_meta(&sequence_key(local_domain))? {
            let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                StoreError::Corruption(format!("sequence counter of {} bytes", bytes.len()))
            })?;
            endpoint.next_sequence = u64::from_le_bytes(raw);
        }
        debug!(domain = %local_domain, next = endpoint.next_sequence, "endpoint loaded");
        Ok(endpoint)
    }

    fn check_inbound(&self, message: &BridgeMessage) -> Result<(), RejectReason> {
        if message.destination_domain != self.local_domain {
            return Err(RejectReason::WrongDestination {
                id: message.id(),
                destination: message.destination_domain,
            });
        }
        if !self.is_remote(message.source_domain) {
            return Err(RejectReason::UntrustedSource(message.source_domain));
        }
        if !message.is_well_formed() {
            return Err(RejectReason::Malformed(format!(
                "{} fails structural checks",
                message.id()
            )));
        }
        Ok(())
    }
}
