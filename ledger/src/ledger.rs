//! The accrual ledger.
//!
//! Balances grow linearly from each account's frozen rate between
//! settlements; every mutation settles the touched accounts first, which
//! compounds interest at the cadence of interaction.
//!
//! Each public mutator works on staged copies of the accounts it touches and
//! commits them only after every check has passed, so a failed call leaves
//! the ledger exactly as it was.

use std::collections::HashMap;

use rebase_store::{LedgerStore, StoreError};
use rebase_types::{AccountId, Amount, DomainId, LedgerParams, Rate, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::access::AccessControl;
use crate::account::AccountState;
use crate::capability::{BalanceLedger, MintBurnLedger, RateAdmin};
use crate::checkpoint::LedgerCheckpoint;
use crate::error::LedgerError;
use crate::event::LedgerEvent;
use crate::global::GlobalState;

const META_KEY: &[u8] = b"ledger_meta";

/// Everything except account states, persisted as a single meta record.
#[derive(Serialize, Deserialize)]
struct LedgerMeta {
    domain: DomainId,
    global: GlobalState,
    access: AccessControl,
    clock: Timestamp,
    allowances: Vec<(AccountId, AccountId, u128)>,
}

/// An account settled at the call's timestamp but not yet committed.
struct Staged {
    state: AccountState,
    settled: u128,
}

/// Interest-accruing ledger for one domain.
#[derive(Clone, Debug)]
pub struct AccrualLedger {
    domain: DomainId,
    accounts: HashMap<AccountId, AccountState>,
    allowances: HashMap<(AccountId, AccountId), u128>,
    global: GlobalState,
    access: AccessControl,
    /// Sum of all principals.
    total_principal: u128,
    /// Timestamp of the most recent mutation.
    clock: Timestamp,
    events: Vec<LedgerEvent>,
}

impl AccrualLedger {
    pub fn new(domain: DomainId, admin: AccountId, params: &LedgerParams) -> Self {
        Self {
            domain,
            accounts: HashMap::new(),
            allowances: HashMap::new(),
            global: GlobalState::new(params.initial_global_rate),
            access: AccessControl::new(admin),
            total_principal: 0,
            clock: Timestamp::EPOCH,
            events: Vec::new(),
        }
    }

    pub fn domain(&self) -> DomainId {
        self.domain
    }

    pub fn admin(&self) -> &AccountId {
        self.access.admin()
    }

    pub fn is_minter(&self, who: &AccountId) -> bool {
        self.access.is_minter(who)
    }

    pub fn account(&self, account: &AccountId) -> Option<&AccountState> {
        self.accounts.get(account)
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &AccountState)> {
        self.accounts.iter()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Sum of all settled principals (total minted minus total burned).
    pub fn total_principal(&self) -> u128 {
        self.total_principal
    }

    /// Timestamp of the most recent mutation.
    pub fn clock(&self) -> Timestamp {
        self.clock
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Balance including unsettled interest, saturating at `u128::MAX`.
    pub fn balance_of(&self, account: &AccountId, now: Timestamp) -> u128 {
        self.balance_of_checked(account, now).unwrap_or(u128::MAX)
    }

    pub fn balance_of_checked(
        &self,
        account: &AccountId,
        now: Timestamp,
    ) -> Result<u128, LedgerError> {
        match self.accounts.get(account) {
            Some(state) => state.balance_checked(now).ok_or(LedgerError::Overflow),
            None => Ok(0),
        }
    }

    pub fn principal_of(&self, account: &AccountId) -> u128 {
        self.accounts.get(account).map(|s| s.principal).unwrap_or(0)
    }

    pub fn rate_of(&self, account: &AccountId) -> Rate {
        self.accounts
            .get(account)
            .map(|s| s.rate)
            .unwrap_or(Rate::ZERO)
    }

    pub fn last_settled(&self, account: &AccountId) -> Option<Timestamp> {
        self.accounts.get(account).map(|s| s.last_settled)
    }

    pub fn global_rate(&self) -> Rate {
        self.global.global_rate()
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u128 {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    // ── Mutations ───────────────────────────────────────────────────────

    /// Mint `amount` to `account` and freeze its rate at `rate`.
    ///
    /// The rate overwrites whatever the account held before; existing
    /// principal continues at the new rate after settlement.
    pub fn mint(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
        amount: u128,
        rate: Rate,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.access.require_minter(caller)?;
        self.observe(now)?;

        let mut staged = self.stage(account, now)?;
        staged.state.rate = rate;
        staged.state.principal = staged
            .state
            .principal
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let total = self
            .total_principal
            .checked_add(staged.settled)
            .and_then(|t| t.checked_add(amount))
            .ok_or(LedgerError::Overflow)?;

        self.commit(account, staged);
        self.total_principal = total;
        self.clock = now;
        self.events.push(LedgerEvent::Minted {
            account: account.clone(),
            amount,
            rate,
        });
        debug!(domain = %self.domain, %account, amount, %rate, "minted");
        Ok(())
    }

    /// Burn from `account` after settling it. Returns the burned amount.
    pub fn burn(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<u128, LedgerError> {
        self.access.require_minter(caller)?;
        self.observe(now)?;

        let mut staged = self.stage(account, now)?;
        let available = staged.state.principal;
        let burned = amount.resolve(available);
        if burned > available {
            return Err(LedgerError::InsufficientPrincipal {
                needed: burned,
                available,
            });
        }
        staged.state.principal = available - burned;
        let total = self
            .total_principal
            .checked_add(staged.settled)
            .and_then(|t| t.checked_sub(burned))
            .ok_or(LedgerError::Overflow)?;

        self.commit(account, staged);
        self.total_principal = total;
        self.clock = now;
        self.events.push(LedgerEvent::Burned {
            account: account.clone(),
            amount: burned,
        });
        debug!(domain = %self.domain, %account, burned, "burned");
        Ok(burned)
    }

    /// Holder-initiated transfer. Returns the moved amount.
    ///
    /// A recipient with no principal after settlement inherits the sender's
    /// rate, so early high-rate positions keep their rate when moved.
    pub fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<u128, LedgerError> {
        self.move_principal(None, from, to, amount, now)
    }

    /// Transfer on behalf of `from`, spending `spender`'s allowance.
    pub fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<u128, LedgerError> {
        self.move_principal(Some(spender), from, to, amount, now)
    }

    /// Set how much `spender` may move out of `owner`'s balance.
    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: u128) {
        if amount == 0 {
            self.allowances.remove(&(owner.clone(), spender.clone()));
        } else {
            self.allowances
                .insert((owner.clone(), spender.clone()), amount);
        }
        self.events.push(LedgerEvent::Approval {
            owner: owner.clone(),
            spender: spender.clone(),
            amount,
        });
        debug!(domain = %self.domain, %owner, %spender, amount, "approval set");
    }

    pub fn set_global_rate(&mut self, caller: &AccountId, new_rate: Rate) -> Result<(), LedgerError> {
        self.access.require_admin(caller)?;
        let old = self.global.lower_to(new_rate)?;
        self.events.push(LedgerEvent::GlobalRateChanged { old, new: new_rate });
        info!(domain = %self.domain, %old, new = %new_rate, "global rate changed");
        Ok(())
    }

    pub fn grant_mint_and_burn_role(
        &mut self,
        caller: &AccountId,
        grantee: &AccountId,
    ) -> Result<(), LedgerError> {
        self.access.require_admin(caller)?;
        if self.access.grant(grantee.clone()) {
            self.events.push(LedgerEvent::MinterGranted {
                account: grantee.clone(),
            });
            info!(domain = %self.domain, %grantee, "mint and burn capability granted");
        }
        Ok(())
    }

    pub fn revoke_mint_and_burn_role(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
    ) -> Result<(), LedgerError> {
        self.access.require_admin(caller)?;
        if self.access.revoke(account) {
            self.events.push(LedgerEvent::MinterRevoked {
                account: account.clone(),
            });
            info!(domain = %self.domain, %account, "mint and burn capability revoked");
        }
        Ok(())
    }

    // ── Checkpoints & events ────────────────────────────────────────────

    /// Save the state of `accounts` so a multi-step call can be undone.
    pub fn checkpoint(&self, accounts: &[&AccountId]) -> LedgerCheckpoint {
        LedgerCheckpoint {
            accounts: accounts
                .iter()
                .map(|id| ((*id).clone(), self.accounts.get(*id).cloned()))
                .collect(),
            total_principal: self.total_principal,
            clock: self.clock,
            event_len: self.events.len(),
        }
    }

    /// Roll the checkpointed accounts, supply, clock and event journal back.
    ///
    /// Only valid if no account outside the checkpoint was mutated since it
    /// was taken.
    pub fn restore(&mut self, checkpoint: LedgerCheckpoint) {
        for (id, state) in checkpoint.accounts.into_iter().rev() {
            match state {
                Some(state) => {
                    self.accounts.insert(id, state);
                }
                None => {
                    self.accounts.remove(&id);
                }
            }
        }
        self.total_principal = checkpoint.total_principal;
        self.clock = checkpoint.clock;
        self.events.truncate(checkpoint.event_len);
    }

    /// Take all events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[LedgerEvent] {
        &self.events
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn observe(&self, now: Timestamp) -> Result<(), LedgerError> {
        if now < self.clock {
            return Err(LedgerError::ClockRegression {
                last: self.clock,
                now,
            });
        }
        Ok(())
    }

    fn stage(&self, account: &AccountId, now: Timestamp) -> Result<Staged, LedgerError> {
        let current = self
            .accounts
            .get(account)
            .cloned()
            .unwrap_or_else(|| AccountState::new(now));
        let (state, settled) = current.settled(now).ok_or(LedgerError::Overflow)?;
        Ok(Staged { state, settled })
    }

    fn commit(&mut self, account: &AccountId, staged: Staged) {
        if staged.settled > 0 {
            self.events.push(LedgerEvent::InterestSettled {
                account: account.clone(),
                amount: staged.settled,
            });
        }
        if staged.state.is_blank() && !self.accounts.contains_key(account) {
            return;
        }
        self.accounts.insert(account.clone(), staged.state);
    }

    fn remaining_allowance(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: u128,
    ) -> Result<u128, LedgerError> {
        let approved = self.allowance(owner, spender);
        approved
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientAllowance {
                needed: amount,
                approved,
            })
    }

    fn move_principal(
        &mut self,
        spender: Option<&AccountId>,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<u128, LedgerError> {
        self.observe(now)?;

        let mut src = self.stage(from, now)?;
        let available = src.state.principal;
        let moved = amount.resolve(available);
        if moved > available {
            return Err(LedgerError::InsufficientPrincipal {
                needed: moved,
                available,
            });
        }
        let allowance_left = match spender {
            Some(spender) => Some(self.remaining_allowance(from, spender, moved)?),
            None => None,
        };

        let mut inherited = None;
        if from == to {
            let total = self
                .total_principal
                .checked_add(src.settled)
                .ok_or(LedgerError::Overflow)?;
            self.commit(from, src);
            self.total_principal = total;
        } else {
            let mut dst = self.stage(to, now)?;
            if dst.state.principal == 0 && moved > 0 {
                dst.state.rate = src.state.rate;
                inherited = Some(src.state.rate);
            }
            src.state.principal = available - moved;
            dst.state.principal = dst
                .state
                .principal
                .checked_add(moved)
                .ok_or(LedgerError::Overflow)?;
            let total = self
                .total_principal
                .checked_add(src.settled)
                .and_then(|t| t.checked_add(dst.settled))
                .ok_or(LedgerError::Overflow)?;
            self.commit(from, src);
            self.commit(to, dst);
            self.total_principal = total;
        }

        if let (Some(spender), Some(left)) = (spender, allowance_left) {
            let key = (from.clone(), spender.clone());
            if left == 0 {
                self.allowances.remove(&key);
            } else {
                self.allowances.insert(key, left);
            }
        }
        self.clock = now;
        if let Some(rate) = inherited {
            self.events.push(LedgerEvent::RateInherited {
                account: to.clone(),
                rate,
            });
        }
        self.events.push(LedgerEvent::Transferred {
            from: from.clone(),
            to: to.clone(),
            amount: moved,
        });
        debug!(domain = %self.domain, %from, %to, moved, "transferred");
        Ok(moved)
    }
}

impl AccrualLedger {
    /// Persist the ledger to a store.
    pub fn save_to_store(&self, store: &dyn LedgerStore) -> Result<(), LedgerError> {
        let meta = LedgerMeta {
            domain: self.domain,
            global: self.global.clone(),
            access: self.access.clone(),
            clock: self.clock,
            allowances: self
                .allowances
                .iter()
                .map(|((owner, spender), amount)| (owner.clone(), spender.clone(), *amount))
                .collect(),
        };
        let meta_bytes =
            bincode::serialize(&meta).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        store.put_meta(META_KEY, &meta_bytes)?;

        for (id, state) in &self.accounts {
            let bytes =
                bincode::serialize(state).map_err(|e| LedgerError::Serialization(e.to_string()))?;
            store.put_account_state(id, &bytes)?;
        }
        Ok(())
    }

    /// Restore a ledger from a store. The event journal starts empty.
    pub fn load_from_store(store: &dyn LedgerStore) -> Result<Self, LedgerError> {
        let meta_bytes = store
            .get_meta(META_KEY)?
            .ok_or_else(|| StoreError::NotFound("ledger_meta".to_string()))?;
        let meta: LedgerMeta = bincode::deserialize(&meta_bytes)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;

        let mut accounts = HashMap::new();
        let mut total_principal: u128 = 0;
        for (id, bytes) in store.iter_account_states()? {
            let state: AccountState = bincode::deserialize(&bytes)
                .map_err(|e| LedgerError::Serialization(e.to_string()))?;
            total_principal = total_principal
                .checked_add(state.principal)
                .ok_or(LedgerError::Overflow)?;
            accounts.insert(id, state);
        }

        Ok(Self {
            domain: meta.domain,
            accounts,
            allowances: meta
                .allowances
                .into_iter()
                .map(|(owner, spender, amount)| ((owner, spender), amount))
                .collect(),
            global: meta.global,
            access: meta.access,
            total_principal,
            clock: meta.clock,
            events: Vec::new(),
        })
    }
}

impl BalanceLedger for AccrualLedger {
    fn balance_of(&self, account: &AccountId, now: Timestamp) -> u128 {
        AccrualLedger::balance_of(self, account, now)
    }

    fn principal_of(&self, account: &AccountId) -> u128 {
        AccrualLedger::principal_of(self, account)
    }

    fn rate_of(&self, account: &AccountId) -> Rate {
        AccrualLedger::rate_of(self, account)
    }

    fn global_rate(&self) -> Rate {
        AccrualLedger::global_rate(self)
    }

    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<u128, LedgerError> {
        AccrualLedger::transfer(self, from, to, amount, now)
    }
}

impl MintBurnLedger for AccrualLedger {
    fn mint(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
        amount: u128,
        rate: Rate,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        AccrualLedger::mint(self, caller, account, amount, rate, now)
    }

    fn burn(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<u128, LedgerError> {
        AccrualLedger::burn(self, caller, account, amount, now)
    }

    fn checkpoint(&self, accounts: &[&AccountId]) -> LedgerCheckpoint {
        AccrualLedger::checkpoint(self, accounts)
    }

    fn restore(&mut self, checkpoint: LedgerCheckpoint) {
        AccrualLedger::restore(self, checkpoint)
    }
}

impl RateAdmin for AccrualLedger {
    fn set_global_rate(&mut self, caller: &AccountId, new_rate: Rate) -> Result<(), LedgerError> {
        AccrualLedger::set_global_rate(self, caller, new_rate)
    }

    fn grant_mint_and_burn_role(
        &mut self,
        caller: &AccountId,
        grantee: &AccountId,
    ) -> Result<(), LedgerError> {
        AccrualLedger::grant_mint_and_burn_role(self, caller, grantee)
    }

    fn revoke_mint_and_burn_role(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
    ) -> Result<(), LedgerError> {
        AccrualLedger::revoke_mint_and_burn_role(self, caller, account)
    }
}
