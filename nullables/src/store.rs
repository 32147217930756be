//! Nullable stores: thread-safe in-memory storage for testing.

use rebase_store::{ConsumedMessageStore, LedgerStore, StoreError};
use rebase_types::{AccountId, DomainId, MessageDigest};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory ledger store.
pub struct NullLedgerStore {
    accounts: Mutex<HashMap<AccountId, Vec<u8>>>,
    meta: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl NullLedgerStore {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            meta: Mutex::new(HashMap::new()),
        }
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }
}

impl Default for NullLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for NullLedgerStore {
    fn get_account_state(&self, account: &AccountId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.accounts.lock().unwrap().get(account).cloned())
    }

    fn put_account_state(&self, account: &AccountId, state: &[u8]) -> Result<(), StoreError> {
        self.accounts
            .lock()
            .unwrap()
            .insert(account.clone(), state.to_vec());
        Ok(())
    }

    fn iter_account_states(&self) -> Result<Vec<(AccountId, Vec<u8>)>, StoreError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.meta.lock().unwrap().get(key).cloned())
    }

    fn put_meta(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.meta
            .lock()
            .unwrap()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}

/// In-memory replay registry. Writes can be switched to fail.
pub struct NullConsumedStore {
    consumed: Mutex<HashMap<(DomainId, u64), MessageDigest>>,
    fail_writes: AtomicBool,
}

impl NullConsumedStore {
    pub fn new() -> Self {
        Self {
            consumed: Mutex::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `put_consumed` fail with a backend error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl Default for NullConsumedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsumedMessageStore for NullConsumedStore {
    fn get_consumed(
        &self,
        source: DomainId,
        sequence: u64,
    ) -> Result<Option<MessageDigest>, StoreError> {
        Ok(self
            .consumed
            .lock()
            .unwrap()
            .get(&(source, sequence))
            .copied())
    }

    fn put_consumed(
        &self,
        source: DomainId,
        sequence: u64,
        digest: MessageDigest,
    ) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("writes disabled".into()));
        }
        let mut consumed = self.consumed.lock().unwrap();
        if consumed.contains_key(&(source, sequence)) {
            return Err(StoreError::Duplicate(format!("{source}/{sequence}")));
        }
        consumed.insert((source, sequence), digest);
        Ok(())
    }

    fn consumed_count(&self) -> Result<u64, StoreError> {
        Ok(self.consumed.lock().unwrap().len() as u64)
    }
}
