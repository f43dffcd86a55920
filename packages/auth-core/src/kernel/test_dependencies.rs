// TestDependencies - in-memory implementations for testing
//
// Provides store/gateway doubles that can be injected into AuthCore for
// tests. The ephemeral store honors TTLs against a monotonic clock, so
// expiry behavior can be exercised without a real Redis.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::{AuthDeps, BaseAccountStore, BaseEphemeralStore, BaseOtpGateway};
use crate::domains::account::{Account, AccountPatch, NewAccount, Role};
use crate::domains::otp::ContactChannel;

// =============================================================================
// In-memory Account Store
// =============================================================================

pub struct MemoryAccountStore {
    accounts: Mutex<Vec<Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(Vec::new()),
        }
    }

    /// Number of accounts currently stored
    pub fn count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }

    /// Snapshot of all accounts (for assertions)
    pub fn all(&self) -> Vec<Account> {
        self.accounts.lock().unwrap().clone()
    }
}

impl Default for MemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseAccountStore for MemoryAccountStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<Account>> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .iter()
            .find(|a| a.phone.as_deref() == Some(phone))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .iter()
            .find(|a| a.email.as_deref() == Some(email))
            .cloned())
    }

    async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<Account>> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .iter()
            .find(|a| a.telegram_id == Some(telegram_id))
            .cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<Account> {
        let created = Account {
            id: Uuid::new_v4(),
            phone: account.phone,
            email: account.email,
            telegram_id: None,
            is_phone_verified: false,
            is_email_verified: false,
            role: Role::User,
            created_at: Utc::now(),
        };
        self.accounts.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: AccountPatch) -> Result<Account> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| anyhow::anyhow!("account {} not found", id))?;

        if let Some(phone) = patch.phone {
            account.phone = Some(phone);
        }
        if let Some(email) = patch.email {
            account.email = Some(email);
        }
        if let Some(telegram_id) = patch.telegram_id {
            account.telegram_id = Some(telegram_id);
        }
        if let Some(flag) = patch.is_phone_verified {
            account.is_phone_verified = flag;
        }
        if let Some(flag) = patch.is_email_verified {
            account.is_email_verified = flag;
        }
        Ok(account.clone())
    }
}

// =============================================================================
// In-memory Ephemeral Store
// =============================================================================

pub struct MemoryEphemeralStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryEphemeralStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Check whether a live (unexpired) entry exists for the key
    pub fn contains(&self, key: &str) -> bool {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .map(|(_, deadline)| *deadline > Instant::now())
            .unwrap_or(false)
    }

    /// Force-expire a key, simulating natural TTL eviction
    pub fn evict(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    fn get_live(&self, key: &str, remove: bool) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((_, deadline)) if *deadline <= Instant::now() => {
                entries.remove(key);
                None
            }
            Some((value, _)) => {
                let value = value.clone();
                if remove {
                    entries.remove(key);
                }
                Some(value)
            }
            None => None,
        }
    }
}

impl Default for MemoryEphemeralStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseEphemeralStore for MemoryEphemeralStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let deadline = Instant::now() + ttl;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get_live(key, false))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get_live(key, true))
    }
}

// =============================================================================
// Mock OTP Gateway
// =============================================================================

/// Records delivered codes instead of sending anything.
pub struct MockOtpGateway {
    sent: Mutex<Vec<(String, String, ContactChannel)>>,
}

impl MockOtpGateway {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    /// All (identifier, code, channel) deliveries so far
    pub fn sent(&self) -> Vec<(String, String, ContactChannel)> {
        self.sent.lock().unwrap().clone()
    }

    /// The most recent code delivered to an identifier
    pub fn last_code_for(&self, identifier: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _, _)| to == identifier)
            .map(|(_, code, _)| code.clone())
    }

    pub fn call_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Default for MockOtpGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseOtpGateway for MockOtpGateway {
    async fn send_code(
        &self,
        identifier: &str,
        code: &str,
        channel: ContactChannel,
    ) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((identifier.to_string(), code.to_string(), channel));
        Ok(())
    }
}

// =============================================================================
// TestDependencies - bundle for tests
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub accounts: Arc<MemoryAccountStore>,
    pub cache: Arc<MemoryEphemeralStore>,
    pub otp_gateway: Arc<MockOtpGateway>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(MemoryAccountStore::new()),
            cache: Arc::new(MemoryEphemeralStore::new()),
            otp_gateway: Arc::new(MockOtpGateway::new()),
        }
    }

    /// Convert into an AuthDeps container for constructing the core
    pub fn to_deps(&self) -> AuthDeps {
        AuthDeps::new(
            self.accounts.clone(),
            self.cache.clone(),
            self.otp_gateway.clone(),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
