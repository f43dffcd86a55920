// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic. The core holds
// narrow capability sets as `Arc<dyn Trait>` rather than concrete clients.
//
// Naming convention: Base* for trait names (e.g. BaseAccountStore)

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

use crate::domains::account::{Account, AccountPatch, NewAccount};
use crate::domains::otp::ContactChannel;

// =============================================================================
// Account Store Trait (Infrastructure - identity records)
// =============================================================================

/// Point lookups and mutations on account records. The backing store is the
/// single source of truth for identity; no joins or transactions are needed.
#[async_trait]
pub trait BaseAccountStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    async fn find_by_phone(&self, phone: &str) -> Result<Option<Account>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<Account>>;

    async fn create(&self, account: NewAccount) -> Result<Account>;

    /// Apply a partial update. Fails if the account does not exist.
    async fn update(&self, id: Uuid, patch: AccountPatch) -> Result<Account>;
}

// =============================================================================
// Ephemeral Store Trait (Infrastructure - TTL key/value)
// =============================================================================

/// Key-value store with per-key expiry, used both as a challenge cache and
/// as a single-use relay mailbox between handshake steps.
#[async_trait]
pub trait BaseEphemeralStore: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Read and delete in one step. Single-use mailbox keys rely on this
    /// being atomic in the backing store (Redis GETDEL).
    async fn take(&self, key: &str) -> Result<Option<String>>;
}

// =============================================================================
// OTP Gateway Trait (Infrastructure - out-of-band code delivery)
// =============================================================================

/// Delivers plaintext codes out of band (SMS or email). The code is handed
/// to this collaborator and never appears in an operation response.
#[async_trait]
pub trait BaseOtpGateway: Send + Sync {
    async fn send_code(&self, identifier: &str, code: &str, channel: ContactChannel)
        -> Result<()>;
}
