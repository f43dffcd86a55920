use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. Policy beyond a binary admin check lives outside this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
}

/// Identity record - the single source of truth for who a caller is.
///
/// Created lazily on first OTP request or first handshake completion.
/// `telegram_id` is set only after a successful federated handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub telegram_id: Option<i64>,
    pub is_phone_verified: bool,
    pub is_email_verified: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Fields for lazy account creation (one contact channel populated)
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Partial update applied by verification steps. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub telegram_id: Option<i64>,
    pub is_phone_verified: Option<bool>,
    pub is_email_verified: Option<bool>,
}

/// Staged, unconfirmed change to an authenticated account's contact value.
///
/// Carries its own absolute expiry on top of the store TTL; the stricter of
/// the two binds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingContactChange {
    pub value: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
}
