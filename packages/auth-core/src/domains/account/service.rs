//! Account lookup and contact-change flow
//!
//! Changing an authenticated account's phone or email is a two-step
//! protocol: `init_change` stages the new value and sends a code to it,
//! `confirm_change` applies the mutation once the code checks out. Only one
//! pending change is live per `(account, channel)` - a new init supersedes
//! the previous one.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::common::AuthError;
use crate::domains::account::{Account, AccountPatch, PendingContactChange};
use crate::domains::otp::{ContactChannel, OtpService};
use crate::kernel::{BaseAccountStore, BaseEphemeralStore, BaseOtpGateway};

/// Store TTL for a staged change; the row also carries its own absolute
/// expiry checked at confirm time.
const PENDING_CHANGE_TTL: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn BaseAccountStore>,
    cache: Arc<dyn BaseEphemeralStore>,
    otp: OtpService,
    otp_gateway: Arc<dyn BaseOtpGateway>,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn BaseAccountStore>,
        cache: Arc<dyn BaseEphemeralStore>,
        otp: OtpService,
        otp_gateway: Arc<dyn BaseOtpGateway>,
    ) -> Self {
        Self {
            accounts,
            cache,
            otp,
            otp_gateway,
        }
    }

    pub async fn get_account(&self, id: Uuid) -> Result<Account, AuthError> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or_else(|| AuthError::NotFound("Account not found".to_string()))
    }

    /// Stage a contact change: reject if the value is taken, issue a code to
    /// the new value and upsert the pending row.
    pub async fn init_change(
        &self,
        account_id: Uuid,
        channel: ContactChannel,
        new_value: &str,
    ) -> Result<(), AuthError> {
        let existing = match channel {
            ContactChannel::Phone => self.accounts.find_by_phone(new_value).await?,
            ContactChannel::Email => self.accounts.find_by_email(new_value).await?,
        };
        if existing.is_some() {
            return Err(AuthError::Conflict(format!(
                "An account with this {} already exists",
                channel
            )));
        }

        let issued = self.otp.issue(new_value, channel).await?;
        self.otp_gateway
            .send_code(new_value, &issued.code, channel)
            .await?;

        let pending = PendingContactChange {
            value: new_value.to_string(),
            code_hash: issued.hash,
            expires_at: Utc::now() + chrono::Duration::seconds(300),
        };
        let payload =
            serde_json::to_string(&pending).map_err(|e| AuthError::Internal(e.into()))?;
        self.cache
            .set(&pending_key(channel, account_id), &payload, PENDING_CHANGE_TTL)
            .await?;

        info!("Pending {} change staged for account {}", channel, account_id);
        Ok(())
    }

    /// Apply a staged change after the code for the new value verifies.
    pub async fn confirm_change(
        &self,
        account_id: Uuid,
        channel: ContactChannel,
        new_value: &str,
        code: &str,
    ) -> Result<Account, AuthError> {
        let key = pending_key(channel, account_id);

        let raw = self
            .cache
            .get(&key)
            .await?
            .ok_or_else(|| AuthError::NotFound("Pending change not found".to_string()))?;
        let pending: PendingContactChange =
            serde_json::from_str(&raw).map_err(|e| AuthError::Internal(e.into()))?;

        if pending.value != new_value {
            return Err(AuthError::InvalidArgument(format!("Mismatched {}", channel)));
        }
        // The row's own expiry binds even if the underlying OTP hash is
        // still present in the store.
        if pending.expires_at < Utc::now() {
            return Err(AuthError::NotFound("Pending change expired".to_string()));
        }

        self.otp.verify(&pending.value, code, channel).await?;

        let patch = match channel {
            ContactChannel::Phone => AccountPatch {
                phone: Some(new_value.to_string()),
                is_phone_verified: Some(true),
                ..Default::default()
            },
            ContactChannel::Email => AccountPatch {
                email: Some(new_value.to_string()),
                is_email_verified: Some(true),
                ..Default::default()
            },
        };
        let account = self.accounts.update(account_id, patch).await?;

        self.cache.delete(&key).await?;
        info!("Confirmed {} change for account {}", channel, account_id);
        Ok(account)
    }
}

fn pending_key(channel: ContactChannel, account_id: Uuid) -> String {
    format!("pending_change:{}:{}", channel.as_str(), account_id)
}
