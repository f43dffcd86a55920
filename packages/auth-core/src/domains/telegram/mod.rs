//! Federated-login handshake with the Telegram bot identity provider
//!
//! Three-step protocol relayed through the ephemeral store:
//! the web client opens the provider auth page (`auth_url`), comes back with
//! a signed query (`verify`), the bot actor finishes with a phone number
//! (`complete`), and the original client picks the tokens up
//! (`consume_session`). The party that completes the handshake is not the
//! party that needs the tokens, so the store acts as a single-use mailbox
//! between the two connections.

use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::common::AuthError;
use crate::config::Config;
use crate::domains::account::{AccountPatch, NewAccount};
use crate::domains::token::{TokenPair, TokenService};
use crate::kernel::{BaseAccountStore, BaseEphemeralStore};

type HmacSha256 = Hmac<Sha256>;

/// Lifetime of a pending session awaiting the bot's `complete` call
pub const SESSION_TTL: Duration = Duration::from_secs(300);
/// Lifetime of minted tokens awaiting pickup by the original client
pub const TOKEN_RELAY_TTL: Duration = Duration::from_secs(120);

/// Relay record created after signature verification
#[derive(Debug, Serialize, Deserialize)]
struct TelegramSession {
    telegram_id: i64,
    username: Option<String>,
}

/// Outcome of the signature-verification step
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TelegramVerifyOutcome {
    /// Repeat login fast path: the Telegram id is already bound to an
    /// account with a verified phone, no session is created.
    Authenticated(TokenPair),
    /// Deep link for the bot actor to open; embeds the session id.
    DeepLink { url: String },
}

#[derive(Clone)]
pub struct TelegramService {
    accounts: Arc<dyn BaseAccountStore>,
    cache: Arc<dyn BaseEphemeralStore>,
    tokens: TokenService,
    bot_id: String,
    bot_token: String,
    bot_username: String,
    redirect_origin: String,
}

impl TelegramService {
    pub fn new(
        accounts: Arc<dyn BaseAccountStore>,
        cache: Arc<dyn BaseEphemeralStore>,
        tokens: TokenService,
        config: &Config,
    ) -> Self {
        Self {
            accounts,
            cache,
            tokens,
            bot_id: config.telegram_bot_id.clone(),
            bot_token: config.telegram_bot_token.clone(),
            bot_username: config.telegram_bot_username.clone(),
            redirect_origin: config.telegram_redirect_origin.clone(),
        }
    }

    /// Redirect URL for the provider's auth page. No state is created yet.
    pub fn auth_url(&self) -> String {
        format!(
            "https://oauth.telegram.org/auth?bot_id={}&origin={}&request_access=write&return_to={}",
            self.bot_id, self.redirect_origin, self.redirect_origin
        )
    }

    /// Validate the signed callback query and either finish immediately
    /// (repeat login) or open a pending session for the bot actor.
    pub async fn verify(
        &self,
        query: &HashMap<String, String>,
    ) -> Result<TelegramVerifyOutcome, AuthError> {
        if !self.check_signature(query) {
            return Err(AuthError::Unauthenticated("Invalid Telegram auth".to_string()));
        }

        let telegram_id: i64 = query
            .get("id")
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| AuthError::Unauthenticated("Invalid Telegram auth".to_string()))?;

        if let Some(account) = self.accounts.find_by_telegram_id(telegram_id).await? {
            if account.is_phone_verified {
                info!("Repeat Telegram sign-in for account {}", account.id);
                return Ok(TelegramVerifyOutcome::Authenticated(
                    self.tokens.generate(account.id)?,
                ));
            }
        }

        let session_id = new_session_id();
        let session = TelegramSession {
            telegram_id,
            username: query.get("username").cloned(),
        };
        let payload =
            serde_json::to_string(&session).map_err(|e| AuthError::Internal(e.into()))?;
        self.cache
            .set(&session_key(&session_id), &payload, SESSION_TTL)
            .await?;

        info!("Telegram session opened for provider id {}", telegram_id);
        Ok(TelegramVerifyOutcome::DeepLink {
            url: format!("http://t.me/{}?start={}", self.bot_username, session_id),
        })
    }

    /// Called by the bot actor with the phone it collected. Consumes the
    /// pending session, binds the Telegram identity to an account and parks
    /// the minted tokens for pickup. Returns only the session id - the
    /// tokens go to whoever calls `consume_session`.
    pub async fn complete(&self, session_id: &str, phone: &str) -> Result<String, AuthError> {
        let raw = self
            .cache
            .take(&session_key(session_id))
            .await?
            .ok_or_else(|| AuthError::NotFound("Invalid Telegram session".to_string()))?;
        let session: TelegramSession =
            serde_json::from_str(&raw).map_err(|e| AuthError::Internal(e.into()))?;

        let account = match self.accounts.find_by_phone(phone).await? {
            Some(account) => account,
            None => {
                self.accounts
                    .create(NewAccount {
                        phone: Some(phone.to_string()),
                        ..Default::default()
                    })
                    .await?
            }
        };
        let account = self
            .accounts
            .update(
                account.id,
                AccountPatch {
                    telegram_id: Some(session.telegram_id),
                    is_phone_verified: Some(true),
                    ..Default::default()
                },
            )
            .await?;

        let pair = self.tokens.generate(account.id)?;
        let payload = serde_json::to_string(&pair).map_err(|e| AuthError::Internal(e.into()))?;
        self.cache
            .set(&tokens_key(session_id), &payload, TOKEN_RELAY_TTL)
            .await?;

        info!("Telegram handshake completed for account {}", account.id);
        Ok(session_id.to_string())
    }

    /// Single-use token pickup by the original client.
    pub async fn consume_session(&self, session_id: &str) -> Result<TokenPair, AuthError> {
        let raw = self
            .cache
            .take(&tokens_key(session_id))
            .await?
            .ok_or_else(|| AuthError::NotFound("Invalid Telegram session".to_string()))?;
        serde_json::from_str(&raw).map_err(|e| AuthError::Internal(e.into()))
    }

    /// HMAC-SHA256 over all non-`hash` params, lexicographically sorted and
    /// joined as `key=value` lines, keyed with `SHA256(bot_id:bot_token)`.
    fn check_signature(&self, query: &HashMap<String, String>) -> bool {
        let Some(provided) = query.get("hash") else {
            return false;
        };
        let Ok(provided) = hex::decode(provided) else {
            return false;
        };

        let data_check_str = query
            .iter()
            .filter(|(key, _)| key.as_str() != "hash")
            .collect::<BTreeMap<_, _>>()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("\n");

        let secret = Sha256::digest(format!("{}:{}", self.bot_id, self.bot_token).as_bytes());
        let Ok(mut mac) = HmacSha256::new_from_slice(&secret) else {
            return false;
        };
        mac.update(data_check_str.as_bytes());
        mac.verify_slice(&provided).is_ok()
    }
}

fn session_key(session_id: &str) -> String {
    format!("telegram_session:{}", session_id)
}

fn tokens_key(session_id: &str) -> String {
    format!("telegram_tokens:{}", session_id)
}

/// Opaque 128-bit capability token, hex-encoded
fn new_session_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes[..]);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_is_128_bit_hex() {
        let id = new_session_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_session_id());
    }
}
