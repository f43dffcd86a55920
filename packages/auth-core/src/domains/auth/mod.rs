//! Primary sign-in flow (unauthenticated, identifier = phone or email)
//!
//! Registration and login share one code path: the first OTP request for an
//! unseen identifier creates the account with that single channel populated.

use std::sync::Arc;
use tracing::info;

use crate::common::AuthError;
use crate::domains::account::{AccountPatch, NewAccount};
use crate::domains::otp::{ContactChannel, OtpService};
use crate::domains::token::{TokenPair, TokenService};
use crate::kernel::{BaseAccountStore, BaseOtpGateway};

#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn BaseAccountStore>,
    otp: OtpService,
    otp_gateway: Arc<dyn BaseOtpGateway>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn BaseAccountStore>,
        otp: OtpService,
        otp_gateway: Arc<dyn BaseOtpGateway>,
        tokens: TokenService,
    ) -> Self {
        Self {
            accounts,
            otp,
            otp_gateway,
            tokens,
        }
    }

    /// Issue a sign-in challenge, creating the account on first contact.
    /// The plaintext code goes to the delivery gateway, never to the caller.
    pub async fn send_otp(
        &self,
        identifier: &str,
        channel: ContactChannel,
    ) -> Result<(), AuthError> {
        let account = match channel {
            ContactChannel::Phone => self.accounts.find_by_phone(identifier).await?,
            ContactChannel::Email => self.accounts.find_by_email(identifier).await?,
        };

        if account.is_none() {
            let new_account = match channel {
                ContactChannel::Phone => NewAccount {
                    phone: Some(identifier.to_string()),
                    ..Default::default()
                },
                ContactChannel::Email => NewAccount {
                    email: Some(identifier.to_string()),
                    ..Default::default()
                },
            };
            let created = self.accounts.create(new_account).await?;
            info!("Created account {} on first {} sign-in", created.id, channel);
        }

        let issued = self.otp.issue(identifier, channel).await?;
        self.otp_gateway
            .send_code(identifier, &issued.code, channel)
            .await?;
        Ok(())
    }

    /// Verify a sign-in challenge, mark the channel verified and mint tokens.
    pub async fn verify_otp(
        &self,
        identifier: &str,
        channel: ContactChannel,
        code: &str,
    ) -> Result<TokenPair, AuthError> {
        self.otp.verify(identifier, code, channel).await?;

        // send_otp always creates the account, so this is a defensive check
        let account = match channel {
            ContactChannel::Phone => self.accounts.find_by_phone(identifier).await?,
            ContactChannel::Email => self.accounts.find_by_email(identifier).await?,
        }
        .ok_or_else(|| AuthError::NotFound("Account not found".to_string()))?;

        let needs_flag = match channel {
            ContactChannel::Phone => !account.is_phone_verified,
            ContactChannel::Email => !account.is_email_verified,
        };
        if needs_flag {
            let patch = match channel {
                ContactChannel::Phone => AccountPatch {
                    is_phone_verified: Some(true),
                    ..Default::default()
                },
                ContactChannel::Email => AccountPatch {
                    is_email_verified: Some(true),
                    ..Default::default()
                },
            };
            self.accounts.update(account.id, patch).await?;
        }

        info!("OTP sign-in completed for account {}", account.id);
        self.tokens.generate(account.id)
    }

    /// Rotate a refresh token into a fresh pair.
    pub fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        self.tokens.refresh(refresh_token)
    }
}
