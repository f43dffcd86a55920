//! Exposed operation surface: explicit method-dispatch table
//!
//! Every operation takes a small serde-typed request and returns a typed
//! response or an [`AuthError`]. The table is transport-agnostic; whatever
//! framing delivers `(method, params)` plugs in here.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::common::AuthError;
use crate::config::Config;
use crate::domains::account::{Account, AccountService, Role};
use crate::domains::auth::AuthService;
use crate::domains::otp::{ContactChannel, OtpService};
use crate::domains::telegram::TelegramService;
use crate::domains::token::TokenService;
use crate::kernel::AuthDeps;

// =============================================================================
// Request / response shapes (camelCase on the wire)
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub identifier: String,
    #[serde(rename = "type")]
    pub channel: ContactChannel,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub identifier: String,
    #[serde(rename = "type")]
    pub channel: ContactChannel,
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokensRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitEmailChangeRequest {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmEmailChangeRequest {
    pub user_id: Uuid,
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPhoneChangeRequest {
    pub user_id: Uuid,
    pub phone: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPhoneChangeRequest {
    pub user_id: Uuid,
    pub phone: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct TelegramVerifyRequest {
    pub query: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramCompleteRequest {
    pub session_id: String,
    pub phone: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramConsumeRequest {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct GetAccountRequest {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct UrlResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramCompleteResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAccountResponse {
    pub id: Uuid,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_phone_verified: bool,
    pub is_email_verified: bool,
    pub role: Role,
}

impl From<Account> for GetAccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            phone: account.phone,
            email: account.email,
            is_phone_verified: account.is_phone_verified,
            is_email_verified: account.is_email_verified,
            role: account.role,
        }
    }
}

// =============================================================================
// Core assembly + dispatch
// =============================================================================

/// All identity services wired together from the dependency container.
#[derive(Clone)]
pub struct AuthCore {
    pub auth: AuthService,
    pub accounts: AccountService,
    pub telegram: TelegramService,
    pub tokens: TokenService,
}

impl AuthCore {
    pub fn new(deps: AuthDeps, config: &Config) -> Self {
        let tokens = TokenService::new(
            &config.jwt_secret,
            config.jwt_issuer.clone(),
            config.access_token_ttl_secs,
            config.refresh_token_ttl_secs,
        );
        let otp = OtpService::new(deps.cache.clone());

        Self {
            auth: AuthService::new(
                deps.accounts.clone(),
                otp.clone(),
                deps.otp_gateway.clone(),
                tokens.clone(),
            ),
            accounts: AccountService::new(
                deps.accounts.clone(),
                deps.cache.clone(),
                otp.clone(),
                deps.otp_gateway.clone(),
            ),
            telegram: TelegramService::new(deps.accounts, deps.cache, tokens.clone(), config),
            tokens,
        }
    }

    /// Dispatch a named operation with JSON params.
    pub async fn dispatch(&self, method: &str, params: Value) -> Result<Value, AuthError> {
        match method {
            "SendOtp" => {
                let req: SendOtpRequest = parse(params)?;
                self.auth.send_otp(&req.identifier, req.channel).await?;
                respond(&OkResponse { ok: true })
            }
            "VerifyOtp" => {
                let req: VerifyOtpRequest = parse(params)?;
                let pair = self
                    .auth
                    .verify_otp(&req.identifier, req.channel, &req.code)
                    .await?;
                respond(&pair)
            }
            "RefreshTokens" => {
                let req: RefreshTokensRequest = parse(params)?;
                let pair = self.auth.refresh_tokens(&req.refresh_token)?;
                respond(&pair)
            }
            "InitEmailChange" => {
                let req: InitEmailChangeRequest = parse(params)?;
                self.accounts
                    .init_change(req.user_id, ContactChannel::Email, &req.email)
                    .await?;
                respond(&OkResponse { ok: true })
            }
            "ConfirmEmailChange" => {
                let req: ConfirmEmailChangeRequest = parse(params)?;
                self.accounts
                    .confirm_change(req.user_id, ContactChannel::Email, &req.email, &req.code)
                    .await?;
                respond(&OkResponse { ok: true })
            }
            "InitPhoneChange" => {
                let req: InitPhoneChangeRequest = parse(params)?;
                self.accounts
                    .init_change(req.user_id, ContactChannel::Phone, &req.phone)
                    .await?;
                respond(&OkResponse { ok: true })
            }
            "ConfirmPhoneChange" => {
                let req: ConfirmPhoneChangeRequest = parse(params)?;
                self.accounts
                    .confirm_change(req.user_id, ContactChannel::Phone, &req.phone, &req.code)
                    .await?;
                respond(&OkResponse { ok: true })
            }
            "TelegramInit" => respond(&UrlResponse {
                url: self.telegram.auth_url(),
            }),
            "TelegramVerify" => {
                let req: TelegramVerifyRequest = parse(params)?;
                let outcome = self.telegram.verify(&req.query).await?;
                respond(&outcome)
            }
            "TelegramComplete" => {
                let req: TelegramCompleteRequest = parse(params)?;
                let session_id = self.telegram.complete(&req.session_id, &req.phone).await?;
                respond(&TelegramCompleteResponse { session_id })
            }
            "TelegramConsume" => {
                let req: TelegramConsumeRequest = parse(params)?;
                let pair = self.telegram.consume_session(&req.session_id).await?;
                respond(&pair)
            }
            "GetAccount" => {
                let req: GetAccountRequest = parse(params)?;
                let account = self.accounts.get_account(req.id).await?;
                respond(&GetAccountResponse::from(account))
            }
            other => Err(AuthError::InvalidArgument(format!(
                "Unknown method: {}",
                other
            ))),
        }
    }
}

fn parse<T: DeserializeOwned>(params: Value) -> Result<T, AuthError> {
    serde_json::from_value(params)
        .map_err(|e| AuthError::InvalidArgument(format!("Malformed request: {}", e)))
}

fn respond<T: Serialize>(response: &T) -> Result<Value, AuthError> {
    serde_json::to_value(response).map_err(|e| AuthError::Internal(e.into()))
}
