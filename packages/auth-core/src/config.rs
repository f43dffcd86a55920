use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
///
/// Passed explicitly at construction; nothing in the core reads the
/// environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub telegram_bot_id: String,
    pub telegram_bot_token: String,
    pub telegram_bot_username: String,
    pub telegram_redirect_origin: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "auth-core".to_string()),
            access_token_ttl_secs: env::var("ACCESS_TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .context("ACCESS_TOKEN_TTL_SECS must be a valid number")?,
            refresh_token_ttl_secs: env::var("REFRESH_TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "2592000".to_string())
                .parse()
                .context("REFRESH_TOKEN_TTL_SECS must be a valid number")?,
            telegram_bot_id: env::var("TELEGRAM_BOT_ID")
                .context("TELEGRAM_BOT_ID must be set")?,
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .context("TELEGRAM_BOT_TOKEN must be set")?,
            telegram_bot_username: env::var("TELEGRAM_BOT_USERNAME")
                .context("TELEGRAM_BOT_USERNAME must be set")?,
            telegram_redirect_origin: env::var("TELEGRAM_REDIRECT_ORIGIN")
                .context("TELEGRAM_REDIRECT_ORIGIN must be set")?,
        })
    }
}
