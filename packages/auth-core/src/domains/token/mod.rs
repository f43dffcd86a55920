//! Token issuer
//!
//! Mints and validates signed, time-bounded access/refresh token pairs.
//! Tokens are stateless JWTs carrying the account id as subject; refresh
//! performs stateless rotation (a fresh pair, no revocation list).

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::AuthError;

/// JWT Claims - data stored in the token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (account id as string)
    pub exp: i64,    // Expiration timestamp
    pub iat: i64,    // Issued at timestamp
    pub iss: String, // Issuer
    pub jti: String, // JWT ID (unique token identifier)
}

/// Access/refresh pair handed to a freshly authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Token Service - creates and verifies signed token pairs
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl TokenService {
    pub fn new(
        secret: &str,
        issuer: String,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            access_ttl: chrono::Duration::seconds(access_ttl_secs),
            refresh_ttl: chrono::Duration::seconds(refresh_ttl_secs),
        }
    }

    /// Mint an independently signed access/refresh pair for an account
    pub fn generate(&self, account_id: Uuid) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.sign(account_id, self.access_ttl)?,
            refresh_token: self.sign(account_id, self.refresh_ttl)?,
        })
    }

    fn sign(&self, account_id: Uuid, ttl: chrono::Duration) -> Result<String, AuthError> {
        let now = chrono::Utc::now();

        let claims = Claims {
            sub: account_id.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("failed to sign token: {}", e)))
    }

    /// Verify signature, expiry and issuer; returns the claims when valid
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::Unauthenticated("Invalid or expired token".to_string()))
    }

    /// Rotate a refresh token into a fresh pair for the same subject
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.verify(refresh_token)?;
        let account_id = claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| AuthError::Unauthenticated("Invalid or expired token".to_string()))?;
        self.generate(account_id)
    }
}
