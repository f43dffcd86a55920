//! OTP challenge engine
//!
//! Issues 6-digit codes bound to `(channel, identifier)` and verifies them.
//! Only the SHA-256 hash of a code is ever stored; challenges are single-use
//! and expire after [`OTP_TTL`]. At most one challenge is live per pair -
//! issuing again overwrites the previous hash and resets the TTL.

use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::common::AuthError;
use crate::kernel::BaseEphemeralStore;

/// Lifetime of a stored challenge
pub const OTP_TTL: Duration = Duration::from_secs(300);

/// Contact channel an identifier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactChannel {
    Phone,
    Email,
}

impl ContactChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactChannel::Phone => "phone",
            ContactChannel::Email => "email",
        }
    }
}

impl fmt::Display for ContactChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly issued challenge. The plaintext code is handed to the delivery
/// gateway by the caller; only the hash is persisted.
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub code: String,
    pub hash: String,
}

#[derive(Clone)]
pub struct OtpService {
    cache: Arc<dyn BaseEphemeralStore>,
}

impl OtpService {
    pub fn new(cache: Arc<dyn BaseEphemeralStore>) -> Self {
        Self { cache }
    }

    /// Generate a code, store its hash under `otp:{channel}:{identifier}`
    /// and return the plaintext for out-of-band delivery.
    ///
    /// Overwrites any prior challenge for the same pair.
    pub async fn issue(
        &self,
        identifier: &str,
        channel: ContactChannel,
    ) -> Result<IssuedOtp, AuthError> {
        let issued = generate_code();

        self.cache
            .set(&challenge_key(channel, identifier), &issued.hash, OTP_TTL)
            .await?;

        info!("OTP challenge stored for {}:{}", channel, identifier);
        Ok(issued)
    }

    /// Check a submitted code against the stored hash.
    ///
    /// A missing challenge and a wrong code fail identically, so callers
    /// cannot tell whether a challenge ever existed. The challenge is left
    /// intact on mismatch and deleted only on success.
    pub async fn verify(
        &self,
        identifier: &str,
        code: &str,
        channel: ContactChannel,
    ) -> Result<(), AuthError> {
        let key = challenge_key(channel, identifier);

        let stored_hash = self
            .cache
            .get(&key)
            .await?
            .ok_or_else(|| AuthError::NotFound("Invalid or expired code".to_string()))?;

        if hash_code(code) != stored_hash {
            return Err(AuthError::NotFound("Invalid or expired code".to_string()));
        }

        self.cache.delete(&key).await?;
        info!("OTP verified for {}:{}", channel, identifier);
        Ok(())
    }
}

fn challenge_key(channel: ContactChannel, identifier: &str) -> String {
    format!("otp:{}:{}", channel.as_str(), identifier)
}

/// Hash an OTP code with SHA-256 (hex-encoded)
pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Uniformly random 6-digit code in [100000, 999999]
fn generate_code() -> IssuedOtp {
    let code = rand::thread_rng().gen_range(100_000u32..1_000_000).to_string();
    let hash = hash_code(&code);
    IssuedOtp { code, hash }
}
