//! Integration tests for the primary OTP sign-in flow.
//!
//! Covers lazy account creation, single-use verification, non-destructive
//! failure, challenge overwrite and token refresh.

mod common;

use auth_core::common::AuthError;
use auth_core::domains::otp::ContactChannel;
use common::TestHarness;

const PHONE: &str = "+15551234567";

#[tokio::test]
async fn test_send_otp_creates_unverified_account() {
    let harness = TestHarness::new();

    harness
        .core
        .auth
        .send_otp(PHONE, ContactChannel::Phone)
        .await
        .unwrap();

    let accounts = harness.deps.accounts.all();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].phone.as_deref(), Some(PHONE));
    assert_eq!(accounts[0].email, None);
    assert!(!accounts[0].is_phone_verified);

    // The code went to the gateway, not to the caller
    assert_eq!(harness.deps.otp_gateway.call_count(), 1);
    let (to, code, channel) = harness.deps.otp_gateway.sent().remove(0);
    assert_eq!(to, PHONE);
    assert_eq!(code.len(), 6);
    assert_eq!(channel, ContactChannel::Phone);
}

#[tokio::test]
async fn test_send_otp_reuses_existing_account() {
    let harness = TestHarness::new();

    harness
        .core
        .auth
        .send_otp(PHONE, ContactChannel::Phone)
        .await
        .unwrap();
    harness
        .core
        .auth
        .send_otp(PHONE, ContactChannel::Phone)
        .await
        .unwrap();

    assert_eq!(harness.deps.accounts.count(), 1);
    assert_eq!(harness.deps.otp_gateway.call_count(), 2);
}

#[tokio::test]
async fn test_full_sign_in_flips_verified_flag_and_mints_tokens() {
    let harness = TestHarness::new();

    harness
        .core
        .auth
        .send_otp(PHONE, ContactChannel::Phone)
        .await
        .unwrap();
    let code = harness.delivered_code(PHONE);

    let pair = harness
        .core
        .auth
        .verify_otp(PHONE, ContactChannel::Phone, &code)
        .await
        .unwrap();

    let accounts = harness.deps.accounts.all();
    let account = &accounts[0];
    assert!(account.is_phone_verified);

    let claims = harness.core.tokens.verify(&pair.access_token).unwrap();
    assert_eq!(claims.sub, account.id.to_string());

    // The challenge was consumed: the same code cannot sign in twice
    let err = harness
        .core
        .auth
        .verify_otp(PHONE, ContactChannel::Phone, &code)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound(_)));
}

#[tokio::test]
async fn test_wrong_code_does_not_consume_challenge() {
    let harness = TestHarness::new();

    harness
        .core
        .auth
        .send_otp("user@example.com", ContactChannel::Email)
        .await
        .unwrap();
    let code = harness.delivered_code("user@example.com");
    let wrong = if code == "100000" { "100001" } else { "100000" };

    let err = harness
        .core
        .auth
        .verify_otp("user@example.com", ContactChannel::Email, wrong)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound(_)));

    // The real code still works afterwards
    harness
        .core
        .auth
        .verify_otp("user@example.com", ContactChannel::Email, &code)
        .await
        .unwrap();
    assert!(harness.deps.accounts.all()[0].is_email_verified);
}

#[tokio::test]
async fn test_new_challenge_invalidates_previous_code() {
    let harness = TestHarness::new();

    harness
        .core
        .auth
        .send_otp(PHONE, ContactChannel::Phone)
        .await
        .unwrap();
    let first = harness.delivered_code(PHONE);

    harness
        .core
        .auth
        .send_otp(PHONE, ContactChannel::Phone)
        .await
        .unwrap();
    let second = harness.delivered_code(PHONE);

    if first != second {
        let err = harness
            .core
            .auth
            .verify_otp(PHONE, ContactChannel::Phone, &first)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
    }

    harness
        .core
        .auth
        .verify_otp(PHONE, ContactChannel::Phone, &second)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_verify_without_challenge_fails_not_found() {
    let harness = TestHarness::new();

    let err = harness
        .core
        .auth
        .verify_otp(PHONE, ContactChannel::Phone, "123456")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound(_)));
    assert_eq!(harness.deps.accounts.count(), 0, "no account may be created");
}

#[tokio::test]
async fn test_expired_challenge_fails_like_missing() {
    let harness = TestHarness::new();

    harness
        .core
        .auth
        .send_otp(PHONE, ContactChannel::Phone)
        .await
        .unwrap();
    let code = harness.delivered_code(PHONE);

    // Simulate TTL eviction
    harness.deps.cache.evict(&format!("otp:phone:{}", PHONE));

    let err = harness
        .core
        .auth
        .verify_otp(PHONE, ContactChannel::Phone, &code)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound(_)));
}

#[tokio::test]
async fn test_refresh_rotates_token_pair() {
    let harness = TestHarness::new();

    harness
        .core
        .auth
        .send_otp(PHONE, ContactChannel::Phone)
        .await
        .unwrap();
    let code = harness.delivered_code(PHONE);
    let pair = harness
        .core
        .auth
        .verify_otp(PHONE, ContactChannel::Phone, &code)
        .await
        .unwrap();

    let rotated = harness.core.auth.refresh_tokens(&pair.refresh_token).unwrap();
    assert_ne!(rotated.refresh_token, pair.refresh_token);

    let original = harness.core.tokens.verify(&pair.access_token).unwrap();
    let refreshed = harness.core.tokens.verify(&rotated.access_token).unwrap();
    assert_eq!(original.sub, refreshed.sub);
}

#[tokio::test]
async fn test_refresh_with_garbage_fails_unauthenticated() {
    let harness = TestHarness::new();

    let err = harness.core.auth.refresh_tokens("not-a-token").unwrap_err();
    assert!(matches!(err, AuthError::Unauthenticated(_)));
}
