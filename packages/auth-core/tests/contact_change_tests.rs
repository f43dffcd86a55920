//! Integration tests for the authenticated contact-change flow.

mod common;

use auth_core::common::AuthError;
use auth_core::domains::account::{NewAccount, PendingContactChange};
use auth_core::domains::otp::ContactChannel;
use auth_core::kernel::{BaseAccountStore, BaseEphemeralStore};
use chrono::Utc;
use common::TestHarness;
use std::time::Duration;
use uuid::Uuid;

async fn seed_account(harness: &TestHarness, phone: Option<&str>, email: Option<&str>) -> Uuid {
    harness
        .deps
        .accounts
        .create(NewAccount {
            phone: phone.map(str::to_string),
            email: email.map(str::to_string),
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_email_change_happy_path() {
    let harness = TestHarness::new();
    let account_id = seed_account(&harness, Some("+15551234567"), None).await;

    harness
        .core
        .accounts
        .init_change(account_id, ContactChannel::Email, "new@example.com")
        .await
        .unwrap();

    let code = harness.delivered_code("new@example.com");
    let account = harness
        .core
        .accounts
        .confirm_change(account_id, ContactChannel::Email, "new@example.com", &code)
        .await
        .unwrap();

    assert_eq!(account.email.as_deref(), Some("new@example.com"));
    assert!(account.is_email_verified);

    // Pending row is gone: confirming again fails
    let err = harness
        .core
        .accounts
        .confirm_change(account_id, ContactChannel::Email, "new@example.com", &code)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound(_)));
}

#[tokio::test]
async fn test_init_change_conflicts_on_taken_value() {
    let harness = TestHarness::new();
    let account_id = seed_account(&harness, Some("+15551234567"), None).await;
    seed_account(&harness, None, Some("taken@example.com")).await;

    let err = harness
        .core
        .accounts
        .init_change(account_id, ContactChannel::Email, "taken@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Conflict(_)));

    // No pending record and no delivery on conflict
    let key = format!("pending_change:email:{}", account_id);
    assert!(!harness.deps.cache.contains(&key));
    assert_eq!(harness.deps.otp_gateway.call_count(), 0);
}

#[tokio::test]
async fn test_confirm_with_mismatched_value_fails() {
    let harness = TestHarness::new();
    let account_id = seed_account(&harness, Some("+15551234567"), None).await;

    harness
        .core
        .accounts
        .init_change(account_id, ContactChannel::Email, "new@example.com")
        .await
        .unwrap();
    let code = harness.delivered_code("new@example.com");

    let err = harness
        .core
        .accounts
        .confirm_change(account_id, ContactChannel::Email, "other@example.com", &code)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidArgument(_)));

    // The staged change survives a mismatched attempt
    harness
        .core
        .accounts
        .confirm_change(account_id, ContactChannel::Email, "new@example.com", &code)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_confirm_without_init_fails_not_found() {
    let harness = TestHarness::new();
    let account_id = seed_account(&harness, Some("+15551234567"), None).await;

    let err = harness
        .core
        .accounts
        .confirm_change(account_id, ContactChannel::Email, "new@example.com", "123456")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound(_)));
}

#[tokio::test]
async fn test_confirm_honors_row_expiry_independently_of_otp_ttl() {
    let harness = TestHarness::new();
    let account_id = seed_account(&harness, Some("+15551234567"), None).await;

    harness
        .core
        .accounts
        .init_change(account_id, ContactChannel::Phone, "+15559990000")
        .await
        .unwrap();
    let code = harness.delivered_code("+15559990000");

    // Rewrite the pending row with an absolute expiry in the past while the
    // OTP hash itself is still live in the store.
    let key = format!("pending_change:phone:{}", account_id);
    let stale = PendingContactChange {
        value: "+15559990000".to_string(),
        code_hash: auth_core::domains::otp::hash_code(&code),
        expires_at: Utc::now() - chrono::Duration::seconds(1),
    };
    harness
        .deps
        .cache
        .set(&key, &serde_json::to_string(&stale).unwrap(), Duration::from_secs(300))
        .await
        .unwrap();

    let err = harness
        .core
        .accounts
        .confirm_change(account_id, ContactChannel::Phone, "+15559990000", &code)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound(_)));
}

#[tokio::test]
async fn test_reinit_supersedes_previous_pending_change() {
    let harness = TestHarness::new();
    let account_id = seed_account(&harness, Some("+15551234567"), None).await;

    harness
        .core
        .accounts
        .init_change(account_id, ContactChannel::Email, "first@example.com")
        .await
        .unwrap();
    harness
        .core
        .accounts
        .init_change(account_id, ContactChannel::Email, "second@example.com")
        .await
        .unwrap();

    // Only the latest staged value confirms
    let err = harness
        .core
        .accounts
        .confirm_change(
            account_id,
            ContactChannel::Email,
            "first@example.com",
            &harness.delivered_code("first@example.com"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidArgument(_)));

    harness
        .core
        .accounts
        .confirm_change(
            account_id,
            ContactChannel::Email,
            "second@example.com",
            &harness.delivered_code("second@example.com"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_get_account_not_found() {
    let harness = TestHarness::new();

    let err = harness
        .core
        .accounts
        .get_account(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound(_)));
}
