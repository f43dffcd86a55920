// Common test utilities

#![allow(dead_code)]

use auth_core::kernel::test_dependencies::TestDependencies;
use auth_core::{AuthCore, Config};

pub const TEST_BOT_ID: &str = "123456";
pub const TEST_BOT_TOKEN: &str = "test_bot_token";
pub const TEST_BOT_USERNAME: &str = "test_bot";

pub fn test_config() -> Config {
    Config {
        jwt_secret: "test_secret_key".to_string(),
        jwt_issuer: "test_issuer".to_string(),
        access_token_ttl_secs: 900,
        refresh_token_ttl_secs: 2_592_000,
        telegram_bot_id: TEST_BOT_ID.to_string(),
        telegram_bot_token: TEST_BOT_TOKEN.to_string(),
        telegram_bot_username: TEST_BOT_USERNAME.to_string(),
        telegram_redirect_origin: "https://app.example.com".to_string(),
    }
}

/// In-memory wiring of the whole core plus handles on the test doubles.
pub struct TestHarness {
    pub deps: TestDependencies,
    pub core: AuthCore,
}

impl TestHarness {
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("auth_core=info")
            .with_test_writer()
            .try_init();

        let deps = TestDependencies::new();
        let core = AuthCore::new(deps.to_deps(), &test_config());
        Self { deps, core }
    }

    /// The most recent code the gateway delivered to an identifier
    pub fn delivered_code(&self, identifier: &str) -> String {
        self.deps
            .otp_gateway
            .last_code_for(identifier)
            .expect("no OTP was delivered to this identifier")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
