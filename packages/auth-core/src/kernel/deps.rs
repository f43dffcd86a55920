//! Dependency container for the identity core (traits for testability)

use std::sync::Arc;

use crate::kernel::{BaseAccountStore, BaseEphemeralStore, BaseOtpGateway};

/// External collaborators the core operates against.
#[derive(Clone)]
pub struct AuthDeps {
    pub accounts: Arc<dyn BaseAccountStore>,
    pub cache: Arc<dyn BaseEphemeralStore>,
    pub otp_gateway: Arc<dyn BaseOtpGateway>,
}

impl AuthDeps {
    pub fn new(
        accounts: Arc<dyn BaseAccountStore>,
        cache: Arc<dyn BaseEphemeralStore>,
        otp_gateway: Arc<dyn BaseOtpGateway>,
    ) -> Self {
        Self {
            accounts,
            cache,
            otp_gateway,
        }
    }
}
