pub mod deps;
pub mod test_dependencies;
pub mod traits;

pub use deps::AuthDeps;
pub use traits::{BaseAccountStore, BaseEphemeralStore, BaseOtpGateway};
