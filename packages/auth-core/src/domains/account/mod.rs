pub mod models;
pub mod service;

pub use models::{Account, AccountPatch, NewAccount, PendingContactChange, Role};
pub use service::AccountService;
