// Identity & Verification Core
//
// Issues and checks one-time passcodes, mediates the three-party Telegram
// login handshake, and mints/refreshes session token pairs. Everything
// transport-shaped (framing, request validation, delivery of codes) lives
// behind the kernel traits; this crate is the protocol logic only.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod rpc;

pub use common::AuthError;
pub use config::Config;
pub use rpc::AuthCore;
