pub mod account;
pub mod auth;
pub mod otp;
pub mod telegram;
pub mod token;
