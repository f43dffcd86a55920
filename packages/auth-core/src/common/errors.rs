use thiserror::Error;

/// Typed failures surfaced by every identity operation.
///
/// `NotFound` deliberately covers both "never existed" and "expired" for OTP
/// challenges and relay sessions, so callers cannot probe for existence.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
