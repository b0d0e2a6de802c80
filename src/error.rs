use warp::reject::Reject;

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    /// Unknown username or wrong password. Deliberately a single variant so
    /// callers cannot tell which, and usernames cannot be enumerated.
    #[error("username or password incorrect")]
    InvalidCredentials,
    #[error("account is disabled")]
    AccountDisabled,
    /// Forged, tampered-with, or structurally unusable token.
    #[error("token signature invalid or token malformed")]
    BadSignature {
        #[source]
        source: Option<jsonwebtoken::errors::Error>,
    },
    #[error("token has expired")]
    Expired,
    #[error("token carries no subject")]
    MissingSubject,
    #[error("error during user store operation")]
    Store {
        #[from]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("invalid auth configuration: {0}")]
    Configuration(&'static str),
    #[error("error while hashing password")]
    Hash {
        #[from]
        source: argon2::Error,
    },
}

impl Reject for AuthError {}
