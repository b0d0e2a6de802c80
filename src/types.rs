use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[repr(transparent)]
pub struct Username(pub String);

#[derive(Debug, Clone, Deserialize, Serialize)]
#[repr(transparent)]
pub struct HashedPassword(pub String);

/// A user as stored in the external [`UserStore`](crate::UserStore).
/// The auth core only ever reads these.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub username: Username,
    pub password_hash: HashedPassword,
    pub display_name: String,
    /// Disabled accounts fail both login and token re-resolution.
    pub disabled: bool,
}

/// Claims carried by every access token.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Claims {
    /// Subject, the username the token was issued to.
    /// Tolerated absent on decode so the validator can report it as a
    /// distinct failure rather than a parse error.
    #[serde(default)]
    pub sub: String,
    pub iss: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: u64,
    /// Expiry, seconds since the Unix epoch. Always `iat` plus the lifetime
    /// the token was issued with.
    pub exp: u64,
    /// Unique token id (UUID v4), for audit logging only.
    #[serde(default)]
    pub jti: String,
}
