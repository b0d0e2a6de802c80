use std::{
    error::Error,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    error::AuthError,
    types::{Claims, HashedPassword, UserRecord, Username},
};

/// Read-only lookup capability over the externally owned user store.
/// Implement this for whatever actually holds the users (a database, an
/// in-memory table, an LDAP client) and hand it to [`AuthConfig`].
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Retrieve the record for the user with the given username.
    /// Returns `Ok(None)` when no such user exists; `Err` is reserved for
    /// store failures (connection loss, corruption), which are reported
    /// separately from bad credentials.
    async fn lookup(
        &self,
        username: &Username,
    ) -> Result<Option<UserRecord>, Box<dyn Error + Send + Sync>>;
}

/// rust-argon2 rejects anything shorter.
const MIN_SALT_LENGTH: usize = 8;

#[derive(Clone)]
pub struct AuthConfig {
    /// The salt used when hashing passwords for storage.
    /// If the salt changes, previously stored hashes no longer verify.
    pub password_salt: String,
    /// The issuer embedded in every token. Validation rejects tokens minted
    /// for any other issuer.
    pub token_issuer: String,
    /// The secret used to sign bearer tokens.
    /// If the secret changes, all outstanding tokens become invalid.
    pub token_secret: String,
    /// How long issued tokens remain valid. After this interval the client
    /// has to log in again.
    pub token_lifetime: Duration,
    pub user_store: Arc<dyn UserStore>,
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

pub(crate) struct AuthInternal {
    config: AuthConfig,
}

impl AuthInternal {
    pub fn hash(&self, password: &str) -> Result<HashedPassword, AuthError> {
        let encoded = argon2::hash_encoded(
            password.as_bytes(),
            self.config.password_salt.as_bytes(),
            &Default::default(),
        )?;

        Ok(HashedPassword(encoded))
    }

    pub fn verify_hash(&self, password: &str, hash: &HashedPassword) -> bool {
        // an unparseable stored hash is a mismatch, not a panic
        argon2::verify_encoded(&hash.0, password.as_bytes()).unwrap_or(false)
    }

    /// Confirm that `password` matches the stored credential for `username`.
    /// An unknown username and a wrong password produce the same error.
    pub async fn authenticate(
        &self,
        username: &Username,
        password: &str,
    ) -> Result<UserRecord, AuthError> {
        let record = self
            .config
            .user_store
            .lookup(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify_hash(password, &record.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        // Checked after the password so the failure cannot be used to probe
        // which accounts exist and are disabled.
        if record.disabled {
            return Err(AuthError::AccountDisabled);
        }

        Ok(record)
    }

    pub fn issue_token(&self, subject: &Username) -> Result<String, AuthError> {
        self.issue_token_with_lifetime(subject, self.config.token_lifetime)
    }

    pub fn issue_token_with_lifetime(
        &self,
        subject: &Username,
        lifetime: Duration,
    ) -> Result<String, AuthError> {
        let iat = unix_now();

        let claims = Claims {
            sub: subject.0.clone(),
            iss: self.config.token_issuer.clone(),
            iat,
            exp: iat + lifetime.as_secs(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.token_secret.as_ref()),
        )
        .map_err(|_| AuthError::Configuration("token signing failed"))?;

        tracing::debug!(subject = %claims.sub, jti = %claims.jti, "issued access token");

        Ok(token)
    }

    /// Check signature, then expiry, then subject. Each call is a pure
    /// function of the token string, the clock, and the configured secret.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.token_issuer]);
        // The library's own expiry check allows 60 seconds of leeway; the
        // exact `now >= exp` boundary is enforced below instead.
        validation.validate_exp = false;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.token_secret.as_ref()),
            &validation,
        )
        .map_err(|e| AuthError::BadSignature { source: Some(e) })?;

        let claims = decoded.claims;

        if unix_now() >= claims.exp {
            return Err(AuthError::Expired);
        }

        if claims.sub.is_empty() {
            return Err(AuthError::MissingSubject);
        }

        Ok(claims)
    }

    /// Re-resolve a validated token subject against the user store, so that
    /// accounts deleted or disabled after issuance are locked out before the
    /// token expires.
    pub async fn resolve_subject(&self, subject: &str) -> Result<UserRecord, AuthError> {
        let record = self
            .config
            .user_store
            .lookup(&Username(subject.to_owned()))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if record.disabled {
            return Err(AuthError::AccountDisabled);
        }

        Ok(record)
    }
}

#[derive(Clone)]
pub struct Auth {
    pub(crate) internal: Arc<AuthInternal>,
}

impl Auth {
    /// Build the auth core from its configuration. An unusable secret or
    /// salt is rejected here, at startup, so the per-request paths never
    /// encounter one.
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        if config.token_secret.is_empty() {
            return Err(AuthError::Configuration("token secret must not be empty"));
        }

        if config.password_salt.len() < MIN_SALT_LENGTH {
            return Err(AuthError::Configuration(
                "password salt must be at least 8 bytes",
            ));
        }

        Ok(Self {
            internal: Arc::new(AuthInternal { config }),
        })
    }

    /// Hash a plaintext password for storage in a [`UserStore`].
    pub fn hash_password(&self, password: &str) -> Result<HashedPassword, AuthError> {
        self.internal.hash(password)
    }

    pub async fn authenticate(
        &self,
        username: &Username,
        password: &str,
    ) -> Result<UserRecord, AuthError> {
        self.internal.authenticate(username, password).await
    }

    /// Verify credentials and issue a token for the matching user in one
    /// step. This is what the login route does.
    pub async fn login(&self, username: &Username, password: &str) -> Result<String, AuthError> {
        let record = self.internal.authenticate(username, password).await?;
        self.internal.issue_token(&record.username)
    }

    pub fn issue_token(&self, subject: &Username) -> Result<String, AuthError> {
        self.internal.issue_token(subject)
    }

    pub fn issue_token_with_lifetime(
        &self,
        subject: &Username,
        lifetime: Duration,
    ) -> Result<String, AuthError> {
        self.internal.issue_token_with_lifetime(subject, lifetime)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.internal.validate_token(token)
    }

    /// Validate a token and re-resolve its subject against the user store.
    pub async fn current_user(&self, token: &str) -> Result<UserRecord, AuthError> {
        let claims = self.internal.validate_token(token)?;
        self.internal.resolve_subject(&claims.sub).await
    }
}
